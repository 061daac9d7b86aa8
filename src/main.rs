use std::env;
use std::path::PathBuf;
use std::process;

use metro_population::config::{self, Config};
use metro_population::dev_mode::{ArchivingSource, FixtureSource};
use metro_population::ingest::wiki::HttpSource;
use metro_population::ingest::PageSource;
use metro_population::logging::{self, Stage};
use metro_population::metros::metro_names;
use metro_population::model::PipelineError;
use metro_population::{pipeline, report};

const USAGE: &str = "\
Usage: metro_population [run|update] [--config <path>] [--offline <dir>] [--save-pages <dir>]

Commands:
  run      Scrape every configured metro and write the full table (default)
  update   Merge configured estimates after the cutoff year into the table

Options:
  --config <path>      Configuration file (default: $METRO_POP_CONFIG or metros.toml)
  --offline <dir>      Read saved <metro>.html pages from <dir> instead of fetching
  --save-pages <dir>   Save every fetched page to <dir> for later --offline runs";

#[derive(Debug, PartialEq)]
enum Command {
    Run,
    Update,
    Help,
}

#[derive(Debug, PartialEq)]
struct Args {
    command: Command,
    config: Option<PathBuf>,
    offline: Option<PathBuf>,
    save_pages: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args {
        command: Command::Run,
        config: None,
        offline: None,
        save_pages: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "run" => parsed.command = Command::Run,
            "update" => parsed.command = Command::Update,
            "-h" | "--help" | "help" => parsed.command = Command::Help,
            "--config" => {
                let path = iter.next().ok_or("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--offline" => {
                let dir = iter.next().ok_or("--offline needs a directory")?;
                parsed.offline = Some(PathBuf::from(dir));
            }
            "--save-pages" => {
                let dir = iter.next().ok_or("--save-pages needs a directory")?;
                parsed.save_pages = Some(PathBuf::from(dir));
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    if parsed.save_pages.is_some() && parsed.command == Command::Update {
        return Err("--save-pages only applies to run".to_string());
    }

    Ok(parsed)
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            process::exit(2);
        }
    };

    if args.command == Command::Help {
        println!("{}", USAGE);
        return;
    }

    if let Err(e) = run(args) {
        logging::error(Stage::System, None, &e.to_string());
        eprintln!("\n✗ {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), PipelineError> {
    let config_path = args.config.unwrap_or_else(config::config_path);
    let config = Config::load_or_bundled(&config_path)?;

    let settings = &config.pipeline;
    logging::init_logger(
        settings.log_level,
        settings.log_file.as_deref(),
        settings.console_timestamps,
    );

    println!("{}", "=".repeat(60));
    println!("Metro Population Scraper");
    println!("{}", "=".repeat(60));
    if config_path.exists() {
        logging::info(Stage::System, None, &format!("Using {}", config_path.display()));
    } else {
        logging::info(
            Stage::System,
            None,
            &format!("{} not found, using bundled metro list", config_path.display()),
        );
    }

    logging::info(
        Stage::System,
        None,
        &format!("Metros: {}", metro_names(&config.metros).join(", ")),
    );

    let (run_report, rows) = match args.command {
        Command::Update => pipeline::update(&config)?,
        _ => {
            let source: Box<dyn PageSource> = match args.offline {
                Some(dir) => {
                    logging::info(
                        Stage::System,
                        None,
                        &format!("Offline mode: reading pages from {}", dir.display()),
                    );
                    Box::new(FixtureSource::new(dir))
                }
                None => Box::new(
                    HttpSource::new(&settings.user_agent, config.timeout())
                        .map_err(|e| PipelineError::Config(e.to_string()))?,
                ),
            };
            match args.save_pages {
                Some(dir) => {
                    let archive = FixtureSource::new(dir);
                    logging::info(
                        Stage::System,
                        None,
                        &format!("Saving fetched pages to {}", archive.dir().display()),
                    );
                    let archiving = ArchivingSource::new(source.as_ref(), archive);
                    pipeline::run(&config, &archiving)?
                }
                None => pipeline::run(&config, source.as_ref())?,
            }
        }
    };

    report::print_summary(&run_report, &rows);
    Ok(())
}
