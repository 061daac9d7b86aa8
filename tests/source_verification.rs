//! Source Page Verification Integration Tests
//!
//! These tests hit the live encyclopedia pages for every bundled metro and
//! report which ones still carry a usable census table. Run them before
//! adding a metro or after a scrape starts skipping pages.
//!
//! Run with: cargo test --test source_verification -- --ignored --nocapture

use metro_population::config::Config;
use metro_population::extract::Extraction;
use metro_population::ingest::scrape_metro;
use metro_population::ingest::wiki::HttpSource;
use metro_population::pipeline;

fn live_source(config: &Config) -> HttpSource {
    HttpSource::new(&config.pipeline.user_agent, std::time::Duration::from_secs(30))
        .expect("HTTP client should build")
}

#[test]
#[ignore]
fn test_bundled_metro_pages() {
    let config = Config::bundled().expect("bundled config should parse");
    let source = live_source(&config);
    let schema = config.schema();

    println!("\n🔍 Testing metro pages:");
    println!("═══════════════════════════════════════════════════════════");

    let mut working = 0;
    let mut failed = 0;

    for metro in &config.metros {
        let extraction = scrape_metro(&source, metro, &config.pipeline.table_class, &schema);

        println!("\n{}", metro.name);
        println!("  URL: {}", metro.url);
        match &extraction {
            Extraction::Rows(rows) => {
                let first = rows.iter().map(|r| r.year).min();
                let last = rows.iter().map(|r| r.year).max();
                println!("  Status: Scraped");
                println!("  Census points: {}", rows.len());
                if let (Some(first), Some(last)) = (first, last) {
                    println!("  Years: {} - {}", first, last);
                }
                working += 1;
            }
            Extraction::Empty(reason) => {
                println!("  Status: Skipped");
                println!("  Reason: {}", reason);
                failed += 1;
            }
        }

        std::thread::sleep(config.request_delay());
    }

    println!("\n═══════════════════════════════════════════════════════════");
    println!("Summary: {}/{} working, {} failed", working, config.metros.len(), failed);
    println!("═══════════════════════════════════════════════════════════\n");

    assert!(working > 0, "No metro pages are usable!");
}

#[test]
#[ignore]
fn test_full_live_run() {
    let mut config = Config::bundled().expect("bundled config should parse");
    let output = std::env::temp_dir().join(format!(
        "metro_population_live_{}.csv",
        std::process::id()
    ));
    config.pipeline.output_file = output.display().to_string();

    let source = live_source(&config);
    let (report, rows) = pipeline::run(&config, &source).expect("live run should succeed");
    let _ = std::fs::remove_file(&output);

    metro_population::report::print_summary(&report, &rows);

    assert!(report.summary.metros_scraped > 0);
    assert!(rows.iter().all(|r| r.year >= 1980));
}
