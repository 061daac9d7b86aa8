/// Metro registry for the population scraper.
///
/// Defines the list of metropolitan areas to scrape and the page each one
/// is read from. The list is configuration data loaded from `[[metro]]`
/// entries (see `config`), not constants; all other modules should reference
/// metros through a `MetroSource` rather than hardcoding names or URLs.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Metro metadata
// ---------------------------------------------------------------------------

/// A metro identifier paired with the page its census table lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetroSource {
    /// Display name, written verbatim into the `Metro` column.
    pub name: String,
    /// Page URL holding a `us-census-pop` table.
    pub url: String,
}

impl MetroSource {
    pub fn new(name: &str, url: &str) -> Self {
        MetroSource {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    /// File-system friendly identifier, e.g. "Washington DC" -> "washington_dc".
    ///
    /// Used to name offline fixture pages.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        for c in self.name.trim().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.ends_with('_') {
                slug.push('_');
            }
        }
        slug.trim_matches('_').to_string()
    }
}

/// Returns the names of all configured metros, in configuration order.
pub fn metro_names(metros: &[MetroSource]) -> Vec<&str> {
    metros.iter().map(|m| m.name.as_str()).collect()
}

/// Looks up a metro by name. Returns `None` if not found.
pub fn find_metro<'a>(metros: &'a [MetroSource], name: &str) -> Option<&'a MetroSource> {
    metros.iter().find(|m| m.name == name)
}

/// Checks a metro list for problems that would make a run ambiguous.
///
/// Returns one message per problem; an empty vector means the list is usable.
pub fn validate_metros(metros: &[MetroSource]) -> Vec<String> {
    let mut problems = Vec::new();

    if metros.is_empty() {
        problems.push("no [[metro]] entries configured".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    let mut slugs: std::collections::HashMap<String, &str> = std::collections::HashMap::new();
    for metro in metros {
        if metro.name.trim().is_empty() {
            problems.push(format!("metro with url '{}' has an empty name", metro.url));
            continue;
        }
        if !seen.insert(metro.name.as_str()) {
            problems.push(format!("duplicate metro name '{}'", metro.name));
        } else {
            // Saved pages are keyed by slug, so two metros must not share one.
            let slug = metro.slug();
            if slug.is_empty() {
                problems.push(format!(
                    "metro '{}' has no ASCII letters or digits to name its page file",
                    metro.name
                ));
            } else if let Some(other) = slugs.get(&slug) {
                problems.push(format!(
                    "metros '{}' and '{}' share page file name '{}.html'",
                    other, metro.name, slug
                ));
            } else {
                slugs.insert(slug, metro.name.as_str());
            }
        }
        if !(metro.url.starts_with("https://") || metro.url.starts_with("http://")) {
            problems.push(format!(
                "metro '{}' has a non-http url '{}'",
                metro.name, metro.url
            ));
        }
    }

    problems
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
