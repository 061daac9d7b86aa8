//! Tolerant HTML table scanning.
//!
//! Locates one `<table>` by class and returns the text of its cells, row by
//! row. This is deliberately not a full HTML parser: tags are matched
//! case-insensitively, unclosed `<tr>`/`<td>`/`<th>` elements end at the next
//! sibling, and anything unexpected degrades to fewer rows rather than an
//! error.
//!
//! Cell text has `<sup>` footnote markers and `<style>` blocks removed,
//! entities decoded, and whitespace collapsed, so `"5,286,728<sup>[3]</sup>"`
//! reads as `"5,286,728"`.

use crate::model::RawTable;

/// Rows with fewer cells than this are captions, footers or spacers.
const MIN_CELLS_PER_ROW: usize = 2;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Finds the first table carrying `class` and returns its rows.
///
/// Returns `None` when no such table exists. A table that is found but has
/// no usable rows comes back as an empty `RawTable`.
pub fn find_table(html: &str, class: &str) -> Option<RawTable> {
    find_table_block(html, class).map(|block| RawTable::new(table_rows(block)))
}

// ---------------------------------------------------------------------------
// Tag scanning
// ---------------------------------------------------------------------------

/// Position of the next `<name` opening tag at or after `from`.
///
/// `lower` must be the ASCII-lowercased document so offsets line up with
/// the original text.
fn find_tag(lower: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("<{}", name);
    let mut pos = from;
    while let Some(offset) = lower.get(pos..)?.find(&needle) {
        let start = pos + offset;
        let after = start + needle.len();
        match lower.as_bytes().get(after) {
            None => return None,
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(start),
            // `<th` inside `<thead`, `<tr` inside `<track`, ...
            Some(_) => pos = after,
        }
    }
    None
}

fn find_close(lower: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{}", name);
    lower.get(from..)?.find(&needle).map(|offset| from + offset)
}

/// Offset just past the `>` closing the tag that starts at `start`.
fn tag_end(lower: &str, start: usize) -> Option<usize> {
    lower.get(start..)?.find('>').map(|offset| start + offset + 1)
}

/// Offset of the `</name` matching an element whose content starts at
/// `from`, accounting for nested elements of the same name.
fn find_matching_close(lower: &str, from: usize, name: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = from;
    loop {
        let close = find_close(lower, pos, name)?;
        match find_tag(lower, pos, name) {
            Some(open) if open < close => {
                depth += 1;
                pos = open + 1;
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(close);
                }
                pos = close + 1;
            }
        }
    }
}

/// Smallest of the candidate offsets, or `fallback` if none matched.
fn earliest(candidates: &[Option<usize>], fallback: usize) -> usize {
    candidates.iter().flatten().copied().min().unwrap_or(fallback)
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Value of the `class` attribute in an opening tag, if any.
fn class_attribute(tag: &str) -> Option<&str> {
    let bytes = tag.as_bytes();
    let mut search = 0;
    while let Some(offset) = tag.get(search..)?.find("class") {
        let start = search + offset;
        search = start + "class".len();

        let preceded_by_space = start > 0 && bytes[start - 1].is_ascii_whitespace();
        if !preceded_by_space {
            continue;
        }

        let rest = tag[search..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();

        return match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let inner = &rest[1..];
                inner.find(quote).map(|end| &inner[..end])
            }
            Some(_) => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                Some(&rest[..end])
            }
            None => None,
        };
    }
    None
}

fn has_class(tag: &str, class: &str) -> bool {
    class_attribute(tag)
        .map(|value| value.split_ascii_whitespace().any(|token| token == class))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Table structure
// ---------------------------------------------------------------------------

fn find_table_block<'a>(html: &'a str, class: &str) -> Option<&'a str> {
    let lower = html.to_ascii_lowercase();
    let class = class.to_ascii_lowercase();

    let mut search = 0;
    while let Some(start) = find_tag(&lower, search, "table") {
        let open_end = tag_end(&lower, start)?;
        if has_class(&lower[start..open_end], &class) {
            // An unterminated table runs to the end of the document.
            let close = find_matching_close(&lower, open_end, "table").unwrap_or(lower.len());
            return Some(&html[open_end..close]);
        }
        search = open_end;
    }
    None
}

fn table_rows(table_html: &str) -> Vec<Vec<String>> {
    let lower = table_html.to_ascii_lowercase();
    let mut rows = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_tag(&lower, pos, "tr") {
        let Some(open_end) = tag_end(&lower, start) else {
            break;
        };
        let end = earliest(
            &[find_close(&lower, open_end, "tr"), find_tag(&lower, open_end, "tr")],
            lower.len(),
        );

        let cells = row_cells(&table_html[open_end..end], &lower[open_end..end]);
        if cells.len() >= MIN_CELLS_PER_ROW {
            rows.push(cells);
        }
        pos = end;
    }

    rows
}

fn row_cells(row_html: &str, row_lower: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut pos = 0;

    loop {
        let next_cell = [find_tag(row_lower, pos, "td"), find_tag(row_lower, pos, "th")];
        let Some(start) = next_cell.iter().flatten().copied().min() else {
            break;
        };
        let Some(open_end) = tag_end(row_lower, start) else {
            break;
        };
        let end = earliest(
            &[
                find_close(row_lower, open_end, "td"),
                find_close(row_lower, open_end, "th"),
                find_tag(row_lower, open_end, "td"),
                find_tag(row_lower, open_end, "th"),
            ],
            row_lower.len(),
        );

        cells.push(cell_text(&row_html[open_end..end]));
        pos = end;
    }

    cells
}

// ---------------------------------------------------------------------------
// Cell text
// ---------------------------------------------------------------------------

fn cell_text(html: &str) -> String {
    let without_refs = remove_elements(html, "sup");
    let without_styles = remove_elements(&without_refs, "style");
    let stripped = strip_tags(&without_styles);
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drops every `<name>…</name>` element, content included.
fn remove_elements(html: &str, name: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(start) = find_tag(&lower, pos, name) {
        out.push_str(&html[pos..start]);
        pos = find_close(&lower, start, name)
            .and_then(|close| tag_end(&lower, close))
            .unwrap_or(lower.len());
    }
    out.push_str(&html[pos..]);
    out
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                // Adjacent inline elements are separated by a tag, not a space.
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Longest entity name we try to decode, e.g. `#x1F600`.
const MAX_ENTITY_LEN: usize = 10;

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= MAX_ENTITY_LEN)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "minus" => Some('−'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CENSUS_PAGE: &str = r##"
        <html><body>
        <table class="wikitable"><tr><th>Rank</th><th>City</th></tr>
          <tr><td>1</td><td>Atlanta</td></tr></table>
        <TABLE class="us-census-pop us-census-pop-right">
          <caption>Historical population</caption>
          <tbody>
          <tr><th scope="col">Census</th><th scope="col">Pop.</th><th>Note</th><th>%±</th></tr>
          <tr><th>1990</th><td>3,069,411</td><td></td><td>—</td></tr>
          <tr><th>2000</th><td>4,263,438<sup class="reference"><a href="#cite-1">[1]</a></sup></td>
              <td></td><td>38.9%</td></tr>
          <tr><th>2024 <small>(est.)</small></th><td>6,409,047&nbsp;</td><td></td><td>4.9%</td></tr>
          <tr><td colspan="4">U.S. Decennial Census</td></tr>
          </tbody>
        </TABLE>
        </body></html>
    "##;

    #[test]
    fn test_find_table_selects_by_class() {
        let table = find_table(CENSUS_PAGE, "us-census-pop").expect("census table should be found");
        assert_eq!(table.rows.len(), 4, "rows: {:?}", table.rows);
        assert_eq!(table.rows[0], vec!["Census", "Pop.", "Note", "%±"]);
    }

    #[test]
    fn test_cell_text_drops_footnotes_and_decodes_entities() {
        let table = find_table(CENSUS_PAGE, "us-census-pop").expect("census table should be found");
        assert_eq!(table.rows[2][1], "4,263,438");
        assert_eq!(table.rows[3][0], "2024 (est.)");
        assert_eq!(table.rows[3][1], "6,409,047");
        assert_eq!(table.rows[1][3], "—");
    }

    #[test]
    fn test_footnote_anchor_is_not_part_of_count() {
        let html = r##"<table class="us-census-pop">
            <tr><th>Census</th><th>Pop.</th></tr>
            <tr><td>2010</td><td>5,286,728<sup><a href="#cite_note-2">[2]</a></sup></td></tr>
            </table>"##;
        let table = find_table(html, "us-census-pop").expect("table should be found");
        assert_eq!(table.rows[1], vec!["2010".to_string(), "5,286,728".to_string()]);
    }

    #[test]
    fn test_class_must_match_a_whole_token() {
        assert!(find_table(CENSUS_PAGE, "us-census").is_none());
        assert!(find_table(CENSUS_PAGE, "US-CENSUS-POP").is_some());
    }

    #[test]
    fn test_missing_table_is_none() {
        assert!(find_table("<html><p>No tables here</p></html>", "us-census-pop").is_none());
    }

    #[test]
    fn test_unclosed_cells_and_rows_end_at_next_sibling() {
        let html = "<table class='us-census-pop'>\
                    <tr><th>Census<th>Pop.\
                    <tr><td>2010<td>5,564,635\
                    </table>";
        let table = find_table(html, "us-census-pop").expect("table should be found");
        assert_eq!(
            table.rows,
            vec![
                vec!["Census".to_string(), "Pop.".to_string()],
                vec!["2010".to_string(), "5,564,635".to_string()],
            ]
        );
    }

    #[test]
    fn test_nested_table_does_not_end_outer_block() {
        let html = r#"<table class=us-census-pop>
            <tr><th>Census</th><th>Pop.</th></tr>
            <tr><td>1980</td><td><table><tr><td>x</td></tr></table>1,234</td></tr>
            <tr><td>1990</td><td>2,345</td></tr>
            </table>"#;
        let block = find_table_block(html, "us-census-pop").expect("table should be found");
        assert!(block.trim_end().ends_with("</tr>"));
        assert!(block.contains("2,345"));
    }

    #[test]
    fn test_table_without_rows_is_empty() {
        let table = find_table(r#"<table class="us-census-pop"></table>"#, "us-census-pop")
            .expect("table should be found");
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_class_attribute_forms() {
        assert_eq!(class_attribute(r#"<table class="a b">"#), Some("a b"));
        assert_eq!(class_attribute("<table class = 'a'>"), Some("a"));
        assert_eq!(class_attribute("<table class=a>"), Some("a"));
        assert_eq!(class_attribute(r#"<table data-class="a">"#), None);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a&amp;b"), "a&b");
        assert_eq!(decode_entities("&#8212;"), "—");
        assert_eq!(decode_entities("&#x2014;"), "—");
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_tag_prefix_is_not_a_match() {
        let lower = "<thead><th>x</th>";
        assert_eq!(find_tag(lower, 0, "th"), Some(7));
    }
}
