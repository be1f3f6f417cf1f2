//! Answer text normalization for display

use once_cell::sync::Lazy;
use regex::Regex;

/// Existing list markers: glyph bullets, or a lone `o` / `1.` / `2)` followed by space
static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-•●*]+|o\s|\d+[.)](?:\s|$))\s*").expect("Invalid regex"));

/// Words that mark a sentence as a list of benefits
const LIST_KEYWORDS: [&str; 6] = ["includes", "benefits", "covers", "provides", "offers", "services"];

fn bullet(text: &str) -> String {
    format!("- {}", text)
}

fn semicolon_items(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(bullet)
}

/// Normalize answer text into bullets and paragraphs
///
/// - Single-line text with semicolons becomes a tight list.
/// - Otherwise each line is handled on its own: existing markers are replaced
///   with `- `, benefit sentences become bullets, semicolon lines are split
///   into bullets, and everything else is kept as is.
/// - Lines are separated by a blank line.
pub fn format_response(text: &str) -> String {
    let text = text.trim();

    if text.contains(';') && !text.contains('\n') {
        return semicolon_items(text).collect::<Vec<_>>().join("\n");
    }

    let mut output = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(marker) = LIST_MARKER.find(line) {
            let item = line[marker.end()..].trim();
            if !item.is_empty() {
                output.push(bullet(item));
            }
            continue;
        }

        let lower = line.to_lowercase();
        if LIST_KEYWORDS.iter().any(|k| lower.contains(k)) {
            output.push(bullet(line));
        } else if line.contains(';') {
            output.extend(semicolon_items(line));
        } else {
            output.push(line.to_string());
        }
    }

    output.join("\n\n")
}
