//! Heading-based recipe extraction from plain readable text.
//!
//! The scan is deliberately literal: the first "Ingredients" heading starts
//! the ingredient list, which runs until an "Instructions"/"Directions"
//! heading; the first such heading starts the step list, which runs until a
//! "Notes" heading. Documents with repeated or interleaved headings are not
//! second-guessed.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::{normalize_lines, strip_list_marker};
use crate::types::Recipe;

static INGREDIENTS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ingredients?\b").expect("Invalid ingredients heading regex"));

static INSTRUCTIONS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:instructions?|directions?)\b").expect("Invalid instructions heading regex")
});

static NOTES_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^notes?\b").expect("Invalid notes heading regex"));

/// Extract a recipe from raw text. Never fails: missing headings just
/// produce empty lists, and an empty document gets the default title.
pub fn extract_from_text(text: &str, source_url: &str) -> Recipe {
    let lines = normalize_lines(text);
    let title = lines.first().map(String::as_str);

    let ingredients = match lines.iter().position(|l| INGREDIENTS_HEADING.is_match(l)) {
        Some(start) => lines[start + 1..]
            .iter()
            .take_while(|l| !INSTRUCTIONS_HEADING.is_match(l))
            .filter(|l| l.chars().count() > 1)
            .map(|l| strip_list_marker(l).to_string())
            .collect(),
        None => Vec::new(),
    };

    let instructions = match lines.iter().position(|l| INSTRUCTIONS_HEADING.is_match(l)) {
        Some(start) => lines[start + 1..]
            .iter()
            .take_while(|l| !NOTES_HEADING.is_match(l))
            .map(|l| strip_list_marker(l).to_string())
            .collect(),
        None => Vec::new(),
    };

    tracing::debug!(
        ingredients = ingredients.len(),
        instructions = instructions.len(),
        "heuristic text extraction"
    );

    Recipe::new(source_url, title, ingredients, instructions)
}
