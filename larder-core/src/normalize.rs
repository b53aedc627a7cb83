//! Turns free text and loosely-typed JSON values into clean ordered lists.
//!
//! Every function here is total: unusable input yields an empty list, and no
//! returned list ever contains an empty or whitespace-only entry.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;

/// Leading bullet ("-", "•", "*") or list number ("1.", "2)") on a line.
static LIST_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-•*·–]\s*|\d{1,3}[.)](?:\s+|$))").expect("Invalid list marker regex")
});

/// Separators inside a single-string ingredient block.
static INGREDIENT_SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]+|\s*;\s*").expect("Invalid ingredient separator regex"));

/// A step number in the middle of a line, e.g. "Mix well 2. Bake".
static INLINE_STEP_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s+)\d{1,3}[.)](?:\s+|$)").expect("Invalid inline step number regex")
});

/// Split on line breaks, trim each line, drop empty lines.
pub fn normalize_lines(raw: &str) -> Vec<String> {
    raw.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove one leading bullet or list number, then trim.
pub fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    match LIST_MARKER_REGEX.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line,
    }
}

/// Trim every entry and drop the blank ones, keeping order.
pub fn clean_entries<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize an ingredient field that may be a list or a single blob.
///
/// Lists are trimmed element-wise; a single string is split on newlines and
/// semicolons and has bullets/numbering stripped from each piece.
pub fn split_ingredient_block(raw: &JsonValue) -> Vec<String> {
    match raw {
        JsonValue::Array(items) => clean_entries(items.iter().filter_map(scalar_text)),
        JsonValue::String(s) => split_ingredient_text(s),
        _ => Vec::new(),
    }
}

/// Split a plain-text ingredient blob.
pub fn split_ingredient_text(raw: &str) -> Vec<String> {
    INGREDIENT_SEPARATOR_REGEX
        .split(raw)
        .map(strip_list_marker)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize an instruction field that may be a list of strings, a list of
/// step objects (`text` or `name`), a single step or section object, or a
/// single blob.
pub fn split_step_block(raw: &JsonValue) -> Vec<String> {
    match raw {
        JsonValue::Array(items) => clean_entries(items.iter().filter_map(step_text)),
        JsonValue::String(s) => split_step_text(s),
        JsonValue::Object(obj) => match obj.get("itemListElement") {
            Some(JsonValue::Array(items)) => clean_entries(items.iter().filter_map(step_text)),
            _ => step_text(raw)
                .map(|text| split_step_text(&text))
                .unwrap_or_default(),
        },
        _ => Vec::new(),
    }
}

/// Split a plain-text instruction blob on newlines, step numbers and bullets.
pub fn split_step_text(raw: &str) -> Vec<String> {
    raw.split(['\n', '\r'])
        .flat_map(|line| INLINE_STEP_NUMBER_REGEX.split(line))
        .map(strip_list_marker)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text of a single instruction element: a string, or an object's `text`
/// (falling back to `name` when `text` is missing or blank).
pub fn step_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Object(obj) => ["text", "name"]
            .iter()
            .filter_map(|field| obj.get(*field).and_then(JsonValue::as_str))
            .find(|s| !s.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn json_item() -> impl Strategy<Value = JsonValue> {
        prop_oneof![
            any::<String>().prop_map(JsonValue::String),
            "[ \t\n;•*1.)-]{0,8}".prop_map(JsonValue::String),
            any::<String>().prop_map(|text| json!({"@type": "HowToStep", "text": text})),
            (any::<String>(), any::<String>()).prop_map(|(text, name)| json!({"text": text, "name": name})),
            any::<i64>().prop_map(|n| json!(n)),
            Just(JsonValue::Null),
        ]
    }

    proptest! {
        #[test]
        fn splitters_never_yield_blank_entries_for_text(raw in any::<String>()) {
            let value = JsonValue::String(raw);
            for entry in split_ingredient_block(&value).iter().chain(split_step_block(&value).iter()) {
                prop_assert!(!entry.trim().is_empty());
            }
        }

        #[test]
        fn splitters_never_yield_blank_entries_for_marker_heavy_text(raw in "[ \t\r\n;•*·–0-9.)a-z-]{0,40}") {
            let value = JsonValue::String(raw);
            for entry in split_ingredient_block(&value).iter().chain(split_step_block(&value).iter()) {
                prop_assert!(!entry.trim().is_empty());
            }
        }

        #[test]
        fn splitters_never_yield_blank_entries_for_arrays(items in prop::collection::vec(json_item(), 0..10)) {
            let value = JsonValue::Array(items);
            for entry in split_ingredient_block(&value).iter().chain(split_step_block(&value).iter()) {
                prop_assert!(!entry.trim().is_empty());
            }
        }

        #[test]
        fn step_splitter_never_yields_blank_entries_for_sections(items in prop::collection::vec(json_item(), 0..10)) {
            let value = json!({"@type": "HowToSection", "itemListElement": items});
            for entry in split_step_block(&value) {
                prop_assert!(!entry.trim().is_empty());
            }
        }
    }

    fn assert_no_blank(entries: &[String]) {
        for entry in entries {
            assert!(!entry.trim().is_empty(), "blank entry in {:?}", entries);
        }
    }

    #[test]
    fn normalize_lines_trims_and_drops_empty() {
        assert_eq!(
            normalize_lines("  a \r\n\r\n b\n\n\t\nc  "),
            vec!["a", "b", "c"]
        );
        assert!(normalize_lines("").is_empty());
    }

    #[test]
    fn ingredient_array_is_trimmed() {
        let raw = json!(["  2 eggs ", "", "   ", "1 cup flour", 3, null, {"a": 1}]);
        assert_eq!(
            split_ingredient_block(&raw),
            vec!["2 eggs", "1 cup flour", "3"]
        );
    }

    #[test]
    fn ingredient_string_splits_on_newline_and_semicolon() {
        let raw = json!("- 2 eggs\n• 1 cup flour; 1 tsp salt ;\n\n3) butter");
        assert_eq!(
            split_ingredient_block(&raw),
            vec!["2 eggs", "1 cup flour", "1 tsp salt", "butter"]
        );
    }

    #[test]
    fn ingredient_quantities_are_not_mistaken_for_numbering() {
        let raw = json!("1.5 cups milk\n1/2 tsp salt\n2 eggs");
        assert_eq!(
            split_ingredient_block(&raw),
            vec!["1.5 cups milk", "1/2 tsp salt", "2 eggs"]
        );
    }

    #[test]
    fn unusable_input_yields_empty() {
        assert!(split_ingredient_block(&json!(null)).is_empty());
        assert!(split_ingredient_block(&json!(42)).is_empty());
        assert!(split_step_block(&json!({"@type": "HowToStep"})).is_empty());
        assert!(split_step_block(&json!(true)).is_empty());
        assert!(split_step_block(&json!(" \n ; \n")).is_empty());
    }

    #[test]
    fn step_objects_use_text_then_name() {
        let raw = json!([
            {"@type": "HowToStep", "text": " Mix. "},
            {"@type": "HowToStep", "name": "Rest"},
            {"@type": "HowToStep", "text": "", "name": "Bake."},
            {"@type": "HowToStep"},
            "  Serve  ",
            7
        ]);
        assert_eq!(split_step_block(&raw), vec!["Mix.", "Rest", "Bake.", "Serve"]);
    }

    #[test]
    fn single_step_object_is_kept() {
        let raw = json!({"@type": "HowToStep", "text": "Bake for 1 hour."});
        assert_eq!(split_step_block(&raw), vec!["Bake for 1 hour."]);
    }

    #[test]
    fn single_section_object_uses_its_items() {
        let raw = json!({
            "@type": "HowToSection",
            "name": "Cake",
            "itemListElement": [
                {"@type": "HowToStep", "text": "Whisk."},
                {"@type": "HowToStep", "text": " "},
                "Fold."
            ]
        });
        assert_eq!(split_step_block(&raw), vec!["Whisk.", "Fold."]);
    }

    #[test]
    fn step_string_splits_on_numbers_and_bullets() {
        let raw = json!("1. Preheat the oven. 2. Mix everything\n- Bake for 20 minutes\n3) Cool");
        assert_eq!(
            split_step_block(&raw),
            vec![
                "Preheat the oven.",
                "Mix everything",
                "Bake for 20 minutes",
                "Cool"
            ]
        );
    }

    #[test]
    fn strip_list_marker_variants() {
        assert_eq!(strip_list_marker("- Carrot"), "Carrot");
        assert_eq!(strip_list_marker("•Onion"), "Onion");
        assert_eq!(strip_list_marker("1. Chop"), "Chop");
        assert_eq!(strip_list_marker("12) Simmer"), "Simmer");
        assert_eq!(strip_list_marker("2 eggs"), "2 eggs");
        assert_eq!(strip_list_marker("-"), "");
    }

    #[test]
    fn no_blank_entries_for_awkward_inputs() {
        let inputs = [
            json!("\n\n;;; - \n•\n1.\n 2) "),
            json!(["", " ", "\t\n"]),
            json!([{"text": "  "}, {"name": "\n"}, ""]),
            json!("1.\n2.\n3."),
            json!(";a;;b;"),
        ];
        for raw in &inputs {
            assert_no_blank(&split_ingredient_block(raw));
            assert_no_blank(&split_step_block(raw));
        }
    }
}
