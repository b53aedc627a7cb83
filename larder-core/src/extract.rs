use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value as JsonValue};

use crate::error::ExtractError;
use crate::normalize::{clean_entries, split_ingredient_block, split_step_block, step_text};
use crate::text::extract_from_text;
use crate::types::{Extraction, ExtractionMethod, Recipe};

/// Fields searched for a nested Recipe node, in this order.
const CONTAINER_FIELDS: [&str; 6] = [
    "@graph",
    "mainEntity",
    "itemListElement",
    "partOf",
    "articleBody",
    "recipe",
];

/// Generic list items kept from the microdata instruction fallback.
const MAX_FALLBACK_STEPS: usize = 30;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Invalid selector")
}

static SCRIPT: LazyLock<Selector> = LazyLock::new(|| selector("script"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static INSTRUCTION_ITEMS: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"[itemprop="recipeInstructions"] li, .instructions li, ol li"#)
});
static MICRODATA_SCOPE: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"[itemtype*="schema.org/Recipe"], [itemscope][itemtype*="Recipe"]"#)
});
static MICRODATA_NAME: LazyLock<Selector> = LazyLock::new(|| selector(r#"[itemprop="name"]"#));
static MICRODATA_INGREDIENTS: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"[itemprop="recipeIngredient"], [itemprop="ingredients"]"#)
});
static MICRODATA_STEPS: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[itemprop="recipeInstructions"] li"#));
static GENERIC_STEPS: LazyLock<Selector> = LazyLock::new(|| selector(".instructions li, ol li"));

/// Extract a recipe from an HTML page.
///
/// Tries JSON-LD, then schema.org microdata, then a heading scan over the
/// page's visible text. Malformed structured-data blocks are skipped. This
/// never fails; the caller decides whether the result has enough content.
pub fn extract_recipe(html: &str, source_url: &str) -> Extraction {
    let document = Html::parse_document(html);

    if let Some(extraction) = extract_structured(&document, source_url) {
        return extraction;
    }

    tracing::debug!(url = source_url, "no structured data, scanning page text");
    Extraction {
        recipe: extract_from_text(&visible_text(&document), source_url),
        method: ExtractionMethod::PageText,
    }
}

/// Structured-data tiers only: JSON-LD then microdata.
pub fn extract_structured(document: &Html, source_url: &str) -> Option<Extraction> {
    let jsonld_result = extract_recipe_from_jsonld(document, source_url);
    if let Ok(recipe) = jsonld_result {
        return Some(Extraction {
            recipe,
            method: ExtractionMethod::JsonLd,
        });
    }

    match extract_recipe_from_microdata(document, source_url) {
        Ok(recipe) => Some(Extraction {
            recipe,
            method: ExtractionMethod::Microdata,
        }),
        Err(e) => {
            tracing::debug!(url = source_url, error = %e, "structured data extraction failed");
            None
        }
    }
}

/// Raw contents of every `<script type="application/ld+json">` block.
fn jsonld_blocks(document: &Html) -> impl Iterator<Item = String> + '_ {
    document
        .select(&SCRIPT)
        .filter(|el| {
            el.value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .map(|el| el.text().collect::<String>())
}

fn extract_recipe_from_jsonld(document: &Html, source_url: &str) -> Result<Recipe, ExtractError> {
    for block in jsonld_blocks(document) {
        let sanitized = sanitize_json(block.trim());
        let json: JsonValue = match serde_json::from_str(&sanitized) {
            Ok(v) => v,
            Err(e) => {
                let err = ExtractError::InvalidJson(e.to_string());
                tracing::debug!(url = source_url, error = %err, "skipping linked-data block");
                continue;
            }
        };

        let candidates = match &json {
            JsonValue::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        };

        if let Some(node) = candidates.into_iter().find_map(find_recipe_node) {
            return Ok(recipe_from_jsonld(node, document, source_url));
        }
    }

    Err(ExtractError::NoRecipe)
}

/// Escape raw control characters that some sites leave inside JSON strings.
fn sanitize_json(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            match c {
                _ if escaped => {
                    escaped = false;
                    result.push(c);
                }
                '\\' => {
                    escaped = true;
                    result.push(c);
                }
                '"' => {
                    in_string = false;
                    result.push(c);
                }
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                c if c.is_control() => {}
                _ => result.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
        }
    }

    result
}

/// Depth-first search for an object whose `@type` includes "Recipe".
/// Only the fields in [`CONTAINER_FIELDS`] are descended into; first match wins.
fn find_recipe_node(node: &JsonValue) -> Option<&Map<String, JsonValue>> {
    let obj = node.as_object()?;
    if declares_recipe(obj) {
        return Some(obj);
    }

    CONTAINER_FIELDS
        .iter()
        .filter_map(|field| obj.get(*field))
        .find_map(|child| match child {
            JsonValue::Array(items) => items.iter().find_map(find_recipe_node),
            JsonValue::Object(_) => find_recipe_node(child),
            _ => None,
        })
}

fn declares_recipe(obj: &Map<String, JsonValue>) -> bool {
    let is_recipe = |v: &JsonValue| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case("recipe"));
    match obj.get("@type") {
        Some(JsonValue::Array(types)) => types.iter().any(is_recipe),
        Some(other) => is_recipe(other),
        None => false,
    }
}

/// JavaScript-style truthiness: null, false, 0 and "" count as absent.
fn present(value: Option<&JsonValue>) -> Option<&JsonValue> {
    value.filter(|v| match v {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn recipe_from_jsonld(node: &Map<String, JsonValue>, document: &Html, source_url: &str) -> Recipe {
    let title = node
        .get("name")
        .and_then(JsonValue::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| first_heading(document));

    let ingredients = present(node.get("recipeIngredient"))
        .or_else(|| present(node.get("ingredients")))
        .map(split_ingredient_block)
        .unwrap_or_default();

    let instructions = match present(node.get("recipeInstructions")) {
        Some(JsonValue::Array(steps)) => clean_entries(steps.iter().filter_map(step_text)),
        Some(other) => split_step_block(other),
        None => clean_entries(document.select(&INSTRUCTION_ITEMS).map(element_text)),
    };

    Recipe::new(source_url, title.as_deref(), ingredients, instructions)
}

fn first_heading(document: &Html) -> Option<String> {
    document
        .select(&HEADING)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn extract_recipe_from_microdata(
    document: &Html,
    source_url: &str,
) -> Result<Recipe, ExtractError> {
    let scope = document
        .select(&MICRODATA_SCOPE)
        .next()
        .ok_or(ExtractError::NoRecipe)?;

    let title = scope
        .select(&MICRODATA_NAME)
        .next()
        .map(microdata_value)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&H1)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
        });

    let ingredients = clean_entries(scope.select(&MICRODATA_INGREDIENTS).map(microdata_value));

    let mut instructions = clean_entries(scope.select(&MICRODATA_STEPS).map(element_text));
    if instructions.is_empty() {
        instructions = clean_entries(
            document
                .select(&GENERIC_STEPS)
                .map(element_text)
                .take(MAX_FALLBACK_STEPS),
        );
    }

    Ok(Recipe::new(
        source_url,
        title.as_deref(),
        ingredients,
        instructions,
    ))
}

/// Value of a microdata property: the `content` attribute when present
/// (meta tags), otherwise the element's text.
fn microdata_value(el: ElementRef<'_>) -> String {
    match el.value().attr("content") {
        Some(content) => content.trim().to_string(),
        None => element_text(el),
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Approximate the rendered text of the page body: one line per block
/// element, whitespace collapsed inside text, scripts and styles skipped.
fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    push_visible_text(root, &mut out);
    out
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            push_collapsed(text, out);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if matches!(
                name,
                "script" | "style" | "noscript" | "template" | "head" | "svg"
            ) {
                continue;
            }
            let block = is_block(name);
            if block {
                out.push('\n');
            }
            push_visible_text(child_el, out);
            if block {
                out.push('\n');
            }
        }
    }
}

fn push_collapsed(text: &str, out: &mut String) {
    if text.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    let mut words = text.split_whitespace();
    if let Some(first) = words.next() {
        out.push_str(first);
        for word in words {
            out.push(' ');
            out.push_str(word);
        }
        if text.ends_with(char::is_whitespace) {
            out.push(' ');
        }
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "br"
            | "dd"
            | "details"
            | "div"
            | "dl"
            | "dt"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "td"
            | "th"
            | "tr"
            | "ul"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_TITLE;

    const URL: &str = "https://example.com/recipe";

    fn page(head: &str, body: &str) -> String {
        format!(
            "<!DOCTYPE html><html><head>{}</head><body>{}</body></html>",
            head, body
        )
    }

    fn ld(json: &str) -> String {
        format!(r#"<script type="application/ld+json">{}</script>"#, json)
    }

    #[test]
    fn jsonld_recipe_with_step_objects() {
        let html = page(
            &ld(r#"{
                "@context": "https://schema.org",
                "@type": "Recipe",
                "name": "Pancakes",
                "recipeIngredient": ["2 eggs", "1 cup flour"],
                "recipeInstructions": [{"text": "Mix."}, {"text": "Bake."}]
            }"#),
            "",
        );

        let extraction = extract_recipe(&html, URL);
        assert_eq!(extraction.method, ExtractionMethod::JsonLd);
        let recipe = extraction.recipe;
        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.ingredients, vec!["2 eggs", "1 cup flour"]);
        assert_eq!(recipe.instructions, vec!["Mix.", "Bake."]);
        assert_eq!(recipe.url, URL);
        assert!(recipe.notes.is_empty());
    }

    #[test]
    fn jsonld_single_instruction_object_is_kept() {
        let html = page(
            &ld(r#"{
                "@type": "Recipe",
                "name": "Roast",
                "recipeIngredient": ["1 chicken"],
                "recipeInstructions": {"@type": "HowToStep", "text": "Roast at 200C."}
            }"#),
            "<ol><li>Unrelated list item</li></ol>",
        );
        let recipe = extract_recipe(&html, URL).recipe;
        assert_eq!(recipe.instructions, vec!["Roast at 200C."]);
    }

    #[test]
    fn jsonld_type_array_is_case_insensitive() {
        let html = page(
            &ld(r#"{"@type": ["Thing", "recipe"], "name": "Stew", "recipeIngredient": ["beef"]}"#),
            "",
        );
        let extraction = extract_recipe(&html, URL);
        assert_eq!(extraction.method, ExtractionMethod::JsonLd);
        assert_eq!(extraction.recipe.title, "Stew");
        assert_eq!(extraction.recipe.ingredients, vec!["beef"]);
    }

    #[test]
    fn jsonld_recipe_inside_graph() {
        let html = page(
            &ld(r#"{
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "WebPage", "name": "Page"},
                    {"@type": "Recipe", "name": "Graph Cake", "recipeIngredient": "flour; sugar"}
                ]
            }"#),
            "",
        );
        let recipe = extract_recipe(&html, URL).recipe;
        assert_eq!(recipe.title, "Graph Cake");
        assert_eq!(recipe.ingredients, vec!["flour", "sugar"]);
    }

    #[test]
    fn jsonld_container_fields_searched_in_order() {
        // mainEntity comes before recipe in the search order.
        let html = page(
            &ld(r#"{
                "@type": "WebPage",
                "recipe": {"@type": "Recipe", "name": "Second"},
                "mainEntity": {"@type": "Article", "articleBody": {"@type": "Recipe", "name": "First"}}
            }"#),
            "",
        );
        assert_eq!(extract_recipe(&html, URL).recipe.title, "First");
    }

    #[test]
    fn jsonld_ignores_unlisted_fields() {
        let html = page(
            &ld(r#"{"@type": "WebPage", "about": {"@type": "Recipe", "name": "Hidden"}}"#),
            "<h1>Visible Title</h1><p>no recipe here</p>",
        );
        let extraction = extract_recipe(&html, URL);
        assert_eq!(extraction.method, ExtractionMethod::PageText);
    }

    #[test]
    fn jsonld_top_level_array() {
        let html = page(
            &ld(r#"[{"@type": "Organization"}, {"@type": "Recipe", "name": "Listed", "ingredients": ["salt"]}]"#),
            "",
        );
        let recipe = extract_recipe(&html, URL).recipe;
        assert_eq!(recipe.title, "Listed");
        assert_eq!(recipe.ingredients, vec!["salt"]);
    }

    #[test]
    fn malformed_block_is_skipped() {
        let head = format!(
            "{}{}",
            ld(r#"{"@type": "Recipe", "name": "Broken""#),
            ld(r#"{"@type": "Recipe", "name": "Good", "recipeIngredient": ["water"]}"#)
        );
        let recipe = extract_recipe(&page(&head, ""), URL).recipe;
        assert_eq!(recipe.title, "Good");
    }

    #[test]
    fn raw_newlines_inside_strings_are_tolerated() {
        let html = page(
            &ld("{\"@type\": \"Recipe\", \"name\": \"Multi\nLine\", \"recipeInstructions\": \"1. Stir\n2. Serve\"}"),
            "",
        );
        let recipe = extract_recipe(&html, URL).recipe;
        assert_eq!(recipe.title, "Multi\nLine");
        assert_eq!(recipe.instructions, vec!["Stir", "Serve"]);
    }

    #[test]
    fn missing_name_uses_first_heading_then_default() {
        let html = page(
            &ld(r#"{"@type": "Recipe", "recipeIngredient": ["a"]}"#),
            "<h2>From Heading</h2>",
        );
        assert_eq!(extract_recipe(&html, URL).recipe.title, "From Heading");

        let html = page(&ld(r#"{"@type": "Recipe", "recipeIngredient": ["a"]}"#), "");
        assert_eq!(extract_recipe(&html, URL).recipe.title, DEFAULT_TITLE);
    }

    #[test]
    fn missing_instructions_scan_list_items() {
        let html = page(
            &ld(r#"{"@type": "Recipe", "name": "Bread", "recipeIngredient": ["flour"]}"#),
            r#"<ul><li>not a step</li></ul>
               <div itemprop="recipeInstructions"><ul><li>Knead</li><li> </li></ul></div>
               <ol><li>Proof</li><li>Bake</li></ol>"#,
        );
        let recipe = extract_recipe(&html, URL).recipe;
        assert_eq!(recipe.instructions, vec!["Knead", "Proof", "Bake"]);
    }

    #[test]
    fn instruction_string_goes_through_step_splitter() {
        let html = page(
            &ld(r#"{"@type": "Recipe", "name": "Rice", "recipeInstructions": "Rinse rice.\nBoil water.\n\nSimmer."}"#),
            "",
        );
        let recipe = extract_recipe(&html, URL).recipe;
        assert_eq!(recipe.instructions, vec!["Rinse rice.", "Boil water.", "Simmer."]);
    }

    #[test]
    fn microdata_fallback() {
        let html = page(
            "",
            r#"<div itemscope itemtype="https://schema.org/Recipe">
                 <h1 itemprop="name">Micro Muffins</h1>
                 <ul>
                   <li itemprop="recipeIngredient">1 cup flour</li>
                   <li itemprop="ingredients">2 eggs</li>
                   <meta itemprop="recipeIngredient" content="pinch of salt">
                 </ul>
                 <div itemprop="recipeInstructions"><ol><li>Mix</li><li>Bake</li></ol></div>
               </div>"#,
        );
        let extraction = extract_recipe(&html, URL);
        assert_eq!(extraction.method, ExtractionMethod::Microdata);
        let recipe = extraction.recipe;
        assert_eq!(recipe.title, "Micro Muffins");
        assert_eq!(recipe.ingredients, vec!["1 cup flour", "2 eggs", "pinch of salt"]);
        assert_eq!(recipe.instructions, vec!["Mix", "Bake"]);
    }

    #[test]
    fn microdata_generic_steps_are_capped() {
        let items: String = (1..=40).map(|i| format!("<li>Step {}</li>", i)).collect();
        let html = page(
            "",
            &format!(
                r#"<h1>Long One</h1>
                   <div itemscope itemtype="http://schema.org/Recipe"><span>no name</span></div>
                   <ol>{}</ol>"#,
                items
            ),
        );
        let recipe = extract_recipe(&html, URL).recipe;
        assert_eq!(recipe.title, "Long One");
        assert_eq!(recipe.instructions.len(), MAX_FALLBACK_STEPS);
        assert_eq!(recipe.instructions[0], "Step 1");
    }

    #[test]
    fn page_text_fallback_uses_visible_text() {
        let html = page(
            "<title>ignored</title><style>.x{}</style>",
            r#"<h1>Grandma's Soup</h1>
               <script>var ingredients = 1;</script>
               <h2>Ingredients</h2>
               <ul><li>- Carrot</li><li>Onion and <b>celery</b></li></ul>
               <h2>Instructions</h2>
               <ol><li>Chop</li><li>Simmer</li></ol>
               <h3>Notes</h3><p>Serve hot</p>"#,
        );
        let extraction = extract_recipe(&html, URL);
        assert_eq!(extraction.method, ExtractionMethod::PageText);
        let recipe = extraction.recipe;
        assert_eq!(recipe.title, "Grandma's Soup");
        assert_eq!(recipe.ingredients, vec!["Carrot", "Onion and celery"]);
        assert_eq!(recipe.instructions, vec!["Chop", "Simmer"]);
    }

    #[test]
    fn sanitize_json_keeps_escaped_quotes() {
        let raw = "{\"a\": \"say \\\"hi\\\"\nnow\"}";
        let value: JsonValue = serde_json::from_str(&sanitize_json(raw)).unwrap();
        assert_eq!(value["a"], "say \"hi\"\nnow");
    }
}
