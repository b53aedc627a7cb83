//! URL import: fetch, extract, fall back, persist.
//!
//! The cascade is two tiers and never retries:
//!
//! 1. Fetch the page HTML and run [`extract_recipe`].
//! 2. If that fetch fails, or the result has no title or no ingredients and
//!    no instructions, fetch readable text once and run the heading scan.
//!
//! A recipe is persisted only when one of the tiers produced content.

use crate::error::{FetchError, ImportError};
use crate::extract::extract_recipe;
use crate::http::Retriever;
use crate::library::RecipeBook;
use crate::text::extract_from_text;
use crate::types::{Extraction, ExtractionMethod, Recipe};

/// A persisted recipe and the tier that produced it.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub recipe: Recipe,
    pub method: ExtractionMethod,
}

impl ImportOutcome {
    pub fn status_message(&self) -> &'static str {
        self.method.status_message()
    }
}

pub struct RecipeImporter<H, T> {
    html: H,
    text: T,
    book: RecipeBook,
}

impl<H: Retriever, T: Retriever> RecipeImporter<H, T> {
    /// `html` returns page markup; `text` returns a readable-text rendering.
    pub fn new(html: H, text: T, book: RecipeBook) -> Self {
        Self { html, text, book }
    }

    #[tracing::instrument(skip(self))]
    pub async fn import_from_url(&self, url: &str) -> Result<ImportOutcome, ImportError> {
        let url = url.trim();
        validate_target(url)?;

        let extraction = match self.html.retrieve(url).await {
            Ok(html) => {
                let extraction = extract_recipe(&html, url);
                if extraction.recipe.is_insufficient() {
                    tracing::warn!(url, method = ?extraction.method, "page had no usable content, trying readable text");
                    self.readable_text(url).await?
                } else {
                    extraction
                }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "page fetch failed, trying readable text");
                self.readable_text(url).await?
            }
        };

        self.book.save(&extraction.recipe).await?;
        tracing::info!(
            url,
            id = %extraction.recipe.id,
            method = ?extraction.method,
            ingredients = extraction.recipe.ingredients.len(),
            instructions = extraction.recipe.instructions.len(),
            "imported recipe"
        );

        Ok(ImportOutcome {
            recipe: extraction.recipe,
            method: extraction.method,
        })
    }

    async fn readable_text(&self, url: &str) -> Result<Extraction, ImportError> {
        let text = self.text.retrieve(url).await?;
        let recipe = extract_from_text(&text, url);
        if recipe.is_insufficient() {
            return Err(ImportError::NoContent(url.to_string()));
        }
        Ok(Extraction {
            recipe,
            method: ExtractionMethod::ReadableText,
        })
    }
}

fn validate_target(url: &str) -> Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(FetchError::InvalidUrl(format!("unsupported scheme: {}", parsed.scheme())))
    }
}
