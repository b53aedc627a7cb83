use std::path::Path;

use anyhow::{bail, Context, Result};
use larder_core::{shared_url, Config, Recipe, RecipeBook, RecipeEdit, RecipeImporter, RelayClient};

pub async fn import(config: &Config, book: RecipeBook, url: &str) -> Result<()> {
    let importer = RecipeImporter::new(
        RelayClient::html(config).context("Failed to build HTML relay client")?,
        RelayClient::readable_text(config).context("Failed to build text relay client")?,
        book,
    );

    let outcome = importer.import_from_url(url).await?;
    println!("{}", outcome.status_message());
    print_recipe(&outcome.recipe);
    Ok(())
}

pub async fn share(config: &Config, book: RecipeBook, launch: &str) -> Result<()> {
    let Some(url) = shared_url(launch) else {
        bail!("No http(s) `url` parameter in {}", launch);
    };
    import(config, book, &url).await
}

pub async fn list(book: &RecipeBook, search: Option<&str>) -> Result<()> {
    let recipes = book.search(search.unwrap_or_default()).await?;
    if recipes.is_empty() {
        println!("No recipes saved.");
        return Ok(());
    }
    for recipe in recipes {
        println!(
            "{}  {}  {}",
            recipe.id,
            recipe.created_at.format("%Y-%m-%d"),
            recipe.title
        );
    }
    Ok(())
}

pub async fn show(book: &RecipeBook, id: &str) -> Result<()> {
    let recipe = book
        .get(id)
        .await?
        .with_context(|| format!("Recipe not found: {}", id))?;
    print_recipe(&recipe);
    Ok(())
}

pub async fn delete(book: &RecipeBook, id: &str) -> Result<()> {
    if book.get(id).await?.is_none() {
        bail!("Recipe not found: {}", id);
    }
    book.delete(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

pub async fn notes(book: &RecipeBook, id: &str, notes: &str) -> Result<()> {
    book.update_notes(id, notes).await?;
    println!("Notes saved.");
    Ok(())
}

/// Unspecified parts keep their current content.
pub async fn edit(
    book: &RecipeBook,
    id: &str,
    title: Option<String>,
    ingredients: Option<&Path>,
    instructions: Option<&Path>,
) -> Result<()> {
    let current = book
        .get(id)
        .await?
        .with_context(|| format!("Recipe not found: {}", id))?;

    let edit = RecipeEdit {
        title: title.unwrap_or(current.title),
        ingredients: match ingredients {
            Some(path) => read_file(path)?,
            None => current.ingredients.join("\n"),
        },
        instructions: match instructions {
            Some(path) => read_file(path)?,
            None => current.instructions.join("\n"),
        },
    };

    let recipe = book.edit(id, edit).await?;
    print_recipe(&recipe);
    Ok(())
}

pub async fn export(book: &RecipeBook, output: Option<&Path>) -> Result<()> {
    let json = book.export_json().await?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn import_file(book: &RecipeBook, path: &Path) -> Result<()> {
    let text = read_file(path)?;
    let count = book.import_json(&text).await?;
    println!("Imported {} recipes.", count);
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.title);
    println!("{}", recipe.url);
    println!("id: {}  saved: {}", recipe.id, recipe.created_at.format("%Y-%m-%d %H:%M"));

    if !recipe.ingredients.is_empty() {
        println!("\nIngredients");
        for line in &recipe.ingredients {
            println!("  - {}", line);
        }
    }
    if !recipe.instructions.is_empty() {
        println!("\nInstructions");
        for (i, step) in recipe.instructions.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }
    if !recipe.notes.is_empty() {
        println!("\nNotes\n  {}", recipe.notes);
    }
}
