use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use chd_study_lib::interchange::ImportOptions;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(
    app: &mut App,
    file: &Path,
    merge: bool,
    with_state: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let options = ImportOptions {
        include_state: with_state,
        merge_with_existing: merge,
    };

    let result = app
        .ctx
        .import_json(&raw, options)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "validCount": result.valid_count,
                "appliedCount": result.applied_count,
                "invalidItems": result.invalid_items,
                "progressRestored": result.progress.is_some(),
                "reviewRestored": result.review.is_some(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", result);
            for item in &result.invalid_items {
                println!(
                    "  {} {}",
                    terminal::paint(&item.id, Color::YELLOW, use_color),
                    item.errors.join("; ")
                );
            }
            if result.progress.is_some() || result.review.is_some() {
                println!("Study state restored from the import file.");
            }
        }
    }

    Ok(())
}
