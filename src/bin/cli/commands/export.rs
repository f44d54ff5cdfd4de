use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::app::App;

pub fn run(app: &App, out: Option<&Path>) -> Result<()> {
    let payload = app.ctx.export_payload();
    let json = serde_json::to_string_pretty(&payload)?;

    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported {} questions to {}", payload.questions.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
