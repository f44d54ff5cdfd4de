use anyhow::{bail, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &mut App, yes: bool, format: &OutputFormat) -> Result<()> {
    if !yes {
        bail!("This deletes all overrides, progress and review data. Re-run with --yes to confirm.");
    }

    app.ctx.clear_data();

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "cleared": true })),
        OutputFormat::Plain => println!("Local study data cleared."),
    }

    Ok(())
}
