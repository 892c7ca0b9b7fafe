use super::render::read_fragment;
use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use terraflow_config::Settings;
use terraflow_runner::{Terraform, deploy};

pub async fn handle(
    settings: &Settings,
    dir: &Path,
    vars: Option<&Path>,
    fragments: &[PathBuf],
) -> anyhow::Result<()> {
    println!("{}", "Deploying terraform configuration...".blue());
    println!("Directory: {}", dir.display().to_string().cyan());

    let input_vars = match vars {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read variables file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Variables file {} is not valid JSON", path.display()))?
        }
        None => Value::Object(serde_json::Map::new()),
    };

    let fragments = fragments
        .iter()
        .map(|path| read_fragment(path).map(Value::from))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let terraform = Terraform::from_settings(settings, dir).await?;
    let outputs = deploy(&terraform, &input_vars, fragments).await?;

    println!();
    println!("{}", "✓ Deploy completed".green().bold());
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}
