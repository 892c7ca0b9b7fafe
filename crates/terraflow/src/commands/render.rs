use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use terraflow_json::{Fragment, with_session};

pub fn handle(out: &Path, fragments: &[PathBuf]) -> anyhow::Result<()> {
    println!("{}", "Rendering terraform configuration...".blue());

    with_session(out, |session| {
        for path in fragments {
            let fragment = read_fragment(path)?;
            println!("  • {}", path.display().to_string().cyan());
            session.merge(fragment);
        }
        Ok::<_, anyhow::Error>(())
    })?;

    println!();
    println!(
        "{}",
        format!("✓ Wrote {} ({} fragments)", out.display(), fragments.len())
            .green()
            .bold()
    );
    Ok(())
}

/// Read a fragment file and check its top-level keys
pub fn read_fragment(path: &Path) -> anyhow::Result<Fragment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fragment file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Fragment file {} is not valid JSON", path.display()))?;

    Fragment::try_from(value).with_context(|| format!("Invalid fragment in {}", path.display()))
}
