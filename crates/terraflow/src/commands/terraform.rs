use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use terraflow_config::Settings;
use terraflow_runner::{Terraform, rm_local_state};

pub async fn handle_init(settings: &Settings, dir: &Path) -> anyhow::Result<()> {
    let terraform = Terraform::from_settings(settings, dir).await?;
    terraform.init().await?;
    println!("{}", "✓ terraform init completed".green());
    Ok(())
}

pub async fn handle_apply(
    settings: &Settings,
    dir: &Path,
    targets: &[String],
    var_files: &[PathBuf],
) -> anyhow::Result<()> {
    let terraform = Terraform::from_settings(settings, dir).await?;
    terraform.apply(targets, var_files).await?;
    println!("{}", "✓ terraform apply completed".green());
    Ok(())
}

pub async fn handle_output(settings: &Settings, dir: &Path) -> anyhow::Result<()> {
    let terraform = Terraform::from_settings(settings, dir).await?;
    let outputs = terraform.output().await?;
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

pub async fn handle_import(
    settings: &Settings,
    dir: &Path,
    addr: &str,
    id: &str,
) -> anyhow::Result<()> {
    let terraform = Terraform::from_settings(settings, dir).await?;
    terraform.import(addr, id).await?;
    println!("{}", format!("✓ Imported {} ({})", addr, id).green());
    Ok(())
}

pub async fn handle_refresh(settings: &Settings, dir: &Path) -> anyhow::Result<()> {
    let terraform = Terraform::from_settings(settings, dir).await?;
    terraform.refresh().await?;
    println!("{}", "✓ terraform refresh completed".green());
    Ok(())
}

pub async fn handle_destroy(
    settings: &Settings,
    dir: &Path,
    targets: &[String],
    yes: bool,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("⚠ Destroying resources in {}", dir.display())
            .yellow()
            .bold()
    );
    if targets.is_empty() {
        println!("  Targets: {}", "all resources".red());
    } else {
        for target in targets {
            println!("  • {}", target.cyan());
        }
    }

    if !yes && !confirm("Continue?")? {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    let terraform = Terraform::from_settings(settings, dir).await?;
    terraform.destroy(targets).await?;
    println!("{}", "✓ terraform destroy completed".green());
    Ok(())
}

pub async fn handle_rm_state(dir: &Path) -> anyhow::Result<()> {
    if rm_local_state(dir).await? {
        println!("{}", "✓ Removed terraform.tfstate".green());
    } else {
        println!("{}", "ℹ No terraform.tfstate found".dimmed());
    }
    Ok(())
}

pub async fn handle_fetch(settings: &Settings) -> anyhow::Result<()> {
    let terraform = Terraform::from_settings(settings, ".").await?;
    let version = terraform.version().await?;
    println!("{}", terraform.binary().display());
    println!("terraform {}", version.green());
    Ok(())
}

pub fn handle_version(settings: &Settings) {
    println!("terraflow {}", env!("CARGO_PKG_VERSION"));
    println!("terraform {} (configured)", settings.terraform_version);
}

/// y/N の確認プロンプト
fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N]: ", question);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
