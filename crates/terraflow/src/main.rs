mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use terraflow_config::Settings;

#[derive(Parser)]
#[command(name = "terraflow")]
#[command(about = "Assemble Terraform JSON configuration and drive terraform", long_about = None)]
struct Cli {
    /// terraform working directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    dir: PathBuf,

    /// terraform version to download and run
    #[arg(long, global = true, env = "TERRAFLOW_TERRAFORM_VERSION")]
    terraform_version: Option<String>,

    /// Where downloaded terraform binaries are cached
    #[arg(long, global = true, env = "TERRAFLOW_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge fragment files into one *.tf.json document
    Render {
        /// Output file
        #[arg(short, long, default_value = "main.tf.json")]
        out: PathBuf,
        /// Fragment files (JSON objects keyed by terraform/provider/variable/data/resource/output)
        #[arg(required = true)]
        fragments: Vec<PathBuf>,
    },
    /// Write fragments, then run init, apply and output
    Deploy {
        /// JSON file with values for the module's variables
        #[arg(long)]
        vars: Option<PathBuf>,
        /// Fragment files merged into the generated configuration
        fragments: Vec<PathBuf>,
    },
    /// terraform init
    Init,
    /// terraform apply -auto-approve
    Apply {
        /// Resource addresses to limit the apply to
        #[arg(short, long = "target")]
        targets: Vec<String>,
        /// Variable files to pass through
        #[arg(long = "var-file")]
        var_files: Vec<PathBuf>,
    },
    /// Print terraform outputs as JSON
    Output,
    /// terraform import
    Import {
        /// Resource address
        addr: String,
        /// Provider-specific resource ID
        id: String,
    },
    /// terraform refresh
    Refresh,
    /// terraform destroy -auto-approve
    Destroy {
        /// Resource addresses to limit the destroy to
        #[arg(short, long = "target")]
        targets: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove the local terraform.tfstate
    #[command(name = "rm-state")]
    RmState,
    /// Download the terraform binary (if needed) and print its path
    Fetch,
    /// Show terraflow and terraform versions
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        dir,
        terraform_version,
        cache_dir,
        verbose,
        command,
    } = Cli::parse();

    // ログは stderr に出力（stdout は output の JSON 用）
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    // Render と RmState は terraform バイナリ不要
    let command = match command {
        Commands::Render { out, fragments } => return commands::render::handle(&out, &fragments),
        Commands::RmState => return commands::terraform::handle_rm_state(&dir).await,
        other => other,
    };

    let settings = load_settings(terraform_version, cache_dir)?;
    tracing::debug!(
        "Using terraform {} (cache: {}, directory: {})",
        settings.terraform_version,
        settings.cache_dir.display(),
        dir.display()
    );

    match command {
        Commands::Deploy { vars, fragments } => {
            commands::deploy::handle(&settings, &dir, vars.as_deref(), &fragments).await
        }
        Commands::Init => commands::terraform::handle_init(&settings, &dir).await,
        Commands::Apply { targets, var_files } => {
            commands::terraform::handle_apply(&settings, &dir, &targets, &var_files).await
        }
        Commands::Output => commands::terraform::handle_output(&settings, &dir).await,
        Commands::Import { addr, id } => {
            commands::terraform::handle_import(&settings, &dir, &addr, &id).await
        }
        Commands::Refresh => commands::terraform::handle_refresh(&settings, &dir).await,
        Commands::Destroy { targets, yes } => {
            commands::terraform::handle_destroy(&settings, &dir, &targets, yes).await
        }
        Commands::Fetch => commands::terraform::handle_fetch(&settings).await,
        Commands::Version => {
            commands::terraform::handle_version(&settings);
            Ok(())
        }
        Commands::Render { .. } | Commands::RmState => Ok(()),
    }
}

/// 環境変数の設定を CLI フラグで上書き
fn load_settings(
    terraform_version: Option<String>,
    cache_dir: Option<PathBuf>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(version) = terraform_version {
        settings = settings.with_version(version)?;
    }
    if let Some(cache_dir) = cache_dir {
        settings = settings.with_cache_dir(cache_dir);
    }
    Ok(settings)
}
