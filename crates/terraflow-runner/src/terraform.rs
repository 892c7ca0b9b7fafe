//! terraform CLI wrapper
//!
//! Wraps the terraform subcommands used to provision a working directory.

use crate::binary::ensure_binary;
use crate::error::{Result, TerraformError};
use crate::process::{RunOptions, capture_command, run_command, timed};
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use terraflow_config::{DEFAULT_IMPORT_TIMEOUT_SECS, Settings};

const STATE_FILE: &str = "terraform.tfstate";

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid version pattern"));

/// terraform CLI bound to one working directory
#[derive(Debug, Clone)]
pub struct Terraform {
    binary: PathBuf,
    directory: PathBuf,
    import_timeout: Duration,
}

impl Terraform {
    pub fn new(binary: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            directory: directory.into(),
            import_timeout: Duration::from_secs(DEFAULT_IMPORT_TIMEOUT_SECS),
        }
    }

    /// Fetch (or reuse) the configured binary and bind it to `directory`
    pub async fn from_settings(settings: &Settings, directory: impl Into<PathBuf>) -> Result<Self> {
        let binary = ensure_binary(settings).await?;
        Ok(Self::new(binary, directory).with_import_timeout(settings.import_timeout))
    }

    pub fn with_import_timeout(mut self, timeout: Duration) -> Self {
        self.import_timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Run a subcommand with streamed output, failing on non-zero exit
    async fn run(&self, args: Vec<String>, options: RunOptions) -> Result<()> {
        let options = options.cwd(&self.directory).prefix("terraform");
        let status = run_command(&self.binary, &args, &options).await?;

        if !status.success() {
            return Err(TerraformError::CommandFailed {
                command: args.first().cloned().unwrap_or_default(),
                message: match status.code() {
                    Some(code) => format!("exit code {}", code),
                    None => "terminated by signal".to_string(),
                },
            });
        }

        Ok(())
    }

    /// `terraform init`
    pub async fn init(&self) -> Result<()> {
        tracing::info!("terraform init directory={}", self.directory.display());
        timed(
            "terraform init",
            self.run(vec!["init".to_string()], RunOptions::new()),
        )
        .await
    }

    /// `terraform apply -auto-approve`, optionally limited to `targets`
    pub async fn apply(&self, targets: &[String], var_files: &[PathBuf]) -> Result<()> {
        tracing::info!(
            "terraform apply directory={} targets={:?}",
            self.directory.display(),
            targets
        );
        timed(
            "terraform apply",
            self.run(apply_args(targets, var_files), RunOptions::new()),
        )
        .await
    }

    /// `terraform output -json`, parsed
    pub async fn output(&self) -> Result<Value> {
        tracing::info!(
            "terraform={} output directory={}",
            self.binary.display(),
            self.directory.display()
        );

        let stdout = timed(
            "terraform output",
            capture_command(
                &self.binary,
                &["output".to_string(), "-json".to_string()],
                Some(&self.directory),
            ),
        )
        .await?;

        if stdout.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_str(stdout.trim())?)
    }

    /// `terraform import <addr> <id>`
    ///
    /// Runs with the import timeout and without red error highlighting,
    /// since importing an already-managed resource is a routine failure.
    pub async fn import(&self, addr: &str, id: &str) -> Result<()> {
        tracing::info!(
            "terraform import directory={} addr={} id={}",
            self.directory.display(),
            addr,
            id
        );
        let options = RunOptions::new()
            .strip_errors(true)
            .timeout(self.import_timeout);
        timed(
            "terraform import",
            self.run(
                vec!["import".to_string(), addr.to_string(), id.to_string()],
                options,
            ),
        )
        .await
    }

    /// `terraform refresh`
    pub async fn refresh(&self) -> Result<()> {
        tracing::info!("terraform refresh directory={}", self.directory.display());
        timed(
            "terraform refresh",
            self.run(vec!["refresh".to_string()], RunOptions::new()),
        )
        .await
    }

    /// `terraform destroy -auto-approve`, optionally limited to `targets`
    pub async fn destroy(&self, targets: &[String]) -> Result<()> {
        tracing::info!(
            "terraform destroy directory={} targets={:?}",
            self.directory.display(),
            targets
        );
        timed(
            "terraform destroy",
            self.run(destroy_args(targets), RunOptions::new()),
        )
        .await
    }

    /// Version reported by `terraform --version`, e.g. `1.5.7`
    pub async fn version(&self) -> Result<String> {
        tracing::info!("checking terraform={} version", self.binary.display());
        let stdout = capture_command(&self.binary, &["--version".to_string()], None).await?;
        parse_version(&stdout).ok_or(TerraformError::VersionParse(stdout))
    }
}

pub fn apply_args(targets: &[String], var_files: &[PathBuf]) -> Vec<String> {
    let mut args = vec!["apply".to_string(), "-auto-approve".to_string()];
    args.extend(targets.iter().map(|t| format!("-target={}", t)));
    args.extend(var_files.iter().map(|f| format!("-var-file={}", f.display())));
    args
}

pub fn destroy_args(targets: &[String]) -> Vec<String> {
    let mut args = vec!["destroy".to_string(), "-auto-approve".to_string()];
    args.extend(targets.iter().map(|t| format!("-target={}", t)));
    args
}

/// First `MAJOR.MINOR.PATCH` found in `text`
pub fn parse_version(text: &str) -> Option<String> {
    VERSION_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// Remove `terraform.tfstate` from `directory`, returning whether it existed
pub async fn rm_local_state(directory: &Path) -> Result<bool> {
    let path = directory.join(STATE_FILE);
    tracing::info!("rm local state file {}", path.display());

    if !path.is_file() {
        return Ok(false);
    }

    tokio::fs::remove_file(&path).await?;
    Ok(true)
}

#[cfg(all(test, unix))]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};

    /// Fake terraform that records its arguments to `calls.log` next to it
    const FAKE_TERRAFORM: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
case "$1" in
  output)
    echo '{"bucket_name": {"sensitive": false, "type": "string", "value": "data"}}'
    ;;
  --version)
    echo "Terraform v1.5.7"
    echo "on linux_amd64"
    ;;
  import)
    if [ "$2" = "slow.resource" ]; then
      sleep 10
    fi
    printf '\033[31mError: Resource already managed by Terraform\n' >&2
    exit 1
    ;;
esac
exit 0
"#;

    pub(crate) fn fake_terraform(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("terraform");
        std::fs::write(&path, FAKE_TERRAFORM).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub(crate) fn calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_args() {
        let args = apply_args(
            &["module.vpc".to_string()],
            &[PathBuf::from("/tmp/vars.tfvars.json")],
        );
        assert_eq!(
            args,
            vec![
                "apply",
                "-auto-approve",
                "-target=module.vpc",
                "-var-file=/tmp/vars.tfvars.json"
            ]
        );
    }

    #[test]
    fn test_destroy_args() {
        assert_eq!(destroy_args(&[]), vec!["destroy", "-auto-approve"]);
        assert_eq!(
            destroy_args(&["aws_s3_bucket.data".to_string()]),
            vec!["destroy", "-auto-approve", "-target=aws_s3_bucket.data"]
        );
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("Terraform v1.5.7\non linux_amd64\n"),
            Some("1.5.7".to_string())
        );
        assert_eq!(parse_version("no version here"), None);
    }

    #[tokio::test]
    async fn test_rm_local_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(!rm_local_state(temp_dir.path()).await.unwrap());

        std::fs::write(temp_dir.path().join(STATE_FILE), "{}").unwrap();
        assert!(rm_local_state(temp_dir.path()).await.unwrap());
        assert!(!temp_dir.path().join(STATE_FILE).exists());
    }

    #[cfg(unix)]
    mod fake_binary {
        use super::super::testing::{calls, fake_terraform};
        use super::*;
        use serial_test::serial;

        #[tokio::test]
        #[serial]
        async fn test_subcommands() {
            let bin_dir = tempfile::tempdir().unwrap();
            let work_dir = tempfile::tempdir().unwrap();
            let tf = Terraform::new(fake_terraform(bin_dir.path()), work_dir.path());

            tf.init().await.unwrap();
            tf.refresh().await.unwrap();
            tf.destroy(&["aws_s3_bucket.data".to_string()]).await.unwrap();

            assert_eq!(
                calls(bin_dir.path()),
                vec![
                    "init",
                    "refresh",
                    "destroy -auto-approve -target=aws_s3_bucket.data"
                ]
            );
        }

        #[tokio::test]
        #[serial]
        async fn test_output_and_version() {
            let bin_dir = tempfile::tempdir().unwrap();
            let work_dir = tempfile::tempdir().unwrap();
            let tf = Terraform::new(fake_terraform(bin_dir.path()), work_dir.path());

            let output = tf.output().await.unwrap();
            assert_eq!(output["bucket_name"]["value"], "data");

            assert_eq!(tf.version().await.unwrap(), "1.5.7");
        }

        #[tokio::test]
        #[serial]
        async fn test_import_failure_is_reported() {
            let bin_dir = tempfile::tempdir().unwrap();
            let work_dir = tempfile::tempdir().unwrap();
            let tf = Terraform::new(fake_terraform(bin_dir.path()), work_dir.path());

            let err = tf.import("aws_s3_bucket.data", "data").await.unwrap_err();
            assert!(matches!(
                err,
                TerraformError::CommandFailed { ref command, .. } if command == "import"
            ));
        }

        #[tokio::test]
        #[serial]
        async fn test_import_timeout() {
            let bin_dir = tempfile::tempdir().unwrap();
            let work_dir = tempfile::tempdir().unwrap();
            let tf = Terraform::new(fake_terraform(bin_dir.path()), work_dir.path())
                .with_import_timeout(Duration::from_millis(300));

            let err = tf.import("slow.resource", "id").await.unwrap_err();
            assert!(matches!(err, TerraformError::Timeout { .. }));
        }
    }
}
