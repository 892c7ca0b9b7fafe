//! One-shot deploy of a terraform working directory
//!
//! Writes the generated configuration and input variables, then runs
//! init, apply and output in sequence.

use crate::error::{Result, TerraformError};
use crate::terraform::Terraform;
use serde_json::Value;
use std::io::Write;
use terraflow_json::with_session;

/// Generated configuration written next to the user's own `*.tf` files
pub const GENERATED_FILE: &str = "_terraflow.tf.json";

/// Deploy `terraform`'s working directory and return its outputs.
///
/// `input_vars` supplies values for the module's `variable` blocks and must
/// be an object. When `fragments` is non-empty they are merged into
/// [`GENERATED_FILE`] first.
pub async fn deploy(terraform: &Terraform, input_vars: &Value, fragments: Vec<Value>) -> Result<Value> {
    if !input_vars.is_object() {
        return Err(TerraformError::InvalidInput(
            "input variables must be a JSON object".to_string(),
        ));
    }

    if !fragments.is_empty() {
        let path = terraform.directory().join(GENERATED_FILE);
        tracing::info!(
            "Writing {} fragments to {}",
            fragments.len(),
            path.display()
        );
        with_session(&path, |session| {
            for fragment in fragments {
                session.merge_value(fragment)?;
            }
            Ok::<_, TerraformError>(())
        })?;
    }

    let mut vars_file = tempfile::Builder::new()
        .prefix("terraflow-")
        .suffix(".tfvars.json")
        .tempfile()?;
    serde_json::to_writer(&mut vars_file, input_vars)?;
    vars_file.flush()?;

    terraform.init().await?;
    terraform
        .apply(&[], &[vars_file.path().to_path_buf()])
        .await?;
    terraform.output().await
}
