//! terraflow Terraform runner
//!
//! Fetches the terraform binary and drives it as a subprocess.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 terraflow CLI                    │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               terraflow-runner                   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │    deploy    │──│  Terraform   │            │
//! │  └──────┬───────┘  └──────┬───────┘            │
//! │         │          ┌──────▼───────┐            │
//! │         │          │   process    │            │
//! │         │          └──────────────┘            │
//! └─────────┼───────────────────────────────────────┘
//!           │
//! ┌─────────▼───────┐ ┌─────────────────┐
//! │ terraflow-json  │ │ terraflow-config│
//! │ (*.tf.json)     │ │ (version/cache) │
//! └─────────────────┘ └─────────────────┘
//! ```
//!
//! # Requirements
//!
//! - `unzip` must be on `PATH` the first time a terraform version is fetched

pub mod binary;
pub mod deploy;
pub mod error;
pub mod process;
pub mod terraform;

// Re-exports
pub use binary::{download_url, ensure_binary};
pub use deploy::{GENERATED_FILE, deploy};
pub use error::{Result, TerraformError};
pub use process::{RunOptions, run_command, timed};
pub use terraform::{Terraform, rm_local_state};
