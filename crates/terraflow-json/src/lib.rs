//! Terraform JSON configuration assembly
//!
//! Builds `*.tf.json` documents out of small fragments, each describing one
//! provider, variable, resource, output and so on. Fragments are combined
//! with a recursive merge: objects merge key by key, anything else is
//! replaced by the later fragment.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use terraflow_json::{Session, fragment};
//!
//! let mut session = Session::open("main.tf.json");
//! session.merge(fragment::resource("bucket", "data", json!({"region": "us-east-1"}))?);
//! session.merge(fragment::output("bucket_name", json!({"value": "${bucket.data.name}"}))?);
//! session.finish()?;
//! # Ok::<_, terraflow_json::JsonError>(())
//! ```

pub mod document;
pub mod error;
pub mod fragment;
pub mod merge;
pub mod session;

// Re-exports
pub use document::Document;
pub use error::{JsonError, Result};
pub use fragment::{Fragment, ROOT_KEYS};
pub use merge::deep_merge;
pub use session::{Session, with_session};
