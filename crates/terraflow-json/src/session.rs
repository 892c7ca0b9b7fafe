//! Scoped accumulation of fragments into one output file
//!
//! A [`Session`] owns its [`Document`], so independent sessions never share
//! state. Whatever way the session ends, the accumulated document is
//! written to the target path and then cleared.

use crate::document::Document;
use crate::error::Result;
use crate::fragment::Fragment;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// RAII guard that renders its document to a file when it ends
///
/// Call [`Session::finish`] to surface render errors. A session dropped
/// without `finish` (early return or panic) still writes a best-effort
/// snapshot.
pub struct Session {
    path: PathBuf,
    document: Document,
    finished: bool,
}

impl Session {
    /// Start a new session targeting `path`
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        tracing::debug!("Opened configuration session for {}", path.display());

        Self {
            path,
            document: Document::new(),
            finished: false,
        }
    }

    /// Target file of this session
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge a fragment into the session's document
    pub fn merge(&mut self, fragment: Fragment) -> &mut Self {
        self.document.merge_in(fragment);
        self
    }

    /// Merge an arbitrary object-rooted document
    pub fn merge_value(&mut self, value: Value) -> Result<&mut Self> {
        self.document.merge_value(value)?;
        Ok(self)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Render to the target path and clear the document
    pub fn finish(mut self) -> Result<()> {
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.finished = true;
        let result = self.document.write_to(&self.path);
        self.document.clear();
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.finished
            && let Err(e) = self.flush()
        {
            tracing::warn!(
                "Failed to write configuration snapshot to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Run `body` inside a session writing to `path`.
///
/// The document is always rendered and cleared. If `body` fails its error
/// is returned after cleanup; otherwise a render failure is returned.
///
/// ```no_run
/// use serde_json::json;
/// use terraflow_json::{fragment, with_session};
///
/// with_session("main.tf.json", |session| {
///     session.merge(fragment::provider("aws", json!({"region": "us-east-1"}))?);
///     Ok::<_, terraflow_json::JsonError>(())
/// })?;
/// # Ok::<_, terraflow_json::JsonError>(())
/// ```
pub fn with_session<T, E, F>(path: impl AsRef<Path>, body: F) -> std::result::Result<T, E>
where
    F: FnOnce(&mut Session) -> std::result::Result<T, E>,
    E: From<crate::JsonError>,
{
    let mut session = Session::open(path);
    let outcome = body(&mut session);
    let rendered = session.flush();

    match (outcome, rendered) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), rendered) => {
            if let Err(render_error) = rendered {
                tracing::warn!("Discarding render error after failed session: {}", render_error);
            }
            Err(e)
        }
    }
}
