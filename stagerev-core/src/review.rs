//! The review run: staged files in, one markdown review per file out.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::chat::ChatProvider;
use crate::error::ReviewError;
use crate::git::DiffSource;
use crate::prompt::build_review_prompt;

/// Result of a successful review run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Staged files in listing order.
    pub files: Vec<String>,
    /// Markdown review per file path.
    pub reviews: HashMap<String, String>,
}

impl ReviewOutcome {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Review text for `path`, if one was produced.
    pub fn review_for(&self, path: &str) -> Option<&str> {
        self.reviews.get(path).map(String::as_str)
    }
}

/// Reviews every staged file, one after another.
///
/// Each file's diff is fetched, wrapped in the review prompt, and sent to
/// `chat` before the next file is touched. The first failure ends the run and
/// no partial results are returned.
///
/// # Errors
///
/// [`ReviewError::ListFiles`] if the staged list cannot be read, otherwise
/// [`ReviewError::Diff`] or [`ReviewError::Chat`] naming the failing file.
pub async fn run_review(
    source: &dyn DiffSource,
    chat: &dyn ChatProvider,
) -> Result<ReviewOutcome, ReviewError> {
    let files = source.staged_files().await.map_err(ReviewError::ListFiles)?;
    if files.is_empty() {
        info!("no staged files to review");
        return Ok(ReviewOutcome::default());
    }

    let mut reviews = HashMap::with_capacity(files.len());
    for (idx, path) in files.iter().enumerate() {
        debug!(file = %path, n = idx + 1, total = files.len(), "reviewing");

        let diff = source
            .staged_diff(path)
            .await
            .map_err(|source| ReviewError::Diff {
                path: path.clone(),
                source,
            })?;

        let reply = chat
            .chat(&build_review_prompt(&diff))
            .await
            .map_err(|source| ReviewError::Chat {
                path: path.clone(),
                source,
            })?;

        reviews.insert(path.clone(), reply);
    }

    info!(files = files.len(), "review complete");
    Ok(ReviewOutcome { files, reviews })
}
