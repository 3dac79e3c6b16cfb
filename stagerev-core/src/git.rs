//! Staged-change discovery through the `git` executable.
//!
//! Every call spawns a fresh `git` process. Stdout is the result; on failure
//! the combined stdout+stderr is inspected to pick the error. Nothing is cached
//! between calls: a review run reads the index once per file, in listing order.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;

/// Pathspec limiting reviews to Rust sources.
pub const SOURCE_PATHSPEC: &str = "*.rs";

/// Marker git prints when run outside a working tree.
const NOT_A_REPO_MARKER: &str = "not a git repository";

/// Outside a repository `git diff` falls back to `--no-index` mode and rejects
/// `--cached` with this message instead of the marker above.
const NO_INDEX_FALLBACK_MARKER: &str = "unknown option `cached'";

/// Read access to the staged area.
///
/// Implemented by [`GitCli`] in production and by in-memory fakes in tests.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Returns the staged file paths, repository-relative, without duplicates.
    async fn staged_files(&self) -> Result<Vec<String>, GitError>;

    /// Returns the zero-context staged diff for a single file.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::EmptyDiff`] when git prints nothing for `path`.
    async fn staged_diff(&self, path: &str) -> Result<String, GitError>;
}

/// `DiffSource` backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: Option<PathBuf>,
    pathspec: String,
    envs: Vec<(String, String)>,
}

impl GitCli {
    /// Runs git in the process's current directory with the default pathspec.
    pub fn new() -> Self {
        Self {
            workdir: None,
            pathspec: SOURCE_PATHSPEC.to_owned(),
            envs: Vec::new(),
        }
    }

    /// Runs git inside `dir` instead of the current directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(dir.into()),
            ..Self::new()
        }
    }

    /// Overrides the pathspec used when listing staged files.
    #[must_use]
    pub fn with_pathspec(mut self, pathspec: impl Into<String>) -> Self {
        self.pathspec = pathspec.into();
        self
    }

    /// Sets an environment variable on every git process this client spawns.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Fails with [`GitError::NotARepository`] unless git finds a repository.
    async fn ensure_repository(&self) -> Result<(), GitError> {
        self.run(&["rev-parse", "--git-dir"]).await.map(drop)
    }

    /// Runs `git <args>` and returns its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        cmd.envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        debug!(?args, "running git");

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                GitError::NotInstalled
            } else {
                GitError::SpawnFailed(e)
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let mut combined = stdout;
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            let combined = combined.trim().to_owned();
            return Err(classify_failure(args, combined, output.status.code()));
        }
        Ok(stdout)
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiffSource for GitCli {
    async fn staged_files(&self) -> Result<Vec<String>, GitError> {
        self.ensure_repository().await?;
        let output = self
            .run(&["diff", "--cached", "--name-only", "-z", "--", &self.pathspec])
            .await?;
        let files = parse_name_only(&output);
        debug!(pathspec = %self.pathspec, count = files.len(), "listed staged files");
        Ok(files)
    }

    async fn staged_diff(&self, path: &str) -> Result<String, GitError> {
        let literal = format!(":(literal){path}");
        let output = self
            .run(&["diff", "--cached", "--unified=0", "--", &literal])
            .await?;
        let diff = output.trim();
        if diff.is_empty() {
            return Err(GitError::EmptyDiff(path.to_owned()));
        }
        Ok(diff.to_owned())
    }
}

/// Maps a non-zero git exit to the matching error.
fn classify_failure(args: &[&str], output: String, code: Option<i32>) -> GitError {
    if output.contains(NOT_A_REPO_MARKER) {
        return GitError::NotARepository(output);
    }
    if output.contains(NO_INDEX_FALLBACK_MARKER) {
        // Drop the usage text that follows.
        let first = output.lines().next().unwrap_or_default().to_owned();
        return GitError::NotARepository(first);
    }
    let output = if output.is_empty() {
        match code {
            Some(c) => format!("exit code {c}"),
            None => "terminated by signal".to_owned(),
        }
    } else {
        output
    };
    GitError::CommandFailed {
        args: args.join(" "),
        output,
    }
}

/// Splits `--name-only -z` output into unique, non-empty paths in first-seen order.
///
/// With `-z` git neither quotes nor escapes paths, so entries are used verbatim.
pub fn parse_name_only(output: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    output
        .split('\0')
        .filter(|entry| !entry.trim().is_empty())
        .filter(|entry| seen.insert(*entry))
        .map(str::to_owned)
        .collect()
}
