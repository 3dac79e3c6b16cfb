//! stagerev-core: everything behind the review TUI that does not draw.
//!
//! - [`git`]: staged files and diffs via the `git` executable
//! - [`prompt`]: review prompt text
//! - [`chat`]: OpenAI-compatible chat-completion client
//! - [`provider`]: provider defaults and resolution
//! - [`config`]: the `~/.stagerev.yaml` document
//! - [`review`]: the sequential review run

pub mod chat;
pub mod config;
pub mod error;
pub mod git;
pub mod prompt;
pub mod provider;
pub mod review;

pub use chat::{ChatProvider, OpenAiCompatibleClient};
pub use config::{Config, ConfigDocument};
pub use error::{ChatError, ConfigError, GitError, ReviewError};
pub use git::{DiffSource, GitCli};
pub use provider::ResolvedProvider;
pub use review::{run_review, ReviewOutcome};
