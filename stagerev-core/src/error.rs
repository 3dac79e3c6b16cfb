//! Error types for stagerev-core, one enum per collaborator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading, validating, or rewriting the YAML config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the home directory for the config file")]
    NoHomeDir,

    #[error("Config file {} does not exist. Run `stagerev config set-key <API_KEY>` first.", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`provider` is empty in {} but `providers` is set", path.display())]
    MissingDefaultProvider { path: PathBuf },

    #[error("Provider '{name}' not found under `providers` in {}", path.display())]
    UnknownProvider { name: String, path: PathBuf },

    #[error("`api_key` for provider '{name}' is empty in {}", path.display())]
    EmptyProviderKey { name: String, path: PathBuf },

    #[error("`api_key` is empty in {}", path.display())]
    EmptyApiKey { path: PathBuf },

    #[error("No API key configured for provider '{0}'")]
    UnresolvedApiKey(String),

    #[error("API key must not be blank")]
    BlankApiKey,

    #[error(
        "No multi-provider config found. Run `stagerev config set-key <API_KEY> --provider {0}` first."
    )]
    NoProviders(String),

    #[error(
        "Provider '{0}' is not configured. Run `stagerev config set-key <API_KEY> --provider {0}` first."
    )]
    ProviderNotConfigured(String),
}

/// Errors from invoking the `git` executable.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git is not installed or not on PATH")]
    NotInstalled,

    #[error("Failed to spawn git: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("The current directory is not a git repository: {0}")]
    NotARepository(String),

    #[error("`git {args}` failed: {output}")]
    CommandFailed { args: String, output: String },

    #[error("File {0} has no staged diff output")]
    EmptyDiff(String),
}

/// Errors from the chat-completion backend.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Diff is empty, nothing to review")]
    EmptyDiff,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Chat completion request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Chat completion failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Chat completion response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("LLM response contained no choices")]
    NoChoices,

    #[error("LLM response content was blank")]
    BlankContent,
}

/// A failed review run. Always names the operation, and the file when one is involved.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Failed to list staged files: {0}")]
    ListFiles(#[source] GitError),

    #[error("Failed to get diff for {path}: {source}")]
    Diff {
        path: String,
        #[source]
        source: GitError,
    },

    #[error("Failed to review {path}: {source}")]
    Chat {
        path: String,
        #[source]
        source: ChatError,
    },
}
