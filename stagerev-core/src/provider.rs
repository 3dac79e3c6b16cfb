//! Provider resolution: which endpoint, key and model a session talks to.
//!
//! Known backends are described by [`KNOWN_PROVIDERS`], a lookup table keyed by
//! normalized provider name. Adding a backend means adding a row; nothing else
//! branches on provider names.

use crate::config::Config;
use crate::error::ConfigError;

/// Model used when neither the config nor the provider table names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Base URL used when a provider leaves `base_url` unset.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Defaults applied to a recognized provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDefaults {
    /// Endpoint to fill in; `None` keeps the backend's standard default.
    pub base_url: Option<&'static str>,
    pub model: &'static str,
}

/// `(names, defaults)` rows. Names are already normalized.
pub const KNOWN_PROVIDERS: &[(&[&str], ProviderDefaults)] = &[
    (
        &["deepseek"],
        ProviderDefaults {
            base_url: Some("https://api.deepseek.com"),
            model: "deepseek-coder",
        },
    ),
    (
        &["qwen", "tongyi", "ali", "aliyun"],
        ProviderDefaults {
            base_url: Some("https://dashscope.aliyuncs.com/compatible-mode/v1"),
            model: "qwen-turbo",
        },
    ),
    (
        &["openai"],
        ProviderDefaults {
            base_url: None,
            model: DEFAULT_MODEL,
        },
    ),
];

/// Trims and lowercases a provider name for table lookup.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Looks up the defaults for `name`, case-insensitively.
pub fn known_defaults(name: &str) -> Option<&'static ProviderDefaults> {
    let normalized = normalize_name(name);
    KNOWN_PROVIDERS
        .iter()
        .find(|(names, _)| names.contains(&normalized.as_str()))
        .map(|(_, defaults)| defaults)
}

/// Fully resolved connection settings for the chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    /// Normalized provider name; empty in simple (single-key) mode.
    pub name: String,
    pub api_key: String,
    /// `None` means "use [`DEFAULT_BASE_URL`]".
    pub base_url: Option<String>,
    pub model: String,
}

impl ResolvedProvider {
    /// The endpoint root requests are sent to.
    pub fn endpoint(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

/// Resolves the loaded config into connection settings.
///
/// Recognized providers get their table defaults for an unset `base_url` or
/// `model`. The empty name and unknown names keep `base_url` exactly as
/// configured; an unset model falls back to [`DEFAULT_MODEL`].
///
/// # Errors
///
/// Returns [`ConfigError::UnresolvedApiKey`] when the flat API key is blank.
pub fn resolve(config: &Config) -> Result<ResolvedProvider, ConfigError> {
    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        return Err(ConfigError::UnresolvedApiKey(config.provider.clone()));
    }

    let name = normalize_name(&config.provider);
    let mut base_url = non_blank(config.base_url.as_deref());
    let mut model = non_blank(config.model.as_deref());

    match known_defaults(&name) {
        Some(defaults) => {
            if base_url.is_none() {
                base_url = defaults.base_url.map(str::to_owned);
            }
            model.get_or_insert_with(|| defaults.model.to_owned());
        }
        None => {
            model.get_or_insert_with(|| DEFAULT_MODEL.to_owned());
        }
    }

    Ok(ResolvedProvider {
        name,
        api_key: api_key.to_owned(),
        base_url,
        model: model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, base_url: Option<&str>, model: Option<&str>) -> Config {
        Config {
            provider: provider.to_owned(),
            api_key: "sk-test".to_owned(),
            base_url: base_url.map(str::to_owned),
            model: model.map(str::to_owned),
            theme: None,
        }
    }

    #[test]
    fn deepseek_fills_both_defaults() {
        let resolved = resolve(&config("DeepSeek", None, None)).unwrap();
        assert_eq!(resolved.name, "deepseek");
        assert_eq!(resolved.base_url.as_deref(), Some("https://api.deepseek.com"));
        assert_eq!(resolved.model, "deepseek-coder");
    }

    #[test]
    fn qwen_aliases_share_defaults() {
        for name in ["qwen", "tongyi", "ali", " Aliyun "] {
            let resolved = resolve(&config(name, None, None)).unwrap();
            assert_eq!(
                resolved.base_url.as_deref(),
                Some("https://dashscope.aliyuncs.com/compatible-mode/v1")
            );
            assert_eq!(resolved.model, "qwen-turbo");
        }
    }

    #[test]
    fn configured_values_win_over_defaults() {
        let resolved =
            resolve(&config("deepseek", Some("https://proxy.local"), Some("deepseek-chat"))).unwrap();
        assert_eq!(resolved.base_url.as_deref(), Some("https://proxy.local"));
        assert_eq!(resolved.model, "deepseek-chat");
    }

    #[test]
    fn openai_and_simple_mode_keep_standard_endpoint() {
        for name in ["openai", ""] {
            let resolved = resolve(&config(name, None, None)).unwrap();
            assert_eq!(resolved.base_url, None);
            assert_eq!(resolved.endpoint(), DEFAULT_BASE_URL);
            assert_eq!(resolved.model, DEFAULT_MODEL);
        }
    }

    #[test]
    fn unknown_provider_keeps_base_url_and_defaults_model() {
        let resolved = resolve(&config("ollama", Some("http://localhost:11434/v1"), None)).unwrap();
        assert_eq!(resolved.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(resolved.model, DEFAULT_MODEL);

        let bare = resolve(&config("ollama", None, Some(""))).unwrap();
        assert_eq!(bare.base_url, None);
        assert_eq!(bare.model, DEFAULT_MODEL);
    }

    #[test]
    fn blank_api_key_fails() {
        let mut cfg = config("deepseek", None, None);
        cfg.api_key = "   ".to_owned();
        assert!(matches!(resolve(&cfg), Err(ConfigError::UnresolvedApiKey(_))));
    }

    #[test]
    fn resolution_is_idempotent() {
        let first = resolve(&config("qwen", None, None)).unwrap();
        let again = resolve(&Config {
            provider: first.name.clone(),
            api_key: first.api_key.clone(),
            base_url: first.base_url.clone(),
            model: Some(first.model.clone()),
            theme: None,
        })
        .unwrap();
        assert_eq!(first, again);
        assert_eq!(resolve(&config("qwen", None, None)).unwrap(), first);
    }
}
