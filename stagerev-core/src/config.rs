//! YAML configuration at `~/.stagerev.yaml`.
//!
//! Two shapes are accepted:
//!
//! ```yaml
//! # simple mode: one implicit provider
//! api_key: "sk-..."
//! ```
//!
//! ```yaml
//! # multi-provider mode
//! provider: deepseek
//! providers:
//!   openai:
//!     api_key: "sk-..."
//!     model: gpt-4o
//!   deepseek:
//!     api_key: "sk-..."
//!     base_url: https://api.deepseek.com
//!     model: deepseek-coder
//! theme: catppuccin-mocha
//! ```
//!
//! [`ConfigDocument`] is the typed on-disk document. Keys it does not know are
//! kept in `extra` maps so a rewrite by `config set-key` never drops them.
//! [`Config`] is the validated view handed to the rest of the program.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::provider::known_defaults;

/// File name of the config, relative to the user's home directory.
pub const CONFIG_FILE_NAME: &str = ".stagerev.yaml";

/// One named backend under `providers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// The config file exactly as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Name of the default provider in multi-provider mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub providers: IndexMap<String, ProviderProfile>,
    /// Simple-mode key, only consulted when `providers` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// UI colour theme name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Validated configuration with the active provider flattened to top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default provider name; empty in simple mode.
    pub provider: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub theme: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Returns `~/.stagerev.yaml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] when the home directory is unknown.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

impl ConfigDocument {
    /// Parses YAML text. Blank input is an empty document.
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads and parses the document at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] if the file is missing, `Read` or `Parse` otherwise.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(&raw, path)
    }

    /// Like [`read`](Self::read), but a missing file yields an empty document.
    pub fn read_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::read(path) {
            Err(ConfigError::NotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Serializes and atomically replaces the file at `path`.
    ///
    /// The document is written to a temp file in the same directory, restricted
    /// to the owning user, then renamed over `path`.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self).map_err(ConfigError::Serialize)?;
        write_atomic(path, yaml.as_bytes()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "wrote config");
        Ok(())
    }

    /// Stores `api_key` for `provider`, or as the simple-mode key when `provider` is `None`.
    ///
    /// For a provider entry that has no `base_url` yet, the provider table's
    /// defaults are filled in (the model only if unset). The first provider
    /// given a key becomes the default provider.
    pub fn set_api_key(&mut self, api_key: &str, provider: Option<&str>) -> Result<(), ConfigError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::BlankApiKey);
        }

        let Some(name) = provider.map(str::trim).filter(|p| !p.is_empty()) else {
            self.api_key = Some(api_key.to_owned());
            return Ok(());
        };

        let entry = self.providers.entry(name.to_owned()).or_default();
        entry.api_key = Some(api_key.to_owned());
        if non_blank(&entry.base_url).is_none() {
            if let Some(defaults) = known_defaults(name) {
                if let Some(url) = defaults.base_url {
                    entry.base_url = Some(url.to_owned());
                }
                if non_blank(&entry.model).is_none() {
                    entry.model = Some(defaults.model.to_owned());
                }
            }
        }

        if non_blank(&self.provider).is_none() {
            self.provider = Some(name.to_owned());
        }
        Ok(())
    }

    /// Makes `name` the default provider. It must already exist under `providers`.
    pub fn set_default_provider(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::NoProviders(name.to_owned()));
        }
        if !self.providers.contains_key(name) {
            return Err(ConfigError::ProviderNotConfigured(name.to_owned()));
        }
        self.provider = Some(name.to_owned());
        Ok(())
    }

    /// Validates the document and flattens the active provider.
    ///
    /// `path` is only used in error messages.
    pub fn validate(&self, path: &Path) -> Result<Config, ConfigError> {
        let theme = non_blank(&self.theme).map(str::to_owned);

        if !self.providers.is_empty() {
            let name = non_blank(&self.provider).ok_or_else(|| ConfigError::MissingDefaultProvider {
                path: path.to_path_buf(),
            })?;
            let profile = self
                .providers
                .get(name)
                .ok_or_else(|| ConfigError::UnknownProvider {
                    name: name.to_owned(),
                    path: path.to_path_buf(),
                })?;
            let api_key = non_blank(&profile.api_key).ok_or_else(|| ConfigError::EmptyProviderKey {
                name: name.to_owned(),
                path: path.to_path_buf(),
            })?;
            return Ok(Config {
                provider: name.to_owned(),
                api_key: api_key.to_owned(),
                base_url: non_blank(&profile.base_url).map(str::to_owned),
                model: non_blank(&profile.model).map(str::to_owned),
                theme,
            });
        }

        let api_key = non_blank(&self.api_key).ok_or_else(|| ConfigError::EmptyApiKey {
            path: path.to_path_buf(),
        })?;
        Ok(Config {
            provider: non_blank(&self.provider).unwrap_or_default().to_owned(),
            api_key: api_key.to_owned(),
            base_url: non_blank(&self.base_url).map(str::to_owned),
            model: non_blank(&self.model).map(str::to_owned),
            theme,
        })
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Loads and validates `~/.stagerev.yaml`.
pub fn load() -> Result<Config, ConfigError> {
    load_from(&config_path()?)
}

/// Loads and validates the config at `path`.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let config = ConfigDocument::read(path)?.validate(path)?;
    info!(provider = %config.provider, "loaded config");
    Ok(config)
}

/// `config set-key`: load (or start empty), patch, rewrite. Returns the written document.
pub fn set_api_key(
    path: &Path,
    api_key: &str,
    provider: Option<&str>,
) -> Result<ConfigDocument, ConfigError> {
    let mut doc = ConfigDocument::read_or_default(path)?;
    doc.set_api_key(api_key, provider)?;
    doc.write(path)?;
    Ok(doc)
}

/// `config set-provider`: the file and the named provider must already exist.
/// Nothing is written when a precondition fails.
pub fn set_default_provider(path: &Path, name: &str) -> Result<ConfigDocument, ConfigError> {
    let mut doc = ConfigDocument::read(path)?;
    doc.set_default_provider(name)?;
    doc.write(path)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::resolve;

    fn write_config(dir: &tempfile::TempDir, yaml: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("config set-key"));
    }

    #[test]
    fn unparsable_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "providers: [unclosed");
        assert!(matches!(load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn simple_mode_requires_flat_key() {
        let dir = tempfile::tempdir().unwrap();
        let ok = write_config(&dir, "api_key: sk-flat\nmodel: gpt-4o\n");
        let cfg = load_from(&ok).unwrap();
        assert_eq!(cfg.provider, "");
        assert_eq!(cfg.api_key, "sk-flat");
        assert_eq!(cfg.model.as_deref(), Some("gpt-4o"));

        for yaml in ["api_key: \"\"\n", "model: gpt-4o\n", "", "providers: {}\napi_key: \"  \"\n"] {
            let path = write_config(&dir, yaml);
            assert!(
                matches!(load_from(&path), Err(ConfigError::EmptyApiKey { .. })),
                "expected EmptyApiKey for {yaml:?}"
            );
        }
    }

    #[test]
    fn multi_provider_flattens_active_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "provider: deepseek\nproviders:\n  openai:\n    api_key: sk-o\n  deepseek:\n    api_key: sk-d\n    base_url: https://api.deepseek.com\n    model: deepseek-chat\n",
        );
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.provider, "deepseek");
        assert_eq!(cfg.api_key, "sk-d");
        assert_eq!(cfg.base_url.as_deref(), Some("https://api.deepseek.com"));
        assert_eq!(cfg.model.as_deref(), Some("deepseek-chat"));
    }

    #[test]
    fn multi_provider_validation_failures() {
        let dir = tempfile::tempdir().unwrap();

        let path = write_config(&dir, "providers:\n  openai:\n    api_key: sk-o\n");
        assert!(matches!(load_from(&path), Err(ConfigError::MissingDefaultProvider { .. })));

        let path = write_config(&dir, "provider: \"\"\nproviders:\n  openai:\n    api_key: sk-o\n");
        assert!(matches!(load_from(&path), Err(ConfigError::MissingDefaultProvider { .. })));

        let path = write_config(&dir, "provider: qwen\nproviders:\n  openai:\n    api_key: sk-o\n");
        assert!(matches!(
            load_from(&path),
            Err(ConfigError::UnknownProvider { ref name, .. }) if name == "qwen"
        ));

        let path = write_config(
            &dir,
            "provider: openai\napi_key: sk-flat\nproviders:\n  openai:\n    model: gpt-4o\n",
        );
        assert!(matches!(
            load_from(&path),
            Err(ConfigError::EmptyProviderKey { ref name, .. }) if name == "openai"
        ));
    }

    #[test]
    fn set_key_deepseek_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        set_api_key(&path, "ABC123", Some("deepseek")).unwrap();

        let doc = ConfigDocument::read(&path).unwrap();
        let entry = &doc.providers["deepseek"];
        assert_eq!(entry.api_key.as_deref(), Some("ABC123"));
        assert_eq!(entry.base_url.as_deref(), Some("https://api.deepseek.com"));
        assert_eq!(entry.model.as_deref(), Some("deepseek-coder"));
        assert_eq!(doc.provider.as_deref(), Some("deepseek"));
    }

    #[test]
    fn set_key_round_trips_through_load_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        set_api_key(&path, "sk-qwen", Some("qwen")).unwrap();
        let resolved = resolve(&load_from(&path).unwrap()).unwrap();
        assert_eq!(resolved.api_key, "sk-qwen");
        assert_eq!(
            resolved.base_url.as_deref(),
            Some("https://dashscope.aliyuncs.com/compatible-mode/v1")
        );
        assert_eq!(resolved.model, "qwen-turbo");
    }

    #[test]
    fn set_key_keeps_existing_default_and_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "provider: openai\nproviders:\n  openai:\n    api_key: sk-o\n  deepseek:\n    api_key: old\n    base_url: https://proxy.local\n",
        );

        let doc = set_api_key(&path, "new", Some("deepseek")).unwrap();
        assert_eq!(doc.provider.as_deref(), Some("openai"));
        let entry = &doc.providers["deepseek"];
        assert_eq!(entry.api_key.as_deref(), Some("new"));
        assert_eq!(entry.base_url.as_deref(), Some("https://proxy.local"));
        assert_eq!(entry.model, None);
    }

    #[test]
    fn set_key_openai_fills_model_only() {
        let mut doc = ConfigDocument::default();
        doc.set_api_key("sk-o", Some("openai")).unwrap();
        let entry = &doc.providers["openai"];
        assert_eq!(entry.base_url, None);
        assert_eq!(entry.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn set_key_unknown_provider_sets_key_only() {
        let mut doc = ConfigDocument::default();
        doc.set_api_key("sk-x", Some("ollama")).unwrap();
        assert_eq!(
            doc.providers["ollama"],
            ProviderProfile {
                api_key: Some("sk-x".to_owned()),
                ..ProviderProfile::default()
            }
        );
    }

    #[test]
    fn set_key_without_provider_sets_flat_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let doc = set_api_key(&path, "sk-flat", None).unwrap();
        assert_eq!(doc.api_key.as_deref(), Some("sk-flat"));
        assert!(doc.providers.is_empty());
        assert_eq!(load_from(&path).unwrap().api_key, "sk-flat");
    }

    #[test]
    fn set_key_rejects_blank_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(matches!(set_api_key(&path, "  ", None), Err(ConfigError::BlankApiKey)));
        assert!(!path.exists());
    }

    #[test]
    fn set_key_preserves_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "telemetry: false\ntheme: dark\nproviders:\n  deepseek:\n    api_key: old\n    org: acme\nprovider: deepseek\n",
        );

        set_api_key(&path, "new", Some("deepseek")).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(value["telemetry"], serde_yaml::Value::Bool(false));
        assert_eq!(value["theme"].as_str(), Some("dark"));
        assert_eq!(value["providers"]["deepseek"]["org"].as_str(), Some("acme"));
        assert_eq!(value["providers"]["deepseek"]["api_key"].as_str(), Some("new"));
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        set_api_key(&path, "sk", Some("openai")).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn set_provider_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(matches!(
            set_default_provider(&path, "foo"),
            Err(ConfigError::NotFound { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn set_provider_without_providers_map_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let original = "api_key: sk-flat\n";
        let path = write_config(&dir, original);

        let err = set_default_provider(&path, "foo").unwrap_err();
        assert!(matches!(err, ConfigError::NoProviders(ref name) if name == "foo"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn set_provider_unknown_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "provider: openai\nproviders:\n  openai:\n    api_key: sk-o\n");
        assert!(matches!(
            set_default_provider(&path, "qwen"),
            Err(ConfigError::ProviderNotConfigured(_))
        ));
    }

    #[test]
    fn set_provider_switches_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        set_api_key(&path, "sk-o", Some("openai")).unwrap();
        set_api_key(&path, "sk-d", Some("deepseek")).unwrap();
        assert_eq!(load_from(&path).unwrap().provider, "openai");

        set_default_provider(&path, "deepseek").unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.provider, "deepseek");
        assert_eq!(cfg.api_key, "sk-d");
    }

    #[test]
    fn null_providers_is_empty_map() {
        let doc = ConfigDocument::parse("providers: ~\napi_key: sk\n", Path::new("x")).unwrap();
        assert!(doc.providers.is_empty());
    }
}
