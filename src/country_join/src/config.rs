//! Pipeline configuration: parsing, normalization, and loading.
//!
//! The file is TOML with three optional sections:
//!
//! ```toml
//! [registry]
//! url = "https://www.geodatasource.com/..."
//! source = "static"          # "static" | "http"
//! cache_ttl_secs = 86400     # omitted or 0 => keep for the process lifetime
//! fetch_timeout_secs = 10
//! static_table = "codes.toml"
//!
//! [join]
//! policy = "inner"           # "inner" | "left"
//!
//! [articles]
//! keyword = "immigra"
//! latest_indicator_year = 2023
//! ```
//!
//! Raw sections are deserialized as written, then [`normalize`] trims and
//! lowercases the enum-like strings and validates the rest into [`Settings`].
//! [`REGISTRY_URL_ENV`] overrides the registry URL.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use code_registry::{CodeRegistry, SourceKind, SourceOptions};
use serde::Deserialize;
use shared_utils::env::env_override;
use tracing::debug;

use crate::{articles::DEFAULT_KEYWORD, join::JoinPolicy, views::LATEST_INDICATOR_YEAR};

/// Environment variable overriding `registry.url`.
pub const REGISTRY_URL_ENV: &str = "COUNTRY_REGISTRY_URL";

/// Reference page listing legacy and ISO codes side by side.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://www.geodatasource.com/resources/tutorials/international-country-code-fips-versus-iso-3166/";

const DEFAULT_TTL_SECS: u64 = 86_400;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The file as written.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// `[registry]`
    #[serde(default)]
    pub registry: RegistryCfg,
    /// `[join]`
    #[serde(default)]
    pub join: JoinCfg,
    /// `[articles]`
    #[serde(default)]
    pub articles: ArticlesCfg,
}

/// `[registry]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryCfg {
    /// Source URL, also the cache key.
    pub url: Option<String>,
    /// `static` or `http`.
    pub source: Option<String>,
    /// Cache lifetime in seconds; 0 keeps entries forever.
    pub cache_ttl_secs: Option<u64>,
    /// HTTP timeout in seconds.
    pub fetch_timeout_secs: Option<u64>,
    /// Custom static table path.
    pub static_table: Option<PathBuf>,
}

/// `[join]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinCfg {
    /// `inner` or `left`.
    pub policy: Option<String>,
}

/// `[articles]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticlesCfg {
    /// Keyword selecting relevant articles.
    pub keyword: Option<String>,
    /// Last year with published indicators.
    pub latest_indicator_year: Option<i32>,
}

/// Validated settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Registry source URL.
    pub registry_url: String,
    /// Mapping source implementation.
    pub source: SourceKind,
    /// Cache lifetime; `None` keeps entries forever.
    pub cache_ttl: Option<Duration>,
    /// HTTP timeout.
    pub fetch_timeout: Duration,
    /// Custom static table.
    pub static_table: Option<PathBuf>,
    /// Join policy.
    pub join_policy: JoinPolicy,
    /// Article keyword (lowercase).
    pub keyword: String,
    /// Last year with published indicators.
    pub latest_indicator_year: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            source: SourceKind::default(),
            cache_ttl: Some(Duration::from_secs(DEFAULT_TTL_SECS)),
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            static_table: None,
            join_policy: JoinPolicy::default(),
            keyword: DEFAULT_KEYWORD.to_string(),
            latest_indicator_year: LATEST_INDICATOR_YEAR,
        }
    }
}

impl Settings {
    /// Options for [`code_registry::build_source`].
    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            fetch_timeout: self.fetch_timeout,
            static_table: self.static_table.clone(),
        }
    }

    /// Builds the code registry these settings describe.
    pub fn build_registry(&self) -> anyhow::Result<CodeRegistry> {
        CodeRegistry::from_kind(self.source, &self.source_options(), self.cache_ttl)
            .context("building code registry")
    }

    /// Applies environment overrides.
    pub fn apply_env(&mut self) {
        if let Some(url) = env_override(REGISTRY_URL_ENV) {
            debug!(%url, "registry url overridden from {REGISTRY_URL_ENV}");
            self.registry_url = url;
        }
    }
}

/// Validates a raw file into [`Settings`].
///
/// Errors:
/// - unknown `source` or `policy`
/// - empty `url` or `keyword` after trimming
/// - `fetch_timeout_secs = 0`
pub fn normalize(cfg: ConfigFile) -> anyhow::Result<Settings> {
    let registry_url = match cfg.registry.url {
        Some(url) => {
            let url = url.trim().to_string();
            if url.is_empty() {
                bail!("registry.url cannot be empty after trimming");
            }
            url
        }
        None => DEFAULT_REGISTRY_URL.to_string(),
    };

    let source = match cfg.registry.source.as_deref().map(|s| s.trim().to_lowercase()) {
        None => SourceKind::default(),
        Some(s) => match s.as_str() {
            "static" => SourceKind::Static,
            "http" => SourceKind::Http,
            other => bail!("unknown registry.source {other:?} (expected \"static\" or \"http\")"),
        },
    };

    let cache_ttl = match cfg.registry.cache_ttl_secs.unwrap_or(DEFAULT_TTL_SECS) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let fetch_timeout = match cfg.registry.fetch_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
        0 => bail!("registry.fetch_timeout_secs must be greater than zero"),
        secs => Duration::from_secs(secs),
    };

    let join_policy = match cfg.join.policy.as_deref().map(|s| s.trim().to_lowercase()) {
        None => JoinPolicy::default(),
        Some(s) => match s.as_str() {
            "inner" => JoinPolicy::Inner,
            "left" => JoinPolicy::Left,
            other => bail!("unknown join.policy {other:?} (expected \"inner\" or \"left\")"),
        },
    };

    let keyword = cfg
        .articles
        .keyword
        .unwrap_or_else(|| DEFAULT_KEYWORD.to_string())
        .trim()
        .to_lowercase();
    if keyword.is_empty() {
        bail!("articles.keyword cannot be empty after trimming");
    }

    Ok(Settings {
        registry_url,
        source,
        cache_ttl,
        fetch_timeout,
        static_table: cfg.registry.static_table,
        join_policy,
        keyword,
        latest_indicator_year: cfg
            .articles
            .latest_indicator_year
            .unwrap_or(LATEST_INDICATOR_YEAR),
    })
}

/// Parse + normalize from a TOML string. Environment overrides are not applied.
pub fn load_settings_str(s: &str) -> anyhow::Result<Settings> {
    let cfg: ConfigFile = toml::from_str(s).context("parsing pipeline config TOML")?;
    normalize(cfg)
}

/// Parse + normalize from a file path, then apply environment overrides.
pub fn load_settings_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Settings> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let mut settings =
        load_settings_str(&s).with_context(|| format!("loading config file {}", path.display()))?;
    settings.apply_env();
    Ok(settings)
}
