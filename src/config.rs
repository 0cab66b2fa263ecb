use serde::Deserialize;

use crate::version::channel::WILDCARD_CHANNEL;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default catalog cache time-to-live in milliseconds (1 hour)
pub const DEFAULT_CACHE_TTL_MS: u64 = 60 * 60 * 1000;

// =============================================================================
// Protocol defaults
// =============================================================================

/// Default filetype served to generic update checks
pub const DEFAULT_FILETYPE: &str = "zip";

/// Server configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Name of the release-storage backend ("github" or "memory")
    pub backend: String,
    pub cache: CacheConfig,
    pub update: UpdateConfig,
    pub github: GitHubConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backend: "github".to_string(),
            cache: CacheConfig::default(),
            update: UpdateConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}

/// Catalog cache configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Snapshot time-to-live in milliseconds
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }
}

/// Update-check behavior configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateConfig {
    /// Channel applied when a request names none; the wildcard considers
    /// every track
    pub default_channel: String,
    /// Filetype served to generic checks that name none
    pub default_filetype: String,
    /// Whether to fetch the release list during initialization
    pub pre_fetch: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            default_channel: WILDCARD_CHANNEL.to_string(),
            default_filetype: DEFAULT_FILETYPE.to_string(),
            pre_fetch: true,
        }
    }
}

/// GitHub backend configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitHubConfig {
    /// Repository holding the releases, as "owner/name"
    pub repository: String,
    /// API token for private repositories and higher rate limits
    pub token: Option<String>,
    /// API base URL, overridable for tests and GitHub Enterprise
    pub base_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repository: String::new(),
            token: None,
            base_url: crate::backend::github::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<ServerConfig>(json!({
            "cache": {
                "ttlMs": 1000
            }
        }))
        .unwrap();

        assert_eq!(result.cache.ttl_ms, 1000);
        assert_eq!(result.backend, "github");
        assert_eq!(result.update, UpdateConfig::default());
    }

    #[test]
    fn server_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<ServerConfig>(json!({
            "backend": "memory",
            "cache": { "ttlMs": 5000 },
            "update": {
                "defaultChannel": "stable",
                "defaultFiletype": "dmg",
                "preFetch": false
            },
            "github": {
                "repository": "acme/app",
                "token": "ghp_secret",
                "baseUrl": "https://github.example.com/api/v3"
            }
        }))
        .unwrap();

        assert_eq!(
            result,
            ServerConfig {
                backend: "memory".to_string(),
                cache: CacheConfig { ttl_ms: 5000 },
                update: UpdateConfig {
                    default_channel: "stable".to_string(),
                    default_filetype: "dmg".to_string(),
                    pre_fetch: false,
                },
                github: GitHubConfig {
                    repository: "acme/app".to_string(),
                    token: Some("ghp_secret".to_string()),
                    base_url: "https://github.example.com/api/v3".to_string(),
                }
            }
        );
    }
}
