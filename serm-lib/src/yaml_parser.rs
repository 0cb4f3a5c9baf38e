use crate::config::Config;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "SERM_CONFIG";

/// Parse a YAML file into the service configuration
pub async fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    parse_config_string(&content)
}

/// Parse a YAML string into the service configuration
pub fn parse_config_string(content: &str) -> Result<Config> {
    // An empty document deserializes to unit, not to a mapping
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config =
        serde_yaml::from_str(content).with_context(|| "Failed to parse YAML config")?;

    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from an optional file, then apply environment overrides.
///
/// The file is taken from `path` or, when absent, from `SERM_CONFIG`. Without
/// either, built-in defaults are used.
pub async fn load_config(path: Option<&Path>) -> Result<Config> {
    let from_env = std::env::var(CONFIG_ENV).ok();
    let path = path.map(Path::to_path_buf).or_else(|| from_env.map(Into::into));

    let mut config = match path {
        Some(path) => parse_config_file(&path).await?,
        None => Config::default(),
    };

    let vars: HashMap<String, String> = std::env::vars().collect();
    apply_env_overrides(&mut config, &vars);
    validate_config(&config)?;

    Ok(config)
}

/// Apply DATABASE_URL, XMLPROXY_URL, XMLPROXY_USER, XMLPROXY_KEY and SERM_BIND
pub fn apply_env_overrides(config: &mut Config, vars: &HashMap<String, String>) {
    let non_empty = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

    if let Some(url) = non_empty("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(url) = non_empty("XMLPROXY_URL") {
        config.provider.url = url;
    }
    if let Some(user) = non_empty("XMLPROXY_USER") {
        config.provider.user = Some(user);
    }
    if let Some(key) = non_empty("XMLPROXY_KEY") {
        config.provider.key = Some(key);
    }
    if let Some(bind) = non_empty("SERM_BIND") {
        config.server.bind = bind;
    }
}

/// Reject settings the service cannot run with
pub fn validate_config(config: &Config) -> Result<()> {
    if config.database.pool_size == 0 {
        anyhow::bail!("database.pool_size must be at least 1");
    }
    if config.provider.timeout_secs == 0 {
        anyhow::bail!("provider.timeout_secs must be at least 1");
    }
    if !config.provider.url.starts_with("http://") && !config.provider.url.starts_with("https://")
    {
        anyhow::bail!(
            "provider.url '{}' must be an http or https URL",
            config.provider.url
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BIND, DEFAULT_DATABASE_URL};

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
database:
  url: postgresql://serm:secret@db:5432/serm
  pool_size: 4
provider:
  url: https://xmlproxy.ru/search/xml
  user: monitor
  key: abc123
  timeout_secs: 10
server:
  bind: 127.0.0.1:9000
"#;
        let config = parse_config_string(yaml).unwrap();
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.provider.user.as_deref(), Some("monitor"));
        assert_eq!(config.provider.timeout().as_secs(), 10);
        assert_eq!(config.server.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config_string("provider:\n  timeout_secs: 5\n").unwrap();
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.provider.timeout_secs, 5);

        assert_eq!(parse_config_string("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_config_string("provider:\n  timeout_secs: 0\n").is_err());
        assert!(parse_config_string("provider:\n  url: ftp://example.com\n").is_err());
        assert!(parse_config_string("database: [1, 2]\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let vars: HashMap<String, String> = [
            ("DATABASE_URL", "postgresql://other/db"),
            ("XMLPROXY_URL", "http://proxy.local/search?lr=213"),
            ("XMLPROXY_KEY", "k"),
            ("SERM_BIND", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        apply_env_overrides(&mut config, &vars);
        assert_eq!(config.database.url, "postgresql://other/db");
        assert_eq!(config.provider.url, "http://proxy.local/search?lr=213");
        assert_eq!(config.provider.key.as_deref(), Some("k"));
        assert_eq!(config.provider.user, None);
        assert_eq!(config.server.bind, DEFAULT_BIND);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let err = parse_config_file("/nonexistent/serm.yaml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
