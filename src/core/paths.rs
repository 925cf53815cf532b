use std::path::PathBuf;
use std::sync::OnceLock;

// Cache the paths to avoid repeated environment lookups
static TAXOMAP_HOME: OnceLock<PathBuf> = OnceLock::new();
static TAXOMAP_CONFIG: OnceLock<PathBuf> = OnceLock::new();

/// Get the Taxomap home directory
/// Checks TAXOMAP_HOME environment variable, falls back to ${HOME}/.taxomap
pub fn taxomap_home() -> PathBuf {
    TAXOMAP_HOME
        .get_or_init(|| {
            if let Ok(path) = std::env::var("TAXOMAP_HOME") {
                PathBuf::from(path)
            } else {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".taxomap")
            }
        })
        .clone()
}

/// Get the configuration file path
/// Checks TAXOMAP_CONFIG environment variable, falls back to TAXOMAP_HOME/config.toml
pub fn config_path() -> PathBuf {
    TAXOMAP_CONFIG
        .get_or_init(|| {
            if let Ok(path) = std::env::var("TAXOMAP_CONFIG") {
                PathBuf::from(path)
            } else {
                taxomap_home().join("config.toml")
            }
        })
        .clone()
}

/// Check if running with a custom home or config location
pub fn is_custom_location() -> bool {
    std::env::var("TAXOMAP_CONFIG").is_ok() || std::env::var("TAXOMAP_HOME").is_ok()
}

/// Get a human-readable description of the current path configuration
pub fn describe_paths() -> String {
    format!(
        "Taxomap Paths:\n  \
        Home: {}\n  \
        Config: {}\n  \
        Custom: {}",
        taxomap_home().display(),
        config_path().display(),
        if is_custom_location() { "Yes" } else { "No (using defaults)" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_lives_under_home_by_default() {
        // OnceLock caches the first lookup, so only check the shape
        if std::env::var("TAXOMAP_CONFIG").is_err() {
            assert!(config_path().ends_with("config.toml"));
            assert!(config_path().starts_with(taxomap_home()));
        }
    }

    #[test]
    fn test_describe_paths_mentions_config() {
        let description = describe_paths();
        assert!(description.contains("Config:"));
        assert!(description.contains(&config_path().display().to_string()));
    }
}
