//! Combat configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat tuning from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), tick_rate = config.tick_rate, "loaded combat config");
        Ok(config)
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse combat config TOML: {}", e))?;
        if config.tick_rate == 0 {
            anyhow::bail!("tick_rate must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            tick_rate = 30

            [player]
            attack_damage = 25.0
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.player.attack_damage, 25.0);
        assert_eq!(config.player.max_health, 100.0);
        assert_eq!(config.director, CombatConfig::default().director);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        assert!(ConfigLoader::parse("tick_rate = 0").is_err());
    }
}
