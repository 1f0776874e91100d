//! Configuration management with validation and defaults.
//!
//! Defaults match the production bingo hall rules: four bet denominations,
//! a 120-second join countdown, a 5-second call interval, and a 2% house
//! rake. Everything can be overridden from a TOML file, with CLI flags on
//! top in the server binary.

use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CartelaConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Session engine rules.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Accepted bet amounts. Any other stake is rejected at creation/join.
    pub denominations: Vec<u64>,
    /// Wallet balance granted on registration.
    pub starting_balance: u64,
    /// Join-window countdown before a session auto-starts.
    pub countdown_secs: i64,
    /// Auto-start requires at least this many players once the countdown
    /// elapses.
    pub auto_start_min_players: usize,
    /// Privileged start requires at least this many players.
    pub admin_start_min_players: usize,
    /// Minimum spacing between consecutive draws of one session.
    pub call_interval_secs: i64,
    /// Invalid-claim strikes that get a user removed.
    pub kick_threshold: u32,
    /// House rake in basis points, deducted from the pot to form the prize.
    pub rake_bps: u32,
    /// Upper bound on any single session operation, including the pacing
    /// wait; exceeded operations fail transiently instead of hanging.
    pub op_timeout_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            denominations: vec![10, 50, 100, 200],
            starting_balance: 10,
            countdown_secs: 120,
            auto_start_min_players: 3,
            admin_start_min_players: 2,
            call_interval_secs: 5,
            kick_threshold: 1,
            rake_bps: 200,
            op_timeout_ms: 3_000,
        }
    }
}

impl GameConfig {
    pub fn countdown(&self) -> Duration {
        Duration::seconds(self.countdown_secs)
    }

    pub fn call_interval(&self) -> Duration {
        Duration::seconds(self.call_interval_secs)
    }

    pub fn op_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.op_timeout_ms)
    }

    /// Prize paid out of a pot after the rake.
    pub fn prize_for(&self, pot: u64) -> u64 {
        let keep_bps = u128::from(10_000u32.saturating_sub(self.rake_bps));
        (u128::from(pot) * keep_bps / 10_000) as u64
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Configuration and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(String),
}

impl CartelaConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;

        if game.denominations.is_empty() {
            return Err(ConfigError::Invalid {
                field: "game.denominations",
                reason: "at least one denomination is required".to_string(),
            });
        }
        if game.denominations.iter().any(|&d| d == 0) {
            return Err(ConfigError::Invalid {
                field: "game.denominations",
                reason: "denominations must be positive".to_string(),
            });
        }
        if game.countdown_secs <= 0 {
            return Err(ConfigError::Invalid {
                field: "game.countdown_secs",
                reason: "countdown must be positive".to_string(),
            });
        }
        if game.call_interval_secs < 0 {
            return Err(ConfigError::Invalid {
                field: "game.call_interval_secs",
                reason: "call interval cannot be negative".to_string(),
            });
        }
        if game.auto_start_min_players < 2 {
            return Err(ConfigError::Invalid {
                field: "game.auto_start_min_players",
                reason: "auto-start needs at least 2 players".to_string(),
            });
        }
        if game.admin_start_min_players < 2 {
            return Err(ConfigError::Invalid {
                field: "game.admin_start_min_players",
                reason: "a session needs at least 2 players to start".to_string(),
            });
        }
        if game.kick_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "game.kick_threshold",
                reason: "kick threshold must be at least 1".to_string(),
            });
        }
        if game.rake_bps > 10_000 {
            return Err(ConfigError::Invalid {
                field: "game.rake_bps",
                reason: "rake cannot exceed 100%".to_string(),
            });
        }
        if game.op_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "game.op_timeout_ms",
                reason: "operation timeout must be positive".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(CartelaConfig::default().validate().is_ok());
    }

    #[test]
    fn default_rake_takes_two_percent() {
        let game = GameConfig::default();
        assert_eq!(game.prize_for(100), 98);
        assert_eq!(game.prize_for(150), 147);
        // Floor, never round up.
        assert_eq!(game.prize_for(101), 98);
    }

    #[test]
    fn rejects_zero_denomination() {
        let mut config = CartelaConfig::default();
        config.game.denominations = vec![10, 0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_kick_threshold() {
        let mut config = CartelaConfig::default();
        config.game.kick_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: CartelaConfig = toml::from_str(
            r#"
            [game]
            call_interval_secs = 2

            [server]
            host = "127.0.0.1"
            port = 9090
            allowed_origins = ["*"]
            request_timeout_secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.game.call_interval_secs, 2);
        assert_eq!(config.game.countdown_secs, 120);
        assert_eq!(config.server.port, 9090);
    }
}
