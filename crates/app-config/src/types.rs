// In crates/app-config/src/types.rs

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the external identity provider and profile store.
    pub identity: IdentitySettings,
    /// Settings for the signal-query endpoint.
    pub signals: SignalsSettings,
    /// The default watchlist shown to subscribers.
    #[serde(default)]
    pub watchlist: WatchlistSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct IdentitySettings {
    /// The provider API key identifying this application.
    pub api_key: String,
    /// The REST base URL for the identity provider.
    pub auth_base_url: String,
    /// The REST base URL for the token refresh endpoint.
    pub token_base_url: String,
    /// The REST base URL for the profile document store.
    pub profile_base_url: String,
    /// Credentials used by the headless `run` command. Interactive commands
    /// take these as CLI arguments instead.
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SignalsSettings {
    /// The REST base URL for the signal-query service.
    pub rest_base_url: String,
    /// How often the active selection is re-fetched, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// The default chart interval (e.g., "5m", "1h").
    #[serde(default = "default_interval")]
    pub default_interval: String,
    /// How many candles to request per poll.
    #[serde(default = "default_limit")]
    pub limit: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WatchlistSettings {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
}

impl Default for WatchlistSettings {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
        }
    }
}

/// Helper functions for serde defaults
fn default_poll_interval_secs() -> u64 { 5 }
fn default_interval() -> String { "5m".to_string() }
fn default_limit() -> u16 { 50 }

fn default_symbols() -> Vec<String> {
    [
        "BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT",
        "XRPUSDT", "ADAUSDT", "DOGEUSDT", "AVAXUSDT",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
