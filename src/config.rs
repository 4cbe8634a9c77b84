use dotenv::dotenv;
use log::warn;
use std::env;
use std::time::Duration;

/// Runtime configuration for the backend connection and the sync engine
/// timings. Values come from the environment (a `.env` file is honored) and
/// fall back to the defaults the bundled backend uses.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub progress_ws_url: String,
    pub poll_interval: Duration,
    pub seek_grace: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5001/api".to_string(),
            progress_ws_url: "ws://127.0.0.1:5001/api/progress".to_string(),
            poll_interval: Duration::from_millis(500),
            seek_grace: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let mut config = Config::default();
        if let Ok(value) = env::var("RESONA_API_URL") {
            config.api_base_url = value;
        }
        if let Ok(value) = env::var("RESONA_PROGRESS_URL") {
            config.progress_ws_url = value;
        }
        if let Some(value) = duration_from_env("RESONA_POLL_INTERVAL_MS") {
            config.poll_interval = value;
        }
        if let Some(value) = duration_from_env("RESONA_SEEK_GRACE_MS") {
            config.seek_grace = value;
        }
        if let Some(value) = duration_from_env("RESONA_REQUEST_TIMEOUT_MS") {
            config.request_timeout = value;
        }
        config
    }
}

fn duration_from_env(name: &str) -> Option<Duration> {
    let raw = env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!("Ignoring {}={:?}: expected milliseconds", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://127.0.0.1:5001/api");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.seek_grace, Duration::from_millis(1000));
    }

    #[test]
    fn env_override_parses_milliseconds() {
        env::set_var("RESONA_TEST_DURATION_MS", "250");
        assert_eq!(
            duration_from_env("RESONA_TEST_DURATION_MS"),
            Some(Duration::from_millis(250))
        );

        env::set_var("RESONA_TEST_DURATION_MS", "fast");
        assert_eq!(duration_from_env("RESONA_TEST_DURATION_MS"), None);
        env::remove_var("RESONA_TEST_DURATION_MS");
    }
}
