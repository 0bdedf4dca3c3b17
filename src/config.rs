use crate::lifecycle::LifecycleTimings;
use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    pub timings: LifecycleTimings,
    pub monitor_interval: Duration,
    pub share_base_url: String,
    pub preferences_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cert_path: None,
            key_path: None,
            timings: LifecycleTimings::default(),
            monitor_interval: Duration::from_secs(3),
            share_base_url: "https://mentat.app/share".to_string(),
            preferences_path: PathBuf::from("mentat-preferences.json"),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring invalid value '{}' for {}", raw, name);
            None
        }
    }
}

/// Reads a millisecond duration; zero is refused since every timer needs a period.
fn parse_millis(name: &str) -> Option<Duration> {
    let ms = parse_var::<u64>(name)?;
    if ms == 0 {
        warn!("Ignoring zero duration for {}", name);
        return None;
    }
    Some(Duration::from_millis(ms))
}

/// Scales the four deploy delays (1.0s, 1.5s, 1.5s, 1.5s) off the first one.
fn deploy_steps(first: Duration) -> [Duration; 4] {
    let later = first.saturating_mul(3) / 2;
    [first, later, later, later]
}

impl Config {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let mut timings = defaults.timings.clone();
        if let Some(tick) = parse_millis("MENTAT_BUILD_TICK_MS") {
            timings.build_tick = tick;
        }
        if let Some(first) = parse_millis("MENTAT_DEPLOY_STEP_MS") {
            timings.deploy_steps = deploy_steps(first);
        }
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            cert_path: env::var("CERT_PATH").ok(),
            key_path: env::var("KEY_PATH").ok(),
            timings,
            monitor_interval: parse_millis("MENTAT_MONITOR_INTERVAL_MS").unwrap_or(defaults.monitor_interval),
            share_base_url: env::var("MENTAT_SHARE_BASE_URL").unwrap_or(defaults.share_base_url),
            preferences_path: env::var("MENTAT_PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.preferences_path),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_scripted_timings() {
        let config = Config::default();
        assert_eq!(config.timings.build_tick, Duration::from_secs(2));
        assert_eq!(config.timings.deploy_steps[0], Duration::from_secs(1));
        assert_eq!(config.timings.deploy_steps[3], Duration::from_millis(1500));
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn env_overrides_are_applied() {
        // Only this test touches these variables.
        env::set_var("MENTAT_BUILD_TICK_MS", "50");
        env::set_var("MENTAT_DEPLOY_STEP_MS", "20");
        env::set_var("MENTAT_MONITOR_INTERVAL_MS", "not-a-number");
        let config = Config::from_env();
        assert_eq!(config.timings.build_tick, Duration::from_millis(50));
        assert_eq!(config.timings.deploy_steps[1], Duration::from_millis(30));
        assert_eq!(config.monitor_interval, Duration::from_secs(3));
        env::remove_var("MENTAT_BUILD_TICK_MS");
        env::remove_var("MENTAT_DEPLOY_STEP_MS");
        env::remove_var("MENTAT_MONITOR_INTERVAL_MS");
    }

    #[test]
    fn zero_durations_are_refused() {
        // Only this test touches this variable.
        env::set_var("MENTAT_TEST_ZERO_MS", "0");
        assert_eq!(parse_millis("MENTAT_TEST_ZERO_MS"), None);
        env::set_var("MENTAT_TEST_ZERO_MS", "15");
        assert_eq!(parse_millis("MENTAT_TEST_ZERO_MS"), Some(Duration::from_millis(15)));
        env::remove_var("MENTAT_TEST_ZERO_MS");
    }

    #[test]
    fn deploy_steps_scale_without_overflowing() {
        assert_eq!(deploy_steps(Duration::from_millis(20)), [20, 30, 30, 30].map(Duration::from_millis));
        let huge = Duration::from_millis(u64::MAX);
        let steps = deploy_steps(huge);
        assert_eq!(steps[0], huge);
        assert!(steps[1] > huge);
    }
}
