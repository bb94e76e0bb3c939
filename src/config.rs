use std::env;
use std::fmt;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub classifier: ClassifierConfig,
    pub engine: EngineEnvConfig,
}

#[derive(Clone)]
pub struct ClassifierConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub mock: bool,
}

/// Engine knobs tunable from the environment: windowing plus the detection
/// thresholds. Defaults mirror [`crate::engine::config::DetectionConfig`].
#[derive(Debug, Clone)]
pub struct EngineEnvConfig {
    pub tick_interval_secs: u64,
    pub probability_window_capacity: usize,
    pub fixation_radius: f64,
    pub fixation_min_duration_ms: f64,
    pub saccade_min_distance: f64,
    pub microsaccade_max_amplitude: f64,
    pub blink_confidence_threshold: f64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("classifier", &self.classifier)
            .field("engine", &self.engine)
            .finish()
    }
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("timeout_secs", &self.timeout_secs)
            .field("mock", &self.mock)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            classifier: ClassifierConfig {
                api_url: env_or("CLASSIFIER_API_URL", "http://localhost:6000/predict"),
                api_key: env_or("CLASSIFIER_API_KEY", ""),
                timeout_secs: env_or_parse("CLASSIFIER_TIMEOUT_SECS", 5_u64),
                mock: env_or_bool("CLASSIFIER_MOCK", false),
            },
            engine: {
                let d = crate::engine::config::DetectionConfig::default();
                EngineEnvConfig {
                    tick_interval_secs: env_or_parse("ENGINE_TICK_INTERVAL_SECS", 10_u64),
                    probability_window_capacity: env_or_parse(
                        "ENGINE_PROBABILITY_WINDOW",
                        12_usize,
                    ),
                    fixation_radius: env_or_parse("ENGINE_FIXATION_RADIUS", d.fixation_radius),
                    fixation_min_duration_ms: env_or_parse(
                        "ENGINE_FIXATION_MIN_DURATION_MS",
                        d.fixation_min_duration_ms,
                    ),
                    saccade_min_distance: env_or_parse(
                        "ENGINE_SACCADE_MIN_DISTANCE",
                        d.saccade_min_distance,
                    ),
                    microsaccade_max_amplitude: env_or_parse(
                        "ENGINE_MICROSACCADE_MAX_AMPLITUDE",
                        d.microsaccade_max_amplitude,
                    ),
                    blink_confidence_threshold: env_or_parse(
                        "ENGINE_BLINK_CONFIDENCE_THRESHOLD",
                        d.blink_confidence_threshold,
                    ),
                }
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "RUST_LOG",
            "CLASSIFIER_API_URL",
            "CLASSIFIER_TIMEOUT_SECS",
            "CLASSIFIER_MOCK",
            "ENGINE_TICK_INTERVAL_SECS",
            "ENGINE_PROBABILITY_WINDOW",
            "ENGINE_FIXATION_RADIUS",
            "ENGINE_BLINK_CONFIDENCE_THRESHOLD",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.classifier.api_url, "http://localhost:6000/predict");
        assert_eq!(cfg.classifier.timeout_secs, 5);
        assert!(!cfg.classifier.mock);
        assert_eq!(cfg.engine.tick_interval_secs, 10);
        assert_eq!(cfg.engine.probability_window_capacity, 12);
        assert_eq!(cfg.engine.fixation_radius, 50.0);
        assert_eq!(cfg.engine.blink_confidence_threshold, 0.2);
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("CLASSIFIER_TIMEOUT_SECS", "42");
        env::set_var("ENGINE_TICK_INTERVAL_SECS", "2");
        env::set_var("ENGINE_PROBABILITY_WINDOW", "6");
        env::set_var("ENGINE_FIXATION_RADIUS", "40.5");

        let cfg = Config::from_env();
        assert_eq!(cfg.classifier.timeout_secs, 42);
        assert_eq!(cfg.engine.tick_interval_secs, 2);
        assert_eq!(cfg.engine.probability_window_capacity, 6);
        assert_eq!(cfg.engine.fixation_radius, 40.5);
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("CLASSIFIER_TIMEOUT_SECS", "bad");
        env::set_var("ENGINE_PROBABILITY_WINDOW", "x");

        let cfg = Config::from_env();
        assert_eq!(cfg.classifier.timeout_secs, 5);
        assert_eq!(cfg.engine.probability_window_capacity, 12);
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("CLASSIFIER_MOCK", "true");
        let cfg = Config::from_env();
        assert!(cfg.classifier.mock);

        let rendered = format!("{:?}", cfg.classifier);
        assert!(rendered.contains("***REDACTED***"));
    }
}
