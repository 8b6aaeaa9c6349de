//! Per-algorithm configuration strings and policy construction.
//!
//! Policies are selected by name and tuned with a `key=value,key=value`
//! string, e.g. `build_policy("s3fifo", 1 << 20,
//! "small-size-ratio=0.10,move-to-main-threshold=2")`. Unknown keys are
//! a configuration error, never silently ignored. The pseudo-key
//! `print` logs the resolved parameters instead of changing them.

use tracing::info;

use crate::error::ConfigError;
use crate::policy::car::CarCache;
use crate::policy::clock_pro::ClockProCache;
use crate::policy::fifo::FifoCache;
use crate::policy::lru::LruCache;
use crate::policy::s3_fifo::S3FifoCache;
use crate::policy::CachePolicy;

/// CAR tuning: the starting byte target for the recency clock, key `p`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarParams {
    pub initial_target: u64,
}

/// ClockPro tuning: keys `init-ref` and `init-ratio-cold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockProParams {
    /// Reference bit given to freshly inserted cold pages.
    pub init_referenced: bool,
    /// Starting cold budget as a fraction of the capacity.
    pub init_ratio_cold: f64,
}

impl Default for ClockProParams {
    fn default() -> Self {
        ClockProParams {
            init_referenced: false,
            init_ratio_cold: 1.0,
        }
    }
}

/// S3-FIFO tuning: keys `small-size-ratio`, `ghost-size-ratio` and
/// `move-to-main-threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct S3FifoParams {
    pub small_size_ratio: f64,
    pub ghost_size_ratio: f64,
    pub move_to_main_threshold: u8,
}

impl Default for S3FifoParams {
    fn default() -> Self {
        S3FifoParams {
            small_size_ratio: 0.10,
            ghost_size_ratio: 0.90,
            move_to_main_threshold: 2,
        }
    }
}

/// A parsed, validated policy selection ready to build at any capacity.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyConfig {
    Fifo,
    Lru,
    Car(CarParams),
    ClockPro(ClockProParams),
    S3Fifo(S3FifoParams),
    S3FifoV0(S3FifoParams),
}

impl PolicyConfig {
    /// Parses an algorithm name plus its `key=value,...` string. An
    /// empty string keeps every default.
    pub fn parse(algo: &str, params: &str) -> Result<Self, ConfigError> {
        let algo_lower = algo.to_ascii_lowercase();
        let mut config = match algo_lower.as_str() {
            "fifo" => PolicyConfig::Fifo,
            "lru" => PolicyConfig::Lru,
            "car" => PolicyConfig::Car(CarParams::default()),
            "clockpro" | "clock-pro" => PolicyConfig::ClockPro(ClockProParams::default()),
            "s3fifo" => PolicyConfig::S3Fifo(S3FifoParams::default()),
            "s3fifov0" => PolicyConfig::S3FifoV0(S3FifoParams::default()),
            other => {
                return Err(ConfigError::new(format!("unknown algorithm '{other}'")));
            }
        };
        let mut print = false;
        for part in params.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (part, ""),
            };
            if key == "print" {
                print = true;
                continue;
            }
            config.apply(key, value)?;
        }
        if print {
            info!(algo = config.algo(), params = %config.describe(), "cache parameters");
        }
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match self {
            PolicyConfig::Fifo | PolicyConfig::Lru => {}
            PolicyConfig::Car(p) => {
                if key == "p" {
                    p.initial_target = parse_u64(key, value)?;
                    return Ok(());
                }
            }
            PolicyConfig::ClockPro(p) => match key {
                "init-ref" => {
                    p.init_referenced = parse_bool(key, value)?;
                    return Ok(());
                }
                "init-ratio-cold" => {
                    let ratio = parse_f64(key, value)?;
                    if !(0.0..=1.0).contains(&ratio) {
                        return Err(ConfigError::new(format!(
                            "init-ratio-cold must be in [0, 1], got {ratio}"
                        )));
                    }
                    p.init_ratio_cold = ratio;
                    return Ok(());
                }
                _ => {}
            },
            PolicyConfig::S3Fifo(p) | PolicyConfig::S3FifoV0(p) => match key {
                "small-size-ratio" => {
                    p.small_size_ratio = parse_f64(key, value)?;
                    return Ok(());
                }
                "ghost-size-ratio" => {
                    p.ghost_size_ratio = parse_f64(key, value)?;
                    return Ok(());
                }
                "move-to-main-threshold" => {
                    p.move_to_main_threshold = parse_u8(key, value)?;
                    return Ok(());
                }
                _ => {}
            },
        }
        Err(ConfigError::new(format!(
            "unknown parameter '{key}' for algorithm '{}'",
            self.algo()
        )))
    }

    /// Canonical algorithm name.
    pub fn algo(&self) -> &'static str {
        match self {
            PolicyConfig::Fifo => "fifo",
            PolicyConfig::Lru => "lru",
            PolicyConfig::Car(_) => "car",
            PolicyConfig::ClockPro(_) => "clockpro",
            PolicyConfig::S3Fifo(_) => "s3fifo",
            PolicyConfig::S3FifoV0(_) => "s3fifov0",
        }
    }

    /// Renders the resolved parameters in the same `key=value` form they
    /// are parsed from.
    pub fn describe(&self) -> String {
        match self {
            PolicyConfig::Fifo | PolicyConfig::Lru => String::new(),
            PolicyConfig::Car(p) => format!("p={}", p.initial_target),
            PolicyConfig::ClockPro(p) => format!(
                "init-ref={},init-ratio-cold={}",
                u8::from(p.init_referenced),
                p.init_ratio_cold
            ),
            PolicyConfig::S3Fifo(p) | PolicyConfig::S3FifoV0(p) => format!(
                "small-size-ratio={},ghost-size-ratio={},move-to-main-threshold={}",
                p.small_size_ratio, p.ghost_size_ratio, p.move_to_main_threshold
            ),
        }
    }

    /// Builds a policy instance of this configuration at `capacity`
    /// bytes.
    pub fn build(&self, capacity: u64) -> Result<Box<dyn CachePolicy>, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("capacity must be > 0"));
        }
        Ok(match self {
            PolicyConfig::Fifo => Box::new(FifoCache::new(capacity)),
            PolicyConfig::Lru => Box::new(LruCache::new(capacity)),
            PolicyConfig::Car(p) => {
                Box::new(CarCache::with_initial_target(capacity, p.initial_target))
            }
            PolicyConfig::ClockPro(p) => Box::new(ClockProCache::with_params(
                capacity,
                p.init_referenced,
                p.init_ratio_cold,
            )),
            PolicyConfig::S3Fifo(p) => Box::new(S3FifoCache::try_with_ratios(
                capacity,
                p.small_size_ratio,
                p.ghost_size_ratio,
                p.move_to_main_threshold,
            )?),
            PolicyConfig::S3FifoV0(p) => Box::new(S3FifoCache::try_v0_with_ratios(
                capacity,
                p.small_size_ratio,
                p.ghost_size_ratio,
                p.move_to_main_threshold,
            )?),
        })
    }
}

/// One-shot parse-and-build.
pub fn build_policy(
    algo: &str,
    capacity: u64,
    params: &str,
) -> Result<Box<dyn CachePolicy>, ConfigError> {
    PolicyConfig::parse(algo, params)?.build(capacity)
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .parse::<f64>()
        .map_err(|_| ConfigError::new(format!("parameter '{key}' expects a number, got '{value}'")))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| {
        ConfigError::new(format!(
            "parameter '{key}' expects an unsigned integer, got '{value}'"
        ))
    })
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| {
        ConfigError::new(format!(
            "parameter '{key}' expects a small unsigned integer, got '{value}'"
        ))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        _ => Err(ConfigError::new(format!(
            "parameter '{key}' expects 0/1 or true/false, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_keeps_defaults() {
        let config = PolicyConfig::parse("s3fifo", "").unwrap();
        assert_eq!(config, PolicyConfig::S3Fifo(S3FifoParams::default()));
    }

    #[test]
    fn overrides_are_applied() {
        let config =
            PolicyConfig::parse("s3fifo", "small-size-ratio=0.2,move-to-main-threshold=1").unwrap();
        let PolicyConfig::S3Fifo(p) = config else {
            panic!("wrong variant");
        };
        assert_eq!(p.small_size_ratio, 0.2);
        assert_eq!(p.ghost_size_ratio, 0.90);
        assert_eq!(p.move_to_main_threshold, 1);
    }

    #[test]
    fn unknown_key_is_fatal() {
        let err = PolicyConfig::parse("car", "q=3").unwrap_err();
        assert!(err.message().contains("unknown parameter 'q'"));
        assert!(PolicyConfig::parse("fifo", "p=1").is_err());
    }

    #[test]
    fn unknown_algorithm_is_fatal() {
        assert!(PolicyConfig::parse("arc", "").is_err());
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(PolicyConfig::parse("car", "p=abc").is_err());
        assert!(PolicyConfig::parse("clockpro", "init-ref=maybe").is_err());
        assert!(PolicyConfig::parse("clockpro", "init-ratio-cold=1.5").is_err());
    }

    #[test]
    fn print_pseudo_key_is_accepted() {
        let config = PolicyConfig::parse("clockpro", "init-ref=1,print").unwrap();
        let PolicyConfig::ClockPro(p) = config else {
            panic!("wrong variant");
        };
        assert!(p.init_referenced);
    }

    #[test]
    fn build_dispatches_by_name() {
        for algo in ["fifo", "lru", "car", "clockpro", "s3fifo", "s3fifov0"] {
            let cache = build_policy(algo, 1024, "").unwrap();
            assert_eq!(cache.name(), algo);
            assert_eq!(cache.capacity(), 1024);
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = build_policy("lru", 0, "").unwrap_err();
        assert!(err.message().contains("capacity"));
    }

    #[test]
    fn describe_round_trips_through_parse() {
        let config = PolicyConfig::parse("s3fifo", "small-size-ratio=0.25").unwrap();
        let again = PolicyConfig::parse("s3fifo", &config.describe()).unwrap();
        assert_eq!(config, again);
    }
}
