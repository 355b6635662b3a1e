use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SAMPLE_CAPACITY: usize = 1 << 22;
pub const DEFAULT_EVENT_CAPACITY: usize = 1 << 20;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Queue sizes used when buffering starts without an explicit capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: usize,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_instances")]
    pub instances: usize,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// One event is emitted every `event_interval` samples.
    #[serde(default = "default_event_interval")]
    pub event_interval: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            instances: default_instances(),
            sample_rate: default_sample_rate(),
            event_interval: default_event_interval(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_sample_capacity() -> usize {
    DEFAULT_SAMPLE_CAPACITY
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_instances() -> usize {
    2
}

fn default_sample_rate() -> u32 {
    500
}

fn default_event_interval() -> u32 {
    50
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
