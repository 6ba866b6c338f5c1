//! Environment-driven configuration for the binary.

use std::env;

use tracing::warn;

use crate::data::DEFAULT_DATASET_PATH;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `PITCHSIM_DATA`
    pub data_path: String,
    /// `PITCHSIM_BIND`
    pub bind_addr: String,
    /// `PITCHSIM_WORKERS`; 0 uses all cores.
    pub workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: DEFAULT_DATASET_PATH.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            workers: 0,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or empty keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let workers = match read("PITCHSIM_WORKERS") {
            Some(raw) => raw.trim().parse::<usize>().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid PITCHSIM_WORKERS, defaulting to 0");
                defaults.workers
            }),
            None => defaults.workers,
        };

        Self {
            data_path: read("PITCHSIM_DATA").unwrap_or(defaults.data_path),
            bind_addr: read("PITCHSIM_BIND").unwrap_or(defaults.bind_addr),
            workers,
        }
    }
}
