use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::validate;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Enabled,
    Disabled,
}

/// Server settings, read from flags with environment fallbacks.
#[derive(Parser, Debug, Clone)]
#[clap(name = "pack-server")]
pub struct Config {
    #[clap(long, env = "SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[clap(short = 'p', long, env = "SERVER_PORT", default_value = "9999")]
    pub port: u16,

    #[clap(long, env = "RATE_LIMITER", value_enum, default_value = "enabled")]
    pub rate_limiter: Toggle,

    /// Requests allowed per client address per second
    #[clap(long, env = "RATE_LIMITER_MAX_REQUESTS", default_value = "10")]
    pub rate_limit_max_requests: u32,

    /// Maximum number of stored plans
    #[clap(long, env = "CACHE_CAPACITY", default_value = "100000")]
    pub cache_capacity: u64,

    /// Largest order accepted; bounds the work done per request
    #[clap(long, env = "MAX_ORDER_QUANTITY", default_value = "1000000")]
    pub max_order_quantity: u32,

    /// Pack sizes to activate at startup, comma separated
    #[clap(long, env = "PACK_SIZES", value_delimiter = ',')]
    pub packs: Vec<u32>,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("rate limiter max requests must be greater than zero")]
    ZeroMaxRequests,

    #[error("max order quantity must be greater than zero")]
    ZeroMaxOrderQuantity,

    #[error("invalid startup pack sizes: {0}")]
    InvalidPacks(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limiter == Toggle::Enabled && self.rate_limit_max_requests == 0 {
            return Err(ConfigError::ZeroMaxRequests);
        }
        if self.max_order_quantity == 0 {
            return Err(ConfigError::ZeroMaxOrderQuantity);
        }
        if !self.packs.is_empty() {
            validate::pack_sizes(&self.startup_packs())
                .map_err(|err| ConfigError::InvalidPacks(err.to_string()))?;
        }
        Ok(())
    }

    pub fn rate_limiter_enabled(&self) -> bool {
        self.rate_limiter == Toggle::Enabled
    }

    pub fn startup_packs(&self) -> Vec<i64> {
        self.packs.iter().map(|&size| size as i64).collect()
    }
}
