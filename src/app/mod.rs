//! Application configuration
//!
//! Run settings are loaded and validated once, before the engine starts,
//! and passed by reference to every component afterwards.

mod config;

pub use config::{
    validate_target_url, CheckConfig, ClassWeights, Config, DetectionConfig, LoginConfig,
    ScannerConfig, ScoringConfig, TierThreshold, MAX_WORKERS, MIN_WORKERS,
};
