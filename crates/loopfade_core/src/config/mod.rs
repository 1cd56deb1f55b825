//! Configuration management for loopfade.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Per-field defaults, so partial files are valid
//! - Atomic file writes (write to temp, then rename)
//!
//! # Example
//!
//! ```no_run
//! use loopfade_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new("loopfade.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Loops: {}", config.settings().conversion.loop_count);
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    CollectionKind, CollectionSettings, ConversionSettings, LoggingSettings, Settings,
    ToolSettings,
};
