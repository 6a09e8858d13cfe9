//! Configuration management
//!
//! Consensus parameters for a chain: the well-known genesis id, the
//! base-target bounds and the identifier suffixes. Loaded from TOML with
//! optional environment overrides.

pub mod settings;

pub use settings::ChainConfig;
