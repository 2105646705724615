//! Configuration loading and management for the Labor Cost Engine.
//!
//! This module provides functionality to load engine policy, effective-dated
//! rate versions (role salary components and overtime tiers) and the holiday
//! calendar from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use labor_cost_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Rate versions: {}", config.registry().versions().len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    HolidayCalendarConfig, PeriodSnapshot, PolicyConfig, RateRegistry, RateVersion,
    RateVersionConfig, RoleConfig,
};
