pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FileCatalog, HttpCatalog, LocalStorage};
pub use config::SchedConfig;
pub use core::{
    codec::ScheduleCodec, grid::GridLayout, planner::SchedulePlanner, schedule::Schedule,
};
pub use utils::error::{ParseFailure, Result, SchedError};
