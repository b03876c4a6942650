use crate::config::toml_config::{SchedConfig, StorageConfig};
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "sched.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sched-grid")]
#[command(about = "Build a weekly class schedule from catalog sections")]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults to ./sched.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Section catalog export (.json or .csv); overrides the config file
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Catalog backend URL; overrides the config file
    #[arg(long, global = true, conflicts_with = "catalog")]
    pub endpoint: Option<String>,

    /// Working schedule file kept between runs
    #[arg(long, global = true)]
    pub state: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum Command {
    /// List every subject code in the catalog
    Courses,
    /// List the sections offered for a subject
    Sections { code: String },
    /// Place a section on the schedule
    Add { code: String, section: String },
    /// Remove a placed section by id (e.g. "ENGL 11-A")
    Remove { id: String },
    /// Remove every placed section
    Clear,
    /// Print the weekly timetable
    Show,
    /// Save the schedule to a JSON file
    Save { file: Option<String> },
    /// Replace the schedule with a saved JSON file
    Load {
        file: String,
        /// Replace a non-empty schedule without asking
        #[arg(long)]
        yes: bool,
    },
}

impl CliConfig {
    /// 合併設定檔與命令列參數
    pub fn resolve(&self) -> Result<SchedConfig> {
        let mut config = match &self.config {
            Some(path) => SchedConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                SchedConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => SchedConfig::default(),
        };

        if let Some(path) = &self.catalog {
            config.catalog.r#type = "file".to_string();
            config.catalog.path = Some(path.clone());
        }

        if let Some(endpoint) = &self.endpoint {
            config.catalog.r#type = "http".to_string();
            config.catalog.endpoint = Some(endpoint.clone());
        }

        if let Some(state) = &self.state {
            let storage = config.storage.get_or_insert_with(|| StorageConfig {
                output_path: ".".to_string(),
                state_file: None,
            });
            storage.state_file = Some(state.clone());
        }

        Ok(config)
    }
}
