pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod services;

pub use config::{Args, Category, Mode, ScrapeConfig, Year};
pub use domain::{NamedTable, Table};
pub use error::{Result, ScrapeError};
pub use services::Orchestrator;
