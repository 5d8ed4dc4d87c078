use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("No {kind} named {name:?} is known")]
    Lookup { kind: &'static str, name: String },
    #[error("Structure error: {0}")]
    Structure(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
