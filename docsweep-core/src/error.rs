use docsweep_scanner::ScanError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Unknown vendor '{0}' (not present in configuration)")]
    UnknownVendor(String),

    #[error("Unknown product '{product}' for vendor '{vendor}'")]
    UnknownProduct { vendor: String, product: String },

    #[error("Missing configuration setting: {0}")]
    MissingSetting(String),

    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Product '{product}' did not finish within {after:?}")]
    ProductTimeout { product: String, after: Duration },

    #[error("No links found for {0}")]
    NoLinks(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
