pub mod config;
pub mod error;
pub mod extract;
pub mod freshness;
pub mod harvest;
mod html;
pub mod manifest;
pub mod markdown;
pub mod report;
pub mod store;
pub mod tables;

pub use config::{Config, ProductUnit, VendorConfig};
pub use error::HarvestError;
pub use report::{HarvestSummary, ProductOutcome};
pub use store::{DocumentRecord, DocumentWriter};
