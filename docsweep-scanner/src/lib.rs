pub mod adapter;
pub mod chrome;
pub mod discovery;
pub mod error;
pub mod http;
pub mod result;
pub mod session;

pub use adapter::VendorAdapter;
pub use chrome::{ChromeOptions, ChromeSession};
pub use discovery::{Discoverer, DiscoveryEvent, EventCallback, SettleOptions};
pub use error::ScanError;
pub use http::HttpPageSource;
pub use result::LinkRecord;
pub use session::{BrowserSession, PageSource, Settle};
