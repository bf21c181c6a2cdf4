pub mod handlers;

// Re-export commonly used helpers for convenience
pub use handlers::{
    describe_vendor, expand_path, load_config, parse_document_url, select_products,
    write_default_config,
};
