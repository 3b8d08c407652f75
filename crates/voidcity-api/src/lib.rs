pub mod auth;
pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::CatalogClient;
pub use error::{CatalogError, ErrorKind};
pub use traits::CatalogService;
