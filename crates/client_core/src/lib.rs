pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod listing;
pub mod posts;

pub use api::{CatalogSource, Endpoints, HttpCatalogClient};
pub use debounce::Debouncer;
pub use error::{ClientError, ClientResult};
pub use listing::{
    FetchOutcome, FetchPhase, ListingEvent, ListingSnapshot, ProductListing, QueryChange,
};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
