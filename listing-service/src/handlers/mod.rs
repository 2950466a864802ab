pub mod health;
pub mod listing;
pub mod metrics;

pub use health::health_check;
pub use listing::{route_listing, ListingRoute};
pub use metrics::metrics_endpoint;
