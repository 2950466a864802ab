pub mod headers;
pub mod metrics;

pub use headers::{REQUEST_ID_HEADER, cors_headers_middleware, request_id_middleware};
pub use metrics::metrics_middleware;
