pub mod carfax;
pub mod listing;
pub mod vehicle;

pub use carfax::CarfaxSignal;
pub use listing::{GenerationRequest, GenerationResult, ListingQuery};
pub use vehicle::{InventoryRow, VehicleRecord};
