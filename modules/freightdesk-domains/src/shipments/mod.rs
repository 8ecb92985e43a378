pub mod models;
pub mod status;

pub use models::shipment::{generate_tracking_number, NewShipment, Shipment};
pub use models::tracking_event::{NewTrackingEvent, TrackingEvent};
pub use status::ShipmentStatus;
