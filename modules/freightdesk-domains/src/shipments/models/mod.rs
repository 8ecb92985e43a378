pub mod shipment;
pub mod tracking_event;
