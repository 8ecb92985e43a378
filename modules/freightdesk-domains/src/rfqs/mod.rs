pub mod rfq;
pub mod status;

pub use rfq::{NewRfq, Rfq, RfqFilters};
pub use status::RfqStatus;
