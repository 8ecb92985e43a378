pub mod activities;
pub mod models;

pub use activities::award::award_bid;
pub use models::bid::{check_can_bid, Bid, BidStatus, BidWithBidder, NewBid};
