pub mod comparison;

pub use comparison::{
    compare_bids, ExcludedBid, QuotationComparison, QuotationEntry, ScoreBreakdown,
};
