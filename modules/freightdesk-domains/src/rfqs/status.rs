freightdesk_core::text_enum! {
    /// Lifecycle of a request for quotation.
    RfqStatus {
        Draft => "draft",
        Open => "open",
        Closed => "closed",
        Awarded => "awarded",
        Cancelled => "cancelled",
    }
}

impl RfqStatus {
    pub fn can_transition_to(self, next: RfqStatus) -> bool {
        use RfqStatus::*;
        matches!(
            (self, next),
            (Draft, Open)
                | (Open, Closed)
                | (Open, Awarded)
                | (Closed, Awarded)
                | (Draft, Cancelled)
                | (Open, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RfqStatus::Awarded | RfqStatus::Cancelled)
    }

    pub fn accepts_bids(self) -> bool {
        self == RfqStatus::Open
    }
}
