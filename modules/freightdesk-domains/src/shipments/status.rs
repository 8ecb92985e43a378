freightdesk_core::text_enum! {
    /// Where a shipment is in its journey. Declaration order is route order,
    /// with `Exception` as a side state.
    ShipmentStatus {
        Booked => "booked",
        PickedUp => "picked_up",
        InTransit => "in_transit",
        AtPort => "at_port",
        CustomsClearance => "customs_clearance",
        OutForDelivery => "out_for_delivery",
        Delivered => "delivered",
        Exception => "exception",
    }
}

impl ShipmentStatus {
    /// Position along the route; `None` for `Exception`.
    fn stage(self) -> Option<u8> {
        match self {
            Self::Booked => Some(0),
            Self::PickedUp => Some(1),
            Self::InTransit => Some(2),
            Self::AtPort => Some(3),
            Self::CustomsClearance => Some(4),
            Self::OutForDelivery => Some(5),
            Self::Delivered => Some(6),
            Self::Exception => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Delivered
    }

    /// Goods have left the origin and not yet been delivered.
    pub fn is_moving(self) -> bool {
        !matches!(self, Self::Booked | Self::Delivered)
    }

    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        if self.is_terminal() || self == next {
            return false;
        }
        match (self.stage(), next.stage()) {
            (_, None) => true,
            (None, Some(_)) => matches!(
                next,
                Self::InTransit | Self::AtPort | Self::CustomsClearance | Self::OutForDelivery
            ),
            (Some(from), Some(to)) => to > from,
        }
    }

    /// Whether a tracking event with status `next` may be recorded. Repeating
    /// the current non-terminal status is a location update.
    pub fn accepts_event(self, next: ShipmentStatus) -> bool {
        (self == next && !self.is_terminal()) || self.can_transition_to(next)
    }
}
