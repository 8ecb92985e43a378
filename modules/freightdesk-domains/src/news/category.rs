freightdesk_core::text_enum! {
    NewsCategory {
        OceanFreight => "ocean_freight",
        AirFreight => "air_freight",
        RoadRail => "road_rail",
        PortsLogistics => "ports_logistics",
        TradePolicy => "trade_policy",
        MarketRates => "market_rates",
        Technology => "technology",
        General => "general",
    }
}

freightdesk_core::text_enum! {
    /// Which stage produced an article's category.
    ClassifiedBy {
        Rules => "rules",
        Ai => "ai",
    }
}
