/// Declares a string-backed enum stored as TEXT in Postgres, with
/// `as_str`, `Display`, `FromStr` (failing with `DomainError::Validation`)
/// and serde using the same text.
#[macro_export]
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::anyhow::Error;
            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err($crate::DomainError::validation(format!(
                        "unknown {}: {}",
                        stringify!($name),
                        s
                    ))
                    .into()),
                }
            }
        }
    };
}

text_enum! {
    /// Role a company plays on the marketplace.
    CompanyType {
        Shipper => "shipper",
        Forwarder => "forwarder",
        Carrier => "carrier",
        CustomsBroker => "customs_broker",
    }
}

text_enum! {
    /// Transport mode or service line of an offering or RFQ.
    ServiceMode {
        SeaFcl => "sea_fcl",
        SeaLcl => "sea_lcl",
        Air => "air",
        RoadFtl => "road_ftl",
        RoadLtl => "road_ltl",
        Rail => "rail",
        Customs => "customs",
        Warehousing => "warehousing",
    }
}

/// Normalise and validate an ISO-4217 style currency code.
pub fn normalize_currency(code: &str) -> Result<String, crate::DomainError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(crate::DomainError::validation(format!(
            "currency must be a 3-letter code, got '{code}'"
        )))
    }
}

/// Clamp a caller-supplied page size to a sane range.
pub fn page_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 100)
}

pub fn page_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
