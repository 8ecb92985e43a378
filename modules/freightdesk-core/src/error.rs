//! Business-rule errors shared by every domain.
//!
//! Domain code returns `anyhow::Result` and raises these with `bail!`, so
//! callers that care (the HTTP layer) can `downcast_ref::<DomainError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("cannot move {entity} from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn transition(entity: &'static str, from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_anyhow_round_trip() {
        let err: anyhow::Error = DomainError::not_found("rfq", "abc").into();
        let domain = err.downcast_ref::<DomainError>().unwrap();
        assert_eq!(domain.code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "rfq not found: abc");
    }

    #[test]
    fn transition_message_names_both_states() {
        let err = DomainError::transition("shipment", "delivered", "in_transit");
        assert_eq!(err.to_string(), "cannot move shipment from delivered to in_transit");
    }
}
