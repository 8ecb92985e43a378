use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use freightdesk_core::DomainError;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::shipments::ShipmentStatus;

/// Append-only log of a shipment's movements.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackingEvent {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub status: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrackingEvent {
    pub status: ShipmentStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TrackingEvent {
    pub(crate) async fn insert(
        shipment_id: Uuid,
        input: &NewTrackingEvent,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let now = Utc::now();
        let occurred_at = input.occurred_at.unwrap_or(now);
        if occurred_at > now + chrono::Duration::minutes(5) {
            bail!(DomainError::validation("occurred_at must not be in the future"));
        }

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO tracking_events (shipment_id, status, location, description, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(shipment_id)
        .bind(input.status.as_str())
        .bind(&input.location)
        .bind(&input.description)
        .bind(occurred_at)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_shipment(shipment_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM tracking_events
            WHERE shipment_id = $1
            ORDER BY occurred_at ASC, created_at ASC
            "#,
        )
        .bind(shipment_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
