use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use freightdesk_core::DomainError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::tracking_event::{NewTrackingEvent, TrackingEvent};
use crate::contracts::{Contract, ContractStatus};
use crate::shipments::ShipmentStatus;

const TRACKING_PREFIX: &str = "FDX";
const TRACKING_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const TRACKING_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shipment {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub tracking_number: String,
    pub status: String,
    pub origin: String,
    pub destination: String,
    pub carrier_name: Option<String>,
    pub transport_ref: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewShipment {
    /// Defaults to the RFQ route when omitted.
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub carrier_name: Option<String>,
    pub transport_ref: Option<String>,
    pub eta: Option<DateTime<Utc>>,
}

/// `FDX` followed by ten upper-case alphanumerics.
pub fn generate_tracking_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..10)
        .map(|_| TRACKING_CHARSET[rng.random_range(0..TRACKING_CHARSET.len())] as char)
        .collect();
    format!("{TRACKING_PREFIX}{suffix}")
}

impl Shipment {
    pub fn status(&self) -> Result<ShipmentStatus> {
        self.status.parse()
    }

    /// Book a shipment under an active contract. The contract row is held
    /// `FOR SHARE` until the insert commits, so a concurrent cancel either
    /// waits for the booking or makes it fail.
    pub async fn create(contract_id: Uuid, input: &NewShipment, pool: &PgPool) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let contract =
            sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = $1 FOR SHARE")
                .bind(contract_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DomainError::not_found("contract", contract_id))?;
        if contract.status()? != ContractStatus::Active {
            bail!(DomainError::conflict(format!(
                "shipments can only be booked on active contracts (contract is {})",
                contract.status
            )));
        }

        let (rfq_origin, rfq_destination): (String, String) =
            sqlx::query_as("SELECT origin, destination FROM rfqs WHERE id = $1")
                .bind(contract.rfq_id)
                .fetch_one(&mut *tx)
                .await?;
        let pick = |given: &Option<String>, fallback: String| {
            given
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(fallback)
        };
        let origin = pick(&input.origin, rfq_origin);
        let destination = pick(&input.destination, rfq_destination);

        // A tracking number collision yields no row instead of aborting the transaction.
        for attempt in 1..=TRACKING_ATTEMPTS {
            let inserted = sqlx::query_as::<_, Self>(
                r#"
                INSERT INTO shipments (
                    contract_id, tracking_number, origin, destination,
                    carrier_name, transport_ref, eta
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (tracking_number) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(contract_id)
            .bind(generate_tracking_number())
            .bind(&origin)
            .bind(&destination)
            .bind(&input.carrier_name)
            .bind(&input.transport_ref)
            .bind(input.eta)
            .fetch_optional(&mut *tx)
            .await?;

            match inserted {
                Some(shipment) => {
                    tx.commit().await?;
                    tracing::info!(
                        shipment_id = %shipment.id,
                        tracking_number = %shipment.tracking_number,
                        contract_id = %contract_id,
                        "Shipment booked"
                    );
                    return Ok(shipment);
                }
                None => tracing::warn!(attempt, "Tracking number collision, retrying"),
            }
        }
        bail!("could not allocate a unique tracking number")
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM shipments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DomainError::not_found("shipment", id).into())
    }

    pub async fn find_by_tracking_number(tracking_number: &str, pool: &PgPool) -> Result<Self> {
        let normalized = tracking_number.trim().to_ascii_uppercase();
        sqlx::query_as::<_, Self>("SELECT * FROM shipments WHERE tracking_number = $1")
            .bind(&normalized)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DomainError::not_found("shipment", normalized).into())
    }

    pub async fn list_for_contract(contract_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM shipments WHERE contract_id = $1 ORDER BY created_at ASC",
        )
        .bind(contract_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Append a tracking event and move the shipment to its status.
    pub async fn record_event(id: Uuid, input: &NewTrackingEvent, pool: &PgPool) -> Result<TrackingEvent> {
        let mut tx = pool.begin().await?;

        let shipment = sqlx::query_as::<_, Self>("SELECT * FROM shipments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DomainError::not_found("shipment", id))?;

        let current = shipment.status()?;
        if !current.accepts_event(input.status) {
            bail!(DomainError::transition("shipment", current, input.status));
        }

        let event = TrackingEvent::insert(id, input, &mut tx).await?;

        sqlx::query(
            r#"
            UPDATE shipments SET
                status = $2,
                delivered_at = CASE WHEN $2 = 'delivered' THEN $3 ELSE delivered_at END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.status.as_str())
        .bind(event.occurred_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            shipment_id = %id,
            from = %current,
            to = %input.status,
            "Tracking event recorded"
        );
        Ok(event)
    }

    pub async fn events(id: Uuid, pool: &PgPool) -> Result<Vec<TrackingEvent>> {
        Self::find_by_id(id, pool).await?;
        TrackingEvent::list_for_shipment(id, pool).await
    }
}
