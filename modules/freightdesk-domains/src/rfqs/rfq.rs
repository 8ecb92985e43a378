use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use freightdesk_core::{page_limit, page_offset, DomainError, ServiceMode};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::status::RfqStatus;
use crate::directory::Company;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rfq {
    pub id: Uuid,
    pub buyer_company_id: Uuid,
    pub title: String,
    pub service_mode: String,
    pub origin: String,
    pub destination: String,
    pub cargo_description: Option<String>,
    pub cargo_weight_kg: Option<f64>,
    pub cargo_volume_cbm: Option<f64>,
    pub container_count: Option<i32>,
    pub ready_date: Option<NaiveDate>,
    pub deadline: DateTime<Utc>,
    pub status: String,
    pub awarded_bid_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRfq {
    pub buyer_company_id: Uuid,
    pub title: String,
    pub service_mode: ServiceMode,
    pub origin: String,
    pub destination: String,
    pub cargo_description: Option<String>,
    pub cargo_weight_kg: Option<f64>,
    pub cargo_volume_cbm: Option<f64>,
    pub container_count: Option<i32>,
    pub ready_date: Option<NaiveDate>,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RfqFilters {
    pub status: Option<RfqStatus>,
    pub buyer_company_id: Option<Uuid>,
    pub service_mode: Option<ServiceMode>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl NewRfq {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("origin", &self.origin),
            ("destination", &self.destination),
        ] {
            if value.trim().is_empty() {
                bail!(DomainError::validation(format!("{field} must not be empty")));
            }
        }
        let negative = |v: Option<f64>| v.is_some_and(|v| !v.is_finite() || v < 0.0);
        if negative(self.cargo_weight_kg) || negative(self.cargo_volume_cbm) {
            bail!(DomainError::validation("cargo weight and volume must be non-negative"));
        }
        if self.container_count.is_some_and(|c| c < 0) {
            bail!(DomainError::validation("container_count must not be negative"));
        }
        Ok(())
    }
}

/// Statuses from which `to` is reachable, as bindable text.
fn sources_for(to: RfqStatus) -> Vec<String> {
    RfqStatus::ALL
        .iter()
        .filter(|from| from.can_transition_to(to))
        .map(|from| from.as_str().to_string())
        .collect()
}

impl Rfq {
    pub fn status(&self) -> Result<RfqStatus> {
        self.status.parse()
    }

    pub async fn create(input: &NewRfq, pool: &PgPool) -> Result<Self> {
        input.validate()?;
        Company::find_by_id(input.buyer_company_id, pool).await?;

        let rfq = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO rfqs (
                buyer_company_id, title, service_mode, origin, destination,
                cargo_description, cargo_weight_kg, cargo_volume_cbm, container_count,
                ready_date, deadline
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(input.buyer_company_id)
        .bind(input.title.trim())
        .bind(input.service_mode.as_str())
        .bind(input.origin.trim())
        .bind(input.destination.trim())
        .bind(&input.cargo_description)
        .bind(input.cargo_weight_kg)
        .bind(input.cargo_volume_cbm)
        .bind(input.container_count)
        .bind(input.ready_date)
        .bind(input.deadline)
        .fetch_one(pool)
        .await?;

        tracing::info!(rfq_id = %rfq.id, buyer = %rfq.buyer_company_id, "RFQ created");
        Ok(rfq)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM rfqs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DomainError::not_found("rfq", id).into())
    }

    /// Row-locked read for use inside a transaction.
    pub async fn lock(id: Uuid, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM rfqs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DomainError::not_found("rfq", id).into())
    }

    pub async fn list(filters: &RfqFilters, pool: &PgPool) -> Result<Vec<Self>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM rfqs WHERE TRUE ");

        if let Some(status) = filters.status {
            qb.push("AND status = ");
            qb.push_bind(status.as_str());
            qb.push(" ");
        }
        if let Some(buyer) = filters.buyer_company_id {
            qb.push("AND buyer_company_id = ");
            qb.push_bind(buyer);
            qb.push(" ");
        }
        if let Some(mode) = filters.service_mode {
            qb.push("AND service_mode = ");
            qb.push_bind(mode.as_str());
            qb.push(" ");
        }

        qb.push("ORDER BY deadline ASC, created_at DESC LIMIT ");
        qb.push_bind(page_limit(filters.limit));
        qb.push(" OFFSET ");
        qb.push_bind(page_offset(filters.offset));

        qb.build_query_as::<Self>()
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn count_open(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rfqs WHERE status = 'open' AND deadline > NOW()",
        )
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Conditional status update: succeeds only if the current status may move to `to`.
    async fn transition(id: Uuid, to: RfqStatus, conn: &mut PgConnection) -> Result<Self> {
        let updated = sqlx::query_as::<_, Self>(
            r#"
            UPDATE rfqs SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(sources_for(to))
        .fetch_optional(&mut *conn)
        .await?;

        match updated {
            Some(rfq) => {
                tracing::info!(rfq_id = %id, status = %to, "RFQ status changed");
                Ok(rfq)
            }
            None => {
                let current: Option<String> =
                    sqlx::query_scalar("SELECT status FROM rfqs WHERE id = $1")
                        .bind(id)
                        .fetch_optional(&mut *conn)
                        .await?;
                match current {
                    Some(from) => bail!(DomainError::transition("rfq", from, to)),
                    None => bail!(DomainError::not_found("rfq", id)),
                }
            }
        }
    }

    pub async fn publish(id: Uuid, pool: &PgPool) -> Result<Self> {
        let rfq = Self::find_by_id(id, pool).await?;
        if rfq.deadline <= Utc::now() {
            bail!(DomainError::validation("deadline must be in the future to publish"));
        }
        let mut conn = pool.acquire().await?;
        Self::transition(id, RfqStatus::Open, &mut conn).await
    }

    pub async fn close(id: Uuid, pool: &PgPool) -> Result<Self> {
        let mut conn = pool.acquire().await?;
        Self::transition(id, RfqStatus::Closed, &mut conn).await
    }

    pub async fn cancel(id: Uuid, pool: &PgPool) -> Result<Self> {
        let mut conn = pool.acquire().await?;
        Self::transition(id, RfqStatus::Cancelled, &mut conn).await
    }

    /// Mark an RFQ awarded. Caller holds the row lock inside its transaction.
    pub async fn mark_awarded(id: Uuid, bid_id: Uuid, conn: &mut PgConnection) -> Result<Self> {
        Self::transition(id, RfqStatus::Awarded, &mut *conn).await?;
        sqlx::query_as::<_, Self>(
            "UPDATE rfqs SET awarded_bid_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(bid_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Close every open RFQ whose deadline has passed. Returns the number closed.
    pub async fn close_expired(pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE rfqs SET status = 'closed', updated_at = NOW()
            WHERE status = 'open' AND deadline <= NOW()
            "#,
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_rfq() -> NewRfq {
        NewRfq {
            buyer_company_id: Uuid::new_v4(),
            title: "40HC Shanghai to Rotterdam".into(),
            service_mode: ServiceMode::SeaFcl,
            origin: "CNSHA".into(),
            destination: "NLRTM".into(),
            cargo_description: Some("Furniture".into()),
            cargo_weight_kg: Some(18_000.0),
            cargo_volume_cbm: Some(67.0),
            container_count: Some(2),
            ready_date: None,
            deadline: Utc::now() + Duration::days(3),
        }
    }

    #[test]
    fn valid_rfq_passes() {
        assert!(new_rfq().validate().is_ok());
    }

    #[test]
    fn blank_route_is_rejected() {
        let mut rfq = new_rfq();
        rfq.destination = "  ".into();
        let err = rfq.validate().unwrap_err();
        assert!(err.to_string().contains("destination"));
    }

    #[test]
    fn negative_cargo_is_rejected() {
        let mut rfq = new_rfq();
        rfq.cargo_weight_kg = Some(-1.0);
        assert!(rfq.validate().is_err());

        let mut rfq = new_rfq();
        rfq.container_count = Some(-2);
        assert!(rfq.validate().is_err());
    }

    #[test]
    fn award_sources_are_open_and_closed() {
        let mut sources = sources_for(RfqStatus::Awarded);
        sources.sort();
        assert_eq!(sources, vec!["closed".to_string(), "open".to_string()]);
        assert!(sources_for(RfqStatus::Draft).is_empty());
    }
}
