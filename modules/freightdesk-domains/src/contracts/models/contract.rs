use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use freightdesk_core::DomainError;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::bidding::Bid;
use crate::rfqs::Rfq;
use crate::shipments::ShipmentStatus;

freightdesk_core::text_enum! {
    ContractStatus {
        Active => "active",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contract {
    pub id: Uuid,
    pub contract_number: String,
    pub rfq_id: Uuid,
    pub bid_id: Uuid,
    pub buyer_company_id: Uuid,
    pub provider_company_id: Uuid,
    pub agreed_price: f64,
    pub currency: String,
    pub status: String,
    pub signed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `FD-YYYYMMDD-XXXXXX`: signing date plus the first six hex digits of the id.
pub fn contract_number(id: Uuid, signed_at: DateTime<Utc>) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("FD-{}-{}", signed_at.format("%Y%m%d"), &simple[..6])
}

impl Contract {
    pub fn status(&self) -> Result<ContractStatus> {
        self.status.parse()
    }

    /// Create the contract for an awarded bid. Runs inside the award transaction.
    pub async fn create_from_award(rfq: &Rfq, bid: &Bid, conn: &mut PgConnection) -> Result<Self> {
        let id = Uuid::new_v4();
        let signed_at = Utc::now();

        let contract = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO contracts (
                id, contract_number, rfq_id, bid_id, buyer_company_id,
                provider_company_id, agreed_price, currency, signed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(contract_number(id, signed_at))
        .bind(rfq.id)
        .bind(bid.id)
        .bind(rfq.buyer_company_id)
        .bind(bid.company_id)
        .bind(bid.price)
        .bind(&bid.currency)
        .bind(signed_at)
        .fetch_one(conn)
        .await?;

        tracing::info!(
            contract_id = %contract.id,
            contract_number = %contract.contract_number,
            rfq_id = %rfq.id,
            "Contract created"
        );
        Ok(contract)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM contracts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DomainError::not_found("contract", id).into())
    }

    /// Contracts where the company is either the buyer or the provider.
    pub async fn list_for_company(company_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM contracts
            WHERE buyer_company_id = $1 OR provider_company_id = $1
            ORDER BY signed_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Complete an active contract once all of its shipments are delivered.
    pub async fn complete(id: Uuid, pool: &PgPool) -> Result<Self> {
        let mut tx = pool.begin().await?;
        let contract = Self::lock_active(id, ContractStatus::Completed, &mut tx).await?;

        let (total, delivered): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'delivered')
            FROM shipments WHERE contract_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if total == 0 {
            bail!(DomainError::conflict("contract has no shipments"));
        }
        if delivered < total {
            bail!(DomainError::conflict(format!(
                "{} of {} shipments not yet delivered",
                total - delivered,
                total
            )));
        }

        let updated = Self::set_status(contract.id, ContractStatus::Completed, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Cancel an active contract that has nothing on the move.
    pub async fn cancel(id: Uuid, pool: &PgPool) -> Result<Self> {
        let mut tx = pool.begin().await?;
        let contract = Self::lock_active(id, ContractStatus::Cancelled, &mut tx).await?;

        let moving: Vec<String> = ShipmentStatus::ALL
            .iter()
            .filter(|s| s.is_moving())
            .map(|s| s.as_str().to_string())
            .collect();
        let in_transit: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shipments WHERE contract_id = $1 AND status = ANY($2)",
        )
        .bind(id)
        .bind(moving)
        .fetch_one(&mut *tx)
        .await?;

        if in_transit > 0 {
            bail!(DomainError::conflict(format!(
                "{in_transit} shipment(s) are in transit"
            )));
        }

        let updated = Self::set_status(contract.id, ContractStatus::Cancelled, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn lock_active(id: Uuid, to: ContractStatus, conn: &mut PgConnection) -> Result<Self> {
        let contract = sqlx::query_as::<_, Self>("SELECT * FROM contracts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DomainError::not_found("contract", id))?;
        if contract.status()? != ContractStatus::Active {
            bail!(DomainError::transition("contract", &contract.status, to));
        }
        Ok(contract)
    }

    async fn set_status(id: Uuid, to: ContractStatus, conn: &mut PgConnection) -> Result<Self> {
        let contract = sqlx::query_as::<_, Self>(
            "UPDATE contracts SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(to.as_str())
        .fetch_one(conn)
        .await?;
        tracing::info!(contract_id = %id, status = %to, "Contract status changed");
        Ok(contract)
    }
}
