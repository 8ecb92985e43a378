use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use freightdesk_core::{normalize_currency, DomainError};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::directory::Company;
use crate::rfqs::Rfq;

freightdesk_core::text_enum! {
    BidStatus {
        Submitted => "submitted",
        Withdrawn => "withdrawn",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub rfq_id: Uuid,
    pub company_id: Uuid,
    pub price: f64,
    pub currency: String,
    pub transit_days: i32,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub status: String,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBid {
    pub company_id: Uuid,
    pub price: f64,
    pub currency: String,
    pub transit_days: i32,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Bid joined with the bidder's name and rating, for listings and comparison.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidWithBidder {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub bid: Bid,
    pub company_name: String,
    pub company_rating: Option<f32>,
}

impl NewBid {
    pub fn validate(&self) -> Result<()> {
        if !self.price.is_finite() || self.price <= 0.0 {
            bail!(DomainError::validation("price must be greater than zero"));
        }
        if self.transit_days < 0 {
            bail!(DomainError::validation("transit_days must not be negative"));
        }
        normalize_currency(&self.currency)?;
        Ok(())
    }
}

/// Business rules for placing a bid, independent of storage.
pub fn check_can_bid(rfq: &Rfq, bidder_id: Uuid, now: DateTime<Utc>) -> Result<()> {
    if rfq.buyer_company_id == bidder_id {
        bail!(DomainError::validation("a company cannot bid on its own RFQ"));
    }
    if !rfq.status()?.accepts_bids() {
        bail!(DomainError::conflict(format!(
            "RFQ is {} and not accepting bids",
            rfq.status
        )));
    }
    if now >= rfq.deadline {
        bail!(DomainError::conflict("RFQ bidding deadline has passed"));
    }
    Ok(())
}

impl Bid {
    pub fn status(&self) -> Result<BidStatus> {
        self.status.parse()
    }

    /// Submit or revise the bidder's single bid on an RFQ.
    pub async fn submit(rfq_id: Uuid, input: &NewBid, pool: &PgPool) -> Result<Self> {
        input.validate()?;
        let currency = normalize_currency(&input.currency)?;

        let rfq = Rfq::find_by_id(rfq_id, pool).await?;
        Company::find_by_id(input.company_id, pool).await?;
        check_can_bid(&rfq, input.company_id, Utc::now())?;

        // The status guard keeps an accepted/rejected bid from being revived
        // once the RFQ has been awarded between the checks above and here.
        let bid = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO bids (rfq_id, company_id, price, currency, transit_days, valid_until, notes)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE EXISTS (
                SELECT 1 FROM rfqs WHERE id = $1 AND status = 'open' AND deadline > NOW()
            )
            ON CONFLICT (rfq_id, company_id) DO UPDATE SET
                price = EXCLUDED.price,
                currency = EXCLUDED.currency,
                transit_days = EXCLUDED.transit_days,
                valid_until = EXCLUDED.valid_until,
                notes = EXCLUDED.notes,
                status = 'submitted',
                revision = bids.revision + 1,
                updated_at = NOW()
            WHERE bids.status IN ('submitted', 'withdrawn')
            RETURNING *
            "#,
        )
        .bind(rfq_id)
        .bind(input.company_id)
        .bind(input.price)
        .bind(currency)
        .bind(input.transit_days)
        .bind(input.valid_until)
        .bind(&input.notes)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::conflict("RFQ is no longer accepting bids"))?;

        tracing::info!(
            rfq_id = %rfq_id,
            bid_id = %bid.id,
            revision = bid.revision,
            "Bid submitted"
        );
        Ok(bid)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM bids WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DomainError::not_found("bid", id).into())
    }

    pub async fn list_for_rfq(rfq_id: Uuid, pool: &PgPool) -> Result<Vec<BidWithBidder>> {
        sqlx::query_as::<_, BidWithBidder>(
            r#"
            SELECT b.*, c.name AS company_name, c.rating AS company_rating
            FROM bids b
            JOIN companies c ON c.id = b.company_id
            WHERE b.rfq_id = $1
            ORDER BY b.created_at ASC
            "#,
        )
        .bind(rfq_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn submitted_for_rfq(rfq_id: Uuid, pool: &PgPool) -> Result<Vec<BidWithBidder>> {
        Ok(Self::list_for_rfq(rfq_id, pool)
            .await?
            .into_iter()
            .filter(|b| b.bid.status == BidStatus::Submitted.as_str())
            .collect())
    }

    /// Withdraw a submitted bid while its RFQ is still open.
    pub async fn withdraw(id: Uuid, pool: &PgPool) -> Result<Self> {
        let updated = sqlx::query_as::<_, Self>(
            r#"
            UPDATE bids SET status = 'withdrawn', updated_at = NOW()
            WHERE id = $1 AND status = 'submitted'
              AND EXISTS (SELECT 1 FROM rfqs r WHERE r.id = bids.rfq_id AND r.status = 'open')
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(bid) => {
                tracing::info!(bid_id = %id, "Bid withdrawn");
                Ok(bid)
            }
            None => {
                let bid = Self::find_by_id(id, pool).await?;
                if bid.status()? != BidStatus::Submitted {
                    bail!(DomainError::transition("bid", bid.status, BidStatus::Withdrawn));
                }
                bail!(DomainError::conflict("RFQ is closed; bids can no longer be withdrawn"))
            }
        }
    }

    /// Accept one bid and reject the remaining submitted ones. Runs inside the
    /// caller's transaction.
    pub async fn settle(rfq_id: Uuid, winner_id: Uuid, conn: &mut PgConnection) -> Result<Self> {
        let winner = sqlx::query_as::<_, Self>(
            r#"
            UPDATE bids SET status = 'accepted', updated_at = NOW()
            WHERE id = $1 AND rfq_id = $2 AND status = 'submitted'
            RETURNING *
            "#,
        )
        .bind(winner_id)
        .bind(rfq_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            DomainError::conflict("bid does not belong to this RFQ or is not in submitted state")
        })?;

        let rejected = sqlx::query(
            r#"
            UPDATE bids SET status = 'rejected', updated_at = NOW()
            WHERE rfq_id = $1 AND id <> $2 AND status = 'submitted'
            "#,
        )
        .bind(rfq_id)
        .bind(winner_id)
        .execute(&mut *conn)
        .await?;

        tracing::info!(
            rfq_id = %rfq_id,
            bid_id = %winner_id,
            rejected = rejected.rows_affected(),
            "Bids settled"
        );
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rfq(status: &str, deadline: DateTime<Utc>) -> Rfq {
        Rfq {
            id: Uuid::new_v4(),
            buyer_company_id: Uuid::new_v4(),
            title: "LCL Hamburg to New York".into(),
            service_mode: "sea_lcl".into(),
            origin: "DEHAM".into(),
            destination: "USNYC".into(),
            cargo_description: None,
            cargo_weight_kg: None,
            cargo_volume_cbm: Some(4.5),
            container_count: None,
            ready_date: None,
            deadline,
            status: status.into(),
            awarded_bid_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn new_bid(price: f64) -> NewBid {
        NewBid {
            company_id: Uuid::new_v4(),
            price,
            currency: "eur".into(),
            transit_days: 12,
            valid_until: None,
            notes: None,
        }
    }

    #[test]
    fn open_rfq_before_deadline_accepts_bid() {
        let now = Utc::now();
        let rfq = rfq("open", now + Duration::hours(2));
        assert!(check_can_bid(&rfq, Uuid::new_v4(), now).is_ok());
    }

    #[test]
    fn buyer_cannot_bid_on_own_rfq() {
        let now = Utc::now();
        let rfq = rfq("open", now + Duration::hours(2));
        let err = check_can_bid(&rfq, rfq.buyer_company_id, now).unwrap_err();
        assert_eq!(err.downcast_ref::<DomainError>().unwrap().code(), "VALIDATION");
    }

    #[test]
    fn expired_or_closed_rfq_rejects_bid() {
        let now = Utc::now();
        let expired = rfq("open", now - Duration::minutes(1));
        let err = check_can_bid(&expired, Uuid::new_v4(), now).unwrap_err();
        assert_eq!(err.downcast_ref::<DomainError>().unwrap().code(), "CONFLICT");

        let draft = rfq("draft", now + Duration::days(1));
        assert!(check_can_bid(&draft, Uuid::new_v4(), now).is_err());
    }

    #[test]
    fn bid_validation() {
        assert!(new_bid(1500.0).validate().is_ok());
        assert!(new_bid(0.0).validate().is_err());
        assert!(new_bid(f64::INFINITY).validate().is_err());

        let mut bid = new_bid(100.0);
        bid.transit_days = -3;
        assert!(bid.validate().is_err());

        let mut bid = new_bid(100.0);
        bid.currency = "EURO".into();
        assert!(bid.validate().is_err());
    }
}
