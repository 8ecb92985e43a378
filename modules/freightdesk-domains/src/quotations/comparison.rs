//! Side-by-side scoring of the bids on an RFQ.
//!
//! Each bid gets four component scores in `0..=1` (price, transit time,
//! bidder rating, validity against the cargo ready date). The total is the
//! weighted mean of the components using the `[comparison]` weights. A bid
//! without `valid_until` is treated as open-ended.

use std::cmp::Ordering;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use freightdesk_core::file_config::ComparisonConfig;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::bidding::{Bid, BidWithBidder};
use crate::rfqs::Rfq;

const UNRATED_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub price: f64,
    pub transit: f64,
    pub rating: f64,
    pub validity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotationEntry {
    pub rank: usize,
    pub bid_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub company_rating: Option<f32>,
    pub price: f64,
    pub currency: String,
    pub price_usd: f64,
    pub transit_days: i32,
    pub valid_until: Option<NaiveDate>,
    pub submitted_at: DateTime<Utc>,
    pub scores: ScoreBreakdown,
    pub total_score: f64,
    pub cheapest: bool,
    pub fastest: bool,
    pub best_value: bool,
}

/// A bid left out of scoring, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct ExcludedBid {
    pub bid_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub price: f64,
    pub currency: String,
    pub excluded_reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotationComparison {
    pub rfq_id: Uuid,
    pub entries: Vec<QuotationEntry>,
    pub excluded: Vec<ExcludedBid>,
}

impl QuotationComparison {
    /// Load the submitted bids on an RFQ and rank them.
    pub async fn for_rfq(rfq_id: Uuid, config: &ComparisonConfig, pool: &PgPool) -> Result<Self> {
        let rfq = Rfq::find_by_id(rfq_id, pool).await?;
        let bids = Bid::submitted_for_rfq(rfq_id, pool).await?;
        let (entries, excluded) = compare_bids(&bids, rfq.ready_date, config);

        tracing::debug!(
            rfq_id = %rfq_id,
            ranked = entries.len(),
            excluded = excluded.len(),
            "Quotations compared"
        );
        Ok(Self {
            rfq_id,
            entries,
            excluded,
        })
    }
}

/// Rank bids by weighted score. Bids whose currency has no USD rate are
/// returned separately instead of being scored.
pub fn compare_bids(
    bids: &[BidWithBidder],
    ready_date: Option<NaiveDate>,
    config: &ComparisonConfig,
) -> (Vec<QuotationEntry>, Vec<ExcludedBid>) {
    let mut priced = Vec::with_capacity(bids.len());
    let mut excluded = Vec::new();

    for b in bids {
        let bid = &b.bid;
        match config.fx_to_usd.get(&bid.currency) {
            Some(rate) => priced.push((b, bid.price * rate)),
            None => excluded.push(ExcludedBid {
                bid_id: bid.id,
                company_id: bid.company_id,
                company_name: b.company_name.clone(),
                price: bid.price,
                currency: bid.currency.clone(),
                excluded_reason: format!("no exchange rate configured for {}", bid.currency),
            }),
        }
    }

    if priced.is_empty() {
        return (Vec::new(), excluded);
    }

    let min_usd = priced.iter().map(|(_, usd)| *usd).fold(f64::INFINITY, f64::min);
    let min_transit = priced
        .iter()
        .map(|(b, _)| b.bid.transit_days)
        .min()
        .unwrap_or(0);

    let weight_sum =
        config.price_weight + config.transit_weight + config.rating_weight + config.validity_weight;

    let mut entries: Vec<QuotationEntry> = priced
        .into_iter()
        .map(|(b, usd)| {
            let bid = &b.bid;
            let scores = ScoreBreakdown {
                price: min_usd / usd,
                transit: f64::from(min_transit + 1) / f64::from(bid.transit_days + 1),
                rating: b
                    .company_rating
                    .map(|r| f64::from(r) / 5.0)
                    .unwrap_or(UNRATED_SCORE),
                validity: match (ready_date, bid.valid_until) {
                    (Some(ready), Some(until)) if until < ready => 0.0,
                    _ => 1.0,
                },
            };
            let weighted = scores.price * config.price_weight
                + scores.transit * config.transit_weight
                + scores.rating * config.rating_weight
                + scores.validity * config.validity_weight;

            QuotationEntry {
                rank: 0,
                bid_id: bid.id,
                company_id: bid.company_id,
                company_name: b.company_name.clone(),
                company_rating: b.company_rating,
                price: bid.price,
                currency: bid.currency.clone(),
                price_usd: usd,
                transit_days: bid.transit_days,
                valid_until: bid.valid_until,
                submitted_at: bid.created_at,
                scores,
                total_score: if weight_sum > 0.0 { weighted / weight_sum } else { 0.0 },
                cheapest: usd == min_usd,
                fastest: bid.transit_days == min_transit,
                best_value: false,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.price_usd.partial_cmp(&b.price_usd).unwrap_or(Ordering::Equal))
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
        entry.best_value = i == 0;
    }

    (entries, excluded)
}
