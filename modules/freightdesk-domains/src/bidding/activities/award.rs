use anyhow::{bail, Result};
use freightdesk_core::DomainError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::bidding::Bid;
use crate::contracts::Contract;
use crate::rfqs::{Rfq, RfqStatus};

/// Award an RFQ to one of its bids and sign the resulting contract.
///
/// Everything happens in one transaction with the RFQ row locked, so two
/// concurrent awards for the same RFQ serialize and the loser sees a
/// transition error.
pub async fn award_bid(rfq_id: Uuid, bid_id: Uuid, pool: &PgPool) -> Result<Contract> {
    let mut tx = pool.begin().await?;

    let rfq = Rfq::lock(rfq_id, &mut tx).await?;
    let status = rfq.status()?;
    if !status.can_transition_to(RfqStatus::Awarded) {
        bail!(DomainError::transition("rfq", status, RfqStatus::Awarded));
    }

    let winner = Bid::settle(rfq_id, bid_id, &mut tx).await?;
    let rfq = Rfq::mark_awarded(rfq_id, winner.id, &mut tx).await?;
    let contract = Contract::create_from_award(&rfq, &winner, &mut tx).await?;

    tx.commit().await?;

    tracing::info!(
        rfq_id = %rfq_id,
        bid_id = %bid_id,
        contract_id = %contract.id,
        "RFQ awarded"
    );
    Ok(contract)
}
