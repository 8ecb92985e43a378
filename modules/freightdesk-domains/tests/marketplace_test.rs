//! Integration test: RFQ → bids → award → contract → shipments against a real Postgres.
//! Run with: cargo test -p freightdesk-domains --features test-utils --test marketplace_test

#![cfg(feature = "test-utils")]

use chrono::{Duration, Utc};
use freightdesk_core::{CompanyType, DomainError, ServiceMode};
use freightdesk_domains::bidding::{award_bid, Bid, BidStatus, NewBid};
use freightdesk_domains::contracts::{Contract, ContractStatus};
use freightdesk_domains::directory::{Company, NewCompany};
use freightdesk_domains::rfqs::{NewRfq, Rfq, RfqStatus};
use freightdesk_domains::shipments::{NewShipment, NewTrackingEvent, Shipment, ShipmentStatus};
use freightdesk_domains::testutil::postgres_container;
use sqlx::PgPool;
use uuid::Uuid;

fn code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<DomainError>()
        .map(DomainError::code)
        .unwrap_or("OTHER")
}

async fn company(name: &str, kind: CompanyType, pool: &PgPool) -> Company {
    Company::create(
        &NewCompany {
            name: name.into(),
            company_type: kind,
            country: Some("NL".into()),
            city: None,
            description: None,
            website: None,
            email: None,
            phone: None,
        },
        pool,
    )
    .await
    .unwrap()
}

async fn open_rfq(buyer: Uuid, pool: &PgPool) -> Rfq {
    let rfq = Rfq::create(
        &NewRfq {
            buyer_company_id: buyer,
            title: "2x40HC Ningbo to Rotterdam".into(),
            service_mode: ServiceMode::SeaFcl,
            origin: "CNNGB".into(),
            destination: "NLRTM".into(),
            cargo_description: Some("Flat-pack furniture".into()),
            cargo_weight_kg: Some(21_000.0),
            cargo_volume_cbm: Some(130.0),
            container_count: Some(2),
            ready_date: None,
            deadline: Utc::now() + Duration::days(2),
        },
        pool,
    )
    .await
    .unwrap();
    assert_eq!(rfq.status, "draft");
    Rfq::publish(rfq.id, pool).await.unwrap()
}

fn bid_from(company_id: Uuid, price: f64, transit_days: i32) -> NewBid {
    NewBid {
        company_id,
        price,
        currency: "usd".into(),
        transit_days,
        valid_until: None,
        notes: None,
    }
}

fn event(status: ShipmentStatus) -> NewTrackingEvent {
    NewTrackingEvent {
        status,
        location: Some("Rotterdam".into()),
        description: None,
        occurred_at: None,
    }
}

#[tokio::test]
async fn rfq_to_delivered_contract() {
    let (_container, pool) = postgres_container().await;

    let buyer = company("Dutch Home Imports", CompanyType::Shipper, &pool).await;
    let fwd_a = company("Harbor Forwarding", CompanyType::Forwarder, &pool).await;
    let fwd_b = company("Delta Logistics", CompanyType::Forwarder, &pool).await;

    let rfq = open_rfq(buyer.id, &pool).await;
    assert_eq!(rfq.status().unwrap(), RfqStatus::Open);

    // Buyer cannot bid on its own RFQ.
    let err = Bid::submit(rfq.id, &bid_from(buyer.id, 4000.0, 30), &pool)
        .await
        .unwrap_err();
    assert_eq!(code(&err), "VALIDATION");

    // Resubmission revises the single bid.
    let first = Bid::submit(rfq.id, &bid_from(fwd_a.id, 5200.0, 32), &pool).await.unwrap();
    let revised = Bid::submit(rfq.id, &bid_from(fwd_a.id, 4900.0, 30), &pool).await.unwrap();
    assert_eq!(first.id, revised.id);
    assert_eq!(revised.revision, 2);
    assert_eq!(revised.currency, "USD");

    let other = Bid::submit(rfq.id, &bid_from(fwd_b.id, 5100.0, 28), &pool).await.unwrap();
    assert_eq!(Bid::list_for_rfq(rfq.id, &pool).await.unwrap().len(), 2);

    let contract = award_bid(rfq.id, revised.id, &pool).await.unwrap();
    assert_eq!(contract.provider_company_id, fwd_a.id);
    assert_eq!(contract.agreed_price, 4900.0);
    assert!(contract.contract_number.starts_with("FD-"));

    let rfq = Rfq::find_by_id(rfq.id, &pool).await.unwrap();
    assert_eq!(rfq.status, "awarded");
    assert_eq!(rfq.awarded_bid_id, Some(revised.id));
    assert_eq!(Bid::find_by_id(other.id, &pool).await.unwrap().status().unwrap(), BidStatus::Rejected);

    // A second award on the same RFQ is refused.
    let err = award_bid(rfq.id, other.id, &pool).await.unwrap_err();
    assert_eq!(code(&err), "INVALID_TRANSITION");

    // Completion needs at least one delivered shipment.
    let err = Contract::complete(contract.id, &pool).await.unwrap_err();
    assert_eq!(code(&err), "CONFLICT");

    let shipment = Shipment::create(contract.id, &NewShipment::default(), &pool).await.unwrap();
    assert_eq!(shipment.origin, "CNNGB");
    assert!(shipment.tracking_number.starts_with("FDX"));
    let found = Shipment::find_by_tracking_number(&shipment.tracking_number.to_lowercase(), &pool)
        .await
        .unwrap();
    assert_eq!(found.id, shipment.id);

    Shipment::record_event(shipment.id, &event(ShipmentStatus::PickedUp), &pool).await.unwrap();
    Shipment::record_event(shipment.id, &event(ShipmentStatus::AtPort), &pool).await.unwrap();

    // Moving goods block cancellation; backwards moves are refused.
    let err = Contract::cancel(contract.id, &pool).await.unwrap_err();
    assert_eq!(code(&err), "CONFLICT");
    let err = Shipment::record_event(shipment.id, &event(ShipmentStatus::InTransit), &pool)
        .await
        .unwrap_err();
    assert_eq!(code(&err), "INVALID_TRANSITION");

    Shipment::record_event(shipment.id, &event(ShipmentStatus::Exception), &pool).await.unwrap();
    Shipment::record_event(shipment.id, &event(ShipmentStatus::CustomsClearance), &pool)
        .await
        .unwrap();
    Shipment::record_event(shipment.id, &event(ShipmentStatus::Delivered), &pool).await.unwrap();

    let shipment = Shipment::find_by_id(shipment.id, &pool).await.unwrap();
    assert_eq!(shipment.status().unwrap(), ShipmentStatus::Delivered);
    assert!(shipment.delivered_at.is_some());
    assert_eq!(Shipment::events(shipment.id, &pool).await.unwrap().len(), 5);

    let completed = Contract::complete(contract.id, &pool).await.unwrap();
    assert_eq!(completed.status().unwrap(), ContractStatus::Completed);

    let for_provider = Contract::list_for_company(fwd_a.id, &pool).await.unwrap();
    assert_eq!(for_provider.len(), 1);
    assert!(Contract::list_for_company(fwd_b.id, &pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn withdrawn_bids_and_closed_rfqs() {
    let (_container, pool) = postgres_container().await;

    let buyer = company("Alpine Retail", CompanyType::Shipper, &pool).await;
    let carrier = company("Rhine Rail Cargo", CompanyType::Carrier, &pool).await;
    let rfq = open_rfq(buyer.id, &pool).await;

    let bid = Bid::submit(rfq.id, &bid_from(carrier.id, 1800.0, 4), &pool).await.unwrap();
    let withdrawn = Bid::withdraw(bid.id, &pool).await.unwrap();
    assert_eq!(withdrawn.status, "withdrawn");

    let err = Bid::withdraw(bid.id, &pool).await.unwrap_err();
    assert_eq!(code(&err), "INVALID_TRANSITION");

    // Withdrawn bids cannot win.
    let err = award_bid(rfq.id, bid.id, &pool).await.unwrap_err();
    assert_eq!(code(&err), "CONFLICT");

    // Resubmitting after withdrawal revives the bid.
    let revived = Bid::submit(rfq.id, &bid_from(carrier.id, 1750.0, 4), &pool).await.unwrap();
    assert_eq!(revived.status, "submitted");
    assert_eq!(revived.revision, 2);

    Rfq::close(rfq.id, &pool).await.unwrap();
    let err = Bid::submit(rfq.id, &bid_from(carrier.id, 1700.0, 4), &pool).await.unwrap_err();
    assert_eq!(code(&err), "CONFLICT");

    // Closed RFQs can still be awarded.
    let contract = award_bid(rfq.id, revived.id, &pool).await.unwrap();
    assert_eq!(contract.status, "active");

    let err = Rfq::cancel(rfq.id, &pool).await.unwrap_err();
    assert_eq!(code(&err), "INVALID_TRANSITION");
}

#[tokio::test]
async fn expired_rfqs_are_closed_in_bulk() {
    let (_container, pool) = postgres_container().await;
    let buyer = company("Baltic Timber", CompanyType::Shipper, &pool).await;
    let rfq = open_rfq(buyer.id, &pool).await;

    sqlx::query("UPDATE rfqs SET deadline = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(rfq.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(Rfq::close_expired(&pool).await.unwrap(), 1);
    assert_eq!(Rfq::close_expired(&pool).await.unwrap(), 0);
    assert_eq!(Rfq::find_by_id(rfq.id, &pool).await.unwrap().status, "closed");
}

#[tokio::test]
async fn concurrent_awards_produce_one_contract() {
    let (_container, pool) = postgres_container().await;
    let buyer = company("Nordic Foods", CompanyType::Shipper, &pool).await;
    let a = company("Fjord Freight", CompanyType::Forwarder, &pool).await;
    let b = company("Polar Logistics", CompanyType::Forwarder, &pool).await;
    let rfq = open_rfq(buyer.id, &pool).await;

    let bid_a = Bid::submit(rfq.id, &bid_from(a.id, 900.0, 6), &pool).await.unwrap();
    let bid_b = Bid::submit(rfq.id, &bid_from(b.id, 950.0, 5), &pool).await.unwrap();

    let (ra, rb) = tokio::join!(
        award_bid(rfq.id, bid_a.id, &pool),
        award_bid(rfq.id, bid_b.id, &pool)
    );
    assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);

    let contracts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contracts WHERE rfq_id = $1")
        .bind(rfq.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(contracts, 1);
}

#[tokio::test]
async fn cancelled_contracts_refuse_new_shipments() {
    let (_container, pool) = postgres_container().await;
    let buyer = company("Alpine Retail", CompanyType::Shipper, &pool).await;
    let carrier = company("Rhine Barge Lines", CompanyType::Carrier, &pool).await;
    let rfq = open_rfq(buyer.id, &pool).await;

    let bid = Bid::submit(rfq.id, &bid_from(carrier.id, 1200.0, 9), &pool).await.unwrap();
    let contract = award_bid(rfq.id, bid.id, &pool).await.unwrap();

    let cancelled = Contract::cancel(contract.id, &pool).await.unwrap();
    assert_eq!(cancelled.status().unwrap(), ContractStatus::Cancelled);

    let err = Shipment::create(contract.id, &NewShipment::default(), &pool)
        .await
        .unwrap_err();
    assert_eq!(code(&err), "CONFLICT");
    assert!(Shipment::list_for_contract(contract.id, &pool).await.unwrap().is_empty());

    let err = Shipment::create(Uuid::new_v4(), &NewShipment::default(), &pool)
        .await
        .unwrap_err();
    assert_eq!(code(&err), "NOT_FOUND");
}
