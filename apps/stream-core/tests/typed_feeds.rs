//! Typed Feed Integration Tests
//!
//! Feeds end to end over the scripted transport: payload decoding into the
//! store-backed read models, connection flags, error slots, and guard-based
//! teardown.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use common::{MockTransport, setup_factory, wait_until};
use stream_core::{
    BalanceFeed, ContractFeed, ContractPriceRequest, DurationUnit, MarketFeed, PositionsFeed,
    StreamError, TradeType,
};

fn contract_request() -> ContractPriceRequest {
    ContractPriceRequest {
        instrument_id: "frxEURUSD".to_string(),
        trade_type: TradeType::Rise,
        duration: 5,
        duration_unit: DurationUnit::Minute,
        stake: Decimal::from_str("10").unwrap(),
    }
}

#[tokio::test]
async fn market_feed_surfaces_latest_tick() {
    let transport = MockTransport::new();
    let (factory, _registry) = setup_factory(Arc::clone(&transport));
    let feed = MarketFeed::new(factory);

    let _subscription = feed.subscribe("frxEURUSD").unwrap();
    wait_until(|| feed.quote("frxEURUSD").is_connected).await;

    transport.emit(json!({
        "instrument_id": "frxEURUSD",
        "price": "1.09312",
        "timestamp": "2025-11-03T09:15:00Z"
    }));
    wait_until(|| feed.quote("frxEURUSD").price.is_some()).await;

    let quote = feed.quote("frxEURUSD");
    let tick = quote.price.unwrap();
    assert_eq!(tick.price, Decimal::from_str("1.09312").unwrap());
    assert_eq!(tick.instrument_id, "frxEURUSD");
    assert!(quote.error.is_none());
}

#[tokio::test]
async fn market_feed_drops_malformed_payloads_silently() {
    let transport = MockTransport::new();
    let (factory, _registry) = setup_factory(Arc::clone(&transport));
    let feed = MarketFeed::new(factory);

    let _subscription = feed.subscribe("frxEURUSD").unwrap();
    wait_until(|| feed.quote("frxEURUSD").is_connected).await;

    transport.emit(json!({"unexpected": "shape"}));
    transport.emit(json!({
        "instrument_id": "frxEURUSD",
        "price": "1.5",
        "timestamp": "2025-11-03T09:15:00Z"
    }));
    wait_until(|| feed.quote("frxEURUSD").price.is_some()).await;

    // The malformed payload neither crashed the stream nor surfaced an error.
    let quote = feed.quote("frxEURUSD");
    assert!(quote.error.is_none());
    assert_eq!(quote.price.unwrap().price, Decimal::from_str("1.5").unwrap());
}

#[tokio::test]
async fn switching_instrument_reuses_the_price_channel() {
    let transport = MockTransport::new();
    let (factory, registry) = setup_factory(Arc::clone(&transport));
    let feed = MarketFeed::new(factory);

    let _eurusd = feed.subscribe("frxEURUSD").unwrap();
    wait_until(|| transport.open_count() == 1).await;

    let _gbpusd = feed.subscribe("frxGBPUSD").unwrap();
    assert_eq!(registry.connection_count(), 1);
    wait_until(|| transport.close_count() == 1).await;
}

#[tokio::test]
async fn dropping_the_guard_tears_the_connection_down() {
    let transport = MockTransport::new();
    let (factory, registry) = setup_factory(Arc::clone(&transport));
    let feed = MarketFeed::new(factory);

    let subscription = feed.subscribe("frxEURUSD").unwrap();
    wait_until(|| transport.open_count() == 1).await;

    drop(subscription);
    assert_eq!(registry.connection_count(), 0);
    wait_until(|| transport.close_count() == 1).await;
}

#[tokio::test]
async fn superseded_instrument_stops_reporting_connected() {
    let transport = MockTransport::new();
    let (factory, _registry) = setup_factory(Arc::clone(&transport));
    let feed = MarketFeed::new(factory);

    let _eurusd = feed.subscribe("frxEURUSD").unwrap();
    wait_until(|| feed.quote("frxEURUSD").is_connected).await;

    let _gbpusd = feed.subscribe("frxGBPUSD").unwrap();

    // The superseded instrument's state is gone, not frozen as connected.
    let stale = feed.quote("frxEURUSD");
    assert!(!stale.is_connected);
    assert!(stale.price.is_none());
    wait_until(|| feed.quote("frxGBPUSD").is_connected).await;
}

#[tokio::test]
async fn dropping_the_guard_clears_the_connected_flag() {
    let transport = MockTransport::new();
    let (factory, _registry) = setup_factory(Arc::clone(&transport));
    let feed = MarketFeed::new(factory);

    let subscription = feed.subscribe("frxEURUSD").unwrap();
    wait_until(|| feed.quote("frxEURUSD").is_connected).await;

    drop(subscription);
    assert!(!feed.quote("frxEURUSD").is_connected);
}

#[tokio::test]
async fn changing_the_proposal_supersedes_its_quote_state() {
    let transport = MockTransport::new();
    let (factory, _registry) = setup_factory(Arc::clone(&transport));
    let feed = ContractFeed::new(factory);

    let five_minutes = contract_request();
    let mut ten_minutes = contract_request();
    ten_minutes.duration = 10;

    let _first = feed.subscribe(&five_minutes, "session-token-1").unwrap();
    wait_until(|| feed.quote(&five_minutes).is_connected).await;

    let _second = feed.subscribe(&ten_minutes, "session-token-1").unwrap();
    assert!(!feed.quote(&five_minutes).is_connected);
    wait_until(|| feed.quote(&ten_minutes).is_connected).await;
}

#[tokio::test]
async fn stale_guard_does_not_cancel_its_successor() {
    let transport = MockTransport::new();
    let (factory, registry) = setup_factory(Arc::clone(&transport));
    let feed = MarketFeed::new(factory);

    let stale = feed.subscribe("frxEURUSD").unwrap();
    wait_until(|| transport.open_count() == 1).await;

    let _fresh = feed.subscribe("frxGBPUSD").unwrap();
    wait_until(|| transport.close_count() == 1).await;

    // The superseded guard going away must leave the fresh subscription live.
    drop(stale);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(registry.connection_count(), 1);
    assert_eq!(transport.close_count(), 1);

    transport.emit(json!({
        "instrument_id": "frxGBPUSD",
        "price": "1.27",
        "timestamp": "2025-11-03T09:15:00Z"
    }));
    wait_until(|| feed.quote("frxGBPUSD").price.is_some()).await;
}

#[tokio::test]
async fn contract_feed_surfaces_quotes_per_proposal() {
    let transport = MockTransport::new();
    let (factory, _registry) = setup_factory(Arc::clone(&transport));
    let feed = ContractFeed::new(factory);
    let request = contract_request();

    let _subscription = feed.subscribe(&request, "session-token-1").unwrap();
    wait_until(|| feed.quote(&request).is_connected).await;
    assert_eq!(
        transport.opened_tokens(),
        vec![Some("session-token-1".to_string())]
    );

    transport.emit(json!({
        "price": "5.12",
        "payout": "10.00",
        "spot": "1.09312",
        "timestamp": "2025-11-03T09:15:00Z"
    }));
    wait_until(|| feed.quote(&request).price.is_some()).await;

    let quote = feed.quote(&request).price.unwrap();
    assert_eq!(quote.price, Decimal::from_str("5.12").unwrap());
    assert_eq!(quote.payout, Decimal::from_str("10.00").unwrap());
}

#[tokio::test]
async fn contract_feed_surfaces_transport_errors() {
    let transport = MockTransport::new();
    let (factory, _registry) = setup_factory(Arc::clone(&transport));
    transport.fail_connections_with(StreamError::Http(401));

    let feed = ContractFeed::new(factory);
    let request = contract_request();
    let _subscription = feed.subscribe(&request, "expired-token").unwrap();

    wait_until(|| feed.quote(&request).error.is_some()).await;
    let quote = feed.quote(&request);
    assert!(!quote.is_connected);
    assert!(quote.error.unwrap().contains("401"));
}

#[tokio::test]
async fn positions_feed_decodes_snapshots() {
    let transport = MockTransport::new();
    let (factory, _registry) = setup_factory(Arc::clone(&transport));
    let feed = PositionsFeed::new(factory);

    let _subscription = feed.subscribe_open("session-token-1").unwrap();
    wait_until(|| feed.open_positions().is_connected).await;

    transport.emit(json!({
        "contracts": [{
            "contract_id": "c-1",
            "instrument_id": "frxEURUSD",
            "buy_price": "5.12",
            "current_price": "5.40",
            "profit": "0.28",
            "expiry": "2025-11-03T09:20:00Z"
        }]
    }));
    wait_until(|| !feed.open_positions().positions.is_empty()).await;

    let snapshot = feed.open_positions();
    assert_eq!(snapshot.positions.len(), 1);
    assert_eq!(snapshot.positions[0].contract_id, "c-1");
    assert_eq!(
        snapshot.positions[0].current_price,
        Some(Decimal::from_str("5.40").unwrap())
    );
}

#[tokio::test]
async fn open_and_closed_positions_share_one_channel() {
    let transport = MockTransport::new();
    let (factory, registry) = setup_factory(Arc::clone(&transport));
    let feed = PositionsFeed::new(factory);

    let _open = feed.subscribe_open("session-token-1").unwrap();
    wait_until(|| transport.open_count() == 1).await;

    let _closed = feed.subscribe_closed("session-token-1").unwrap();
    assert_eq!(registry.connection_count(), 1);
    wait_until(|| transport.close_count() == 1).await;

    wait_until(|| feed.closed_positions().is_connected).await;
    transport.emit(json!({
        "contracts": [{
            "contract_id": "c-2",
            "instrument_id": "frxEURUSD",
            "buy_price": "5.12",
            "sell_price": "0.00",
            "profit": "-5.12",
            "closed_at": "2025-11-03T09:25:00Z"
        }]
    }));
    wait_until(|| !feed.closed_positions().positions.is_empty()).await;
    assert_eq!(
        feed.closed_positions().positions[0].profit,
        Decimal::from_str("-5.12").unwrap()
    );
}

#[tokio::test]
async fn balance_feed_runs_on_its_own_channel() {
    let transport = MockTransport::new();
    let (factory, registry) = setup_factory(Arc::clone(&transport));
    let balance_feed = BalanceFeed::new(Arc::clone(&factory));
    let positions_feed = PositionsFeed::new(factory);

    let _balance = balance_feed.subscribe("session-token-1").unwrap();
    let _positions = positions_feed.subscribe_open("session-token-1").unwrap();

    // Custom accounting path vs default protected path: two channels.
    assert_eq!(registry.connection_count(), 2);
    wait_until(|| transport.open_count() == 2).await;
    assert_eq!(transport.close_count(), 0);

    wait_until(|| balance_feed.balance().is_connected).await;
    transport.emit(json!({"balance": "10000.00", "currency": "USD"}));
    wait_until(|| balance_feed.balance().balance.is_some()).await;

    let snapshot = balance_feed.balance().balance.unwrap();
    assert_eq!(snapshot.balance, Decimal::from_str("10000.00").unwrap());
    assert_eq!(snapshot.currency, "USD");
}
