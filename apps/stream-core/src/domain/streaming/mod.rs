//! Stream Wire Payloads
//!
//! Typed payloads carried by the server-push streams. Each SSE event's
//! `data` field is one JSON document in one of these shapes.
//!
//! # Streams
//!
//! - **Price stream** (public): [`PriceTick`] per instrument
//! - **Contract price stream** (protected): [`ContractPrice`] quotes for a
//!   proposed contract
//! - **Positions stream** (protected): [`OpenPositionsUpdate`] /
//!   [`ClosedPositionsUpdate`] snapshots
//! - **Balance stream** (protected, custom path): [`Balance`]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Market Price Stream
// =============================================================================

/// One spot price update for an instrument.
///
/// # Wire Format (JSON)
/// ```json
/// {"instrument_id": "frxEURUSD", "price": "1.09312", "timestamp": "2025-11-03T09:15:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Instrument the tick belongs to.
    pub instrument_id: String,
    /// Spot price.
    pub price: Decimal,
    /// Server-side quote time.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Contract Price Stream
// =============================================================================

/// Direction of a proposed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    /// Payout if the exit spot is above the entry spot.
    Rise,
    /// Payout if the exit spot is below the entry spot.
    Fall,
}

impl TradeType {
    /// Wire name of the trade type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rise => "RISE",
            Self::Fall => "FALL",
        }
    }
}

/// Unit of a contract duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    /// Market ticks.
    Tick,
    /// Seconds.
    Second,
    /// Minutes.
    Minute,
    /// Hours.
    Hour,
    /// Days.
    Day,
}

impl DurationUnit {
    /// Wire suffix of the duration unit.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tick => "t",
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
        }
    }
}

/// Parameters of a contract price subscription.
///
/// The full parameter set travels as query parameters; the subset that
/// changes the priced contract forms the store key, so two subscriptions
/// for the same proposal share one slot in the read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPriceRequest {
    /// Instrument to price against.
    pub instrument_id: String,
    /// Contract direction.
    pub trade_type: TradeType,
    /// Duration magnitude.
    pub duration: u32,
    /// Duration unit.
    pub duration_unit: DurationUnit,
    /// Stake amount.
    pub stake: Decimal,
}

impl ContractPriceRequest {
    /// Serialize the request as stream query parameters.
    #[must_use]
    pub fn query_params(&self) -> Vec<(String, String)> {
        vec![
            ("stream".to_string(), "contract_price".to_string()),
            ("instrument_id".to_string(), self.instrument_id.clone()),
            ("trade_type".to_string(), self.trade_type.as_str().to_string()),
            (
                "duration".to_string(),
                format!("{}{}", self.duration, self.duration_unit.as_str()),
            ),
            ("stake".to_string(), self.stake.to_string()),
        ]
    }

    /// Composite key identifying this proposal in the read model.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}{}:{}",
            self.trade_type.as_str(),
            self.instrument_id,
            self.duration,
            self.duration_unit.as_str(),
            self.stake
        )
    }
}

/// One price quote for a proposed contract.
///
/// # Wire Format (JSON)
/// ```json
/// {"price": "5.12", "payout": "10.00", "spot": "1.09312", "timestamp": "2025-11-03T09:15:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPrice {
    /// Ask price of the contract at this instant.
    pub price: Decimal,
    /// Payout if the contract wins.
    pub payout: Decimal,
    /// Spot the quote was derived from.
    pub spot: Decimal,
    /// Server-side quote time.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Positions Streams
// =============================================================================

/// A position still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenContract {
    /// Contract identifier.
    pub contract_id: String,
    /// Instrument the contract runs on.
    pub instrument_id: String,
    /// Price paid to open the contract.
    pub buy_price: Decimal,
    /// Current indicative sell-back price, when the server supplies one.
    #[serde(default)]
    pub current_price: Option<Decimal>,
    /// Running profit/loss.
    pub profit: Decimal,
    /// Contract expiry time.
    pub expiry: DateTime<Utc>,
}

/// A position that has settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedContract {
    /// Contract identifier.
    pub contract_id: String,
    /// Instrument the contract ran on.
    pub instrument_id: String,
    /// Price paid to open the contract.
    pub buy_price: Decimal,
    /// Settlement value.
    pub sell_price: Decimal,
    /// Realized profit/loss.
    pub profit: Decimal,
    /// Settlement time.
    pub closed_at: DateTime<Utc>,
}

/// Full snapshot of open positions, replacing the prior snapshot.
///
/// # Wire Format (JSON)
/// ```json
/// {"contracts": [{"contract_id": "c-1", "instrument_id": "frxEURUSD", ...}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPositionsUpdate {
    /// Currently open contracts.
    #[serde(default)]
    pub contracts: Vec<OpenContract>,
}

/// Full snapshot of settled positions, replacing the prior snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedPositionsUpdate {
    /// Settled contracts.
    #[serde(default)]
    pub contracts: Vec<ClosedContract>,
}

// =============================================================================
// Balance Stream
// =============================================================================

/// Account balance update.
///
/// # Wire Format (JSON)
/// ```json
/// {"balance": "10000.00", "currency": "USD"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Available balance.
    pub balance: Decimal,
    /// ISO currency code.
    pub currency: String,
}
