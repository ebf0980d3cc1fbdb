//! Domain command definitions.
//!
//! Every operation the bridge supports is a [`Command`] variant. The
//! command name and payload shape follow the terminal bridge convention
//! (`get_status`, `place_order`, ...) so the same command serializes
//! identically over the message channel and the file drop; the HTTP
//! transport maps names onto its fixed route table instead.
//!
//! # Commands
//!
//! | Command | Name on the wire |
//! |---------|------------------|
//! | [`Command::Ping`] | `ping` |
//! | [`Command::GetStatus`] | `get_status` |
//! | [`Command::GetAccountInfo`] | `get_account_info` |
//! | [`Command::GetMarketData`] | `get_market_data` |
//! | [`Command::GetSymbolInfo`] | `get_symbol_info` |
//! | [`Command::GetSymbols`] | `get_symbols` |
//! | [`Command::PlaceOrder`] | `place_order` |
//! | [`Command::GetPositions`] | `get_positions` |
//! | [`Command::GetPosition`] | `get_position` |
//! | [`Command::ClosePosition`] | `close_position` |
//! | [`Command::GetOrders`] | `get_orders` |
//! | [`Command::CancelOrder`] | `cancel_order` |
//! | [`Command::GetHistoryDeals`] | `get_history_deals` |
//! | [`Command::GetHistoryOrders`] | `get_history_orders` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

// ============================================================================
// OrderSide
// ============================================================================

/// Direction of a trade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    /// Buy (long).
    Buy,
    /// Sell (short).
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

// ============================================================================
// OrderRequest
// ============================================================================

/// Parameters for placing a trade order.
///
/// Optional prices are omitted from the payload entirely when unset; the
/// terminal treats a missing `price` as a market order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade, e.g. `EURUSD`.
    pub symbol: String,

    /// Buy or sell.
    #[serde(rename = "type")]
    pub side: OrderSide,

    /// Lot volume.
    pub volume: f64,

    /// Entry price for limit/stop orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// Stop-loss price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl: Option<f64>,

    /// Take-profit price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp: Option<f64>,

    /// Maximum price deviation in points.
    pub deviation: u32,

    /// Free-form order comment.
    pub comment: String,
}

impl OrderRequest {
    /// Default maximum price deviation in points.
    pub const DEFAULT_DEVIATION: u32 = 10;

    /// Creates a market order request.
    #[must_use]
    pub fn market(symbol: impl Into<String>, side: OrderSide, volume: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            volume,
            price: None,
            sl: None,
            tp: None,
            deviation: Self::DEFAULT_DEVIATION,
            comment: String::new(),
        }
    }

    /// Sets the entry price (limit/stop order).
    #[inline]
    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the stop-loss price.
    #[inline]
    #[must_use]
    pub fn with_sl(mut self, sl: f64) -> Self {
        self.sl = Some(sl);
        self
    }

    /// Sets the take-profit price.
    #[inline]
    #[must_use]
    pub fn with_tp(mut self, tp: f64) -> Self {
        self.tp = Some(tp);
        self
    }

    /// Sets the order comment.
    #[inline]
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Validates the order before it reaches any transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty symbol, a non-positive or
    /// non-finite volume, or a non-positive optional price.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::validation("order symbol must not be empty"));
        }
        if !self.volume.is_finite() || self.volume <= 0.0 {
            return Err(Error::validation(format!(
                "order volume must be positive, got {}",
                self.volume
            )));
        }
        for (name, value) in [("price", self.price), ("sl", self.sl), ("tp", self.tp)] {
            if let Some(v) = value
                && (!v.is_finite() || v <= 0.0)
            {
                return Err(Error::validation(format!(
                    "order {name} must be positive, got {v}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// HistoryFilter
// ============================================================================

/// Date-range filter for history queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Inclusive start date, ISO-8601.
    pub date_from: Option<String>,
    /// Inclusive end date, ISO-8601.
    pub date_to: Option<String>,
    /// Restrict deals to a single position.
    pub position_id: Option<u64>,
}

impl HistoryFilter {
    fn data(&self) -> Value {
        let mut map = Map::new();
        if let Some(from) = &self.date_from {
            map.insert("date_from".into(), Value::String(from.clone()));
        }
        if let Some(to) = &self.date_to {
            map.insert("date_to".into(), Value::String(to.clone()));
        }
        if let Some(id) = self.position_id {
            map.insert("position_id".into(), json!(id));
        }
        Value::Object(map)
    }
}

// ============================================================================
// Command
// ============================================================================

/// A domain operation addressed to the terminal.
///
/// Transports receive the serialized `name()`/`data()` pair and never see
/// these variants; the manager never branches on the active transport kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Liveness check.
    Ping,
    /// Terminal/server status.
    GetStatus,
    /// Account information (balance, equity, margin).
    GetAccountInfo,
    /// Candle data for a symbol.
    GetMarketData {
        /// Symbol, e.g. `EURUSD`.
        symbol: String,
        /// Timeframe code, e.g. `M1`, `H1`.
        timeframe: String,
        /// Number of candles.
        count: u32,
    },
    /// Static information about one symbol.
    GetSymbolInfo {
        /// Symbol to look up.
        symbol: String,
    },
    /// All tradable symbols.
    GetSymbols,
    /// Place a trade order.
    PlaceOrder(OrderRequest),
    /// All open positions.
    GetPositions,
    /// One open position by ticket.
    GetPosition {
        /// Position ticket.
        ticket: u64,
    },
    /// Close one open position.
    ClosePosition {
        /// Position ticket.
        ticket: u64,
    },
    /// All pending orders.
    GetOrders,
    /// Cancel one pending order.
    CancelOrder {
        /// Order ticket.
        ticket: u64,
    },
    /// Historical deals.
    GetHistoryDeals(HistoryFilter),
    /// Historical orders.
    GetHistoryOrders(HistoryFilter),
}

impl Command {
    /// Returns the wire name of this command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::GetStatus => "get_status",
            Self::GetAccountInfo => "get_account_info",
            Self::GetMarketData { .. } => "get_market_data",
            Self::GetSymbolInfo { .. } => "get_symbol_info",
            Self::GetSymbols => "get_symbols",
            Self::PlaceOrder(_) => "place_order",
            Self::GetPositions => "get_positions",
            Self::GetPosition { .. } => "get_position",
            Self::ClosePosition { .. } => "close_position",
            Self::GetOrders => "get_orders",
            Self::CancelOrder { .. } => "cancel_order",
            Self::GetHistoryDeals(_) => "get_history_deals",
            Self::GetHistoryOrders(_) => "get_history_orders",
        }
    }

    /// Returns the JSON payload for this command.
    ///
    /// Symbols and timeframes are uppercased here so every transport sends
    /// the same canonical form.
    #[must_use]
    pub fn data(&self) -> Value {
        match self {
            Self::Ping
            | Self::GetStatus
            | Self::GetAccountInfo
            | Self::GetSymbols
            | Self::GetPositions
            | Self::GetOrders => json!({}),

            Self::GetMarketData {
                symbol,
                timeframe,
                count,
            } => json!({
                "symbol": symbol.to_uppercase(),
                "timeframe": timeframe.to_uppercase(),
                "count": count,
            }),

            Self::GetSymbolInfo { symbol } => json!({ "symbol": symbol.to_uppercase() }),

            Self::PlaceOrder(order) => {
                let mut value = serde_json::to_value(order).unwrap_or_else(|_| json!({}));
                if let Some(symbol) = value.get_mut("symbol") {
                    *symbol = Value::String(order.symbol.to_uppercase());
                }
                value
            }

            Self::GetPosition { ticket } | Self::ClosePosition { ticket } => {
                json!({ "ticket": ticket })
            }

            Self::CancelOrder { ticket } => json!({ "ticket": ticket }),

            Self::GetHistoryDeals(filter) | Self::GetHistoryOrders(filter) => filter.data(),
        }
    }

    /// Validates command inputs before any transport call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for malformed domain input; never
    /// silently coerces.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::PlaceOrder(order) => order.validate(),

            Self::GetMarketData { symbol, count, .. } => {
                if symbol.trim().is_empty() {
                    return Err(Error::validation("symbol must not be empty"));
                }
                if *count == 0 {
                    return Err(Error::validation("candle count must be positive"));
                }
                Ok(())
            }

            Self::GetSymbolInfo { symbol } => {
                if symbol.trim().is_empty() {
                    return Err(Error::validation("symbol must not be empty"));
                }
                Ok(())
            }

            Self::GetPosition { ticket }
            | Self::ClosePosition { ticket }
            | Self::CancelOrder { ticket } => {
                if *ticket == 0 {
                    return Err(Error::validation("ticket must be positive"));
                }
                Ok(())
            }

            _ => Ok(()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
