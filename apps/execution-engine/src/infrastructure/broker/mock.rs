//! In-memory scriptable broker.
//!
//! Orders live in a map keyed by broker order ID. Tests drive fills and
//! broker-side cancellations with [`MockBroker::set_order_state`] and queue
//! one-shot failures with the `fail_next_*` methods. Every port call is
//! recorded.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::ports::{
    BrokerError, BrokerPort, ExecutionReport, LimitOrderRequest, OrderPlacement,
};
use crate::domain::order_execution::{OrderSide, OrderStatus};
use crate::domain::shared::{BrokerOrderId, Symbol};

/// A recorded port call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    /// `place_limit_order`.
    PlaceLimit(LimitOrderRequest),
    /// `place_market_order`.
    PlaceMarket {
        /// Symbol.
        symbol: Symbol,
        /// Side.
        side: OrderSide,
        /// Quantity.
        quantity: Decimal,
    },
    /// `cancel_order`.
    Cancel {
        /// Target order.
        order_id: BrokerOrderId,
    },
    /// `replace_order`.
    Replace {
        /// Order being replaced.
        order_id: BrokerOrderId,
        /// New quantity.
        quantity: Decimal,
        /// New limit price.
        price: Decimal,
    },
    /// `get_order_execution_result`.
    ExecutionResult {
        /// Target order.
        order_id: BrokerOrderId,
    },
    /// `check_order_completion_status`.
    CompletionStatus {
        /// Target order.
        order_id: BrokerOrderId,
    },
}

#[derive(Debug, Clone)]
struct MockOrder {
    symbol: Symbol,
    side: OrderSide,
    quantity: Decimal,
    limit_price: Option<Decimal>,
    status: OrderStatus,
    filled: Decimal,
}

#[derive(Debug, Default)]
struct BrokerState {
    orders: HashMap<BrokerOrderId, MockOrder>,
    calls: Vec<BrokerCall>,
    cancelled: Vec<BrokerOrderId>,
    next_id: u64,
    limit_failures: VecDeque<BrokerError>,
    market_failures: VecDeque<BrokerError>,
    cancel_failures: VecDeque<BrokerError>,
    supports_replace: bool,
    fill_limits_on_place: bool,
}

impl BrokerState {
    fn insert(&mut self, order: MockOrder) -> BrokerOrderId {
        self.next_id += 1;
        let id = BrokerOrderId::new(format!("mock-{}", self.next_id));
        self.orders.insert(id.clone(), order);
        id
    }

    fn order(&self, order_id: &BrokerOrderId) -> Result<&MockOrder, BrokerError> {
        self.orders.get(order_id).ok_or_else(|| BrokerError::OrderNotFound {
            order_id: order_id.to_string(),
        })
    }
}

/// Scriptable in-memory [`BrokerPort`].
///
/// Limit orders rest until a test changes their state (or fill at once
/// when `set_fill_limits_on_place(true)`); market orders fill immediately.
/// Native replace is unsupported unless enabled.
#[derive(Debug, Default)]
pub struct MockBroker {
    state: Mutex<BrokerState>,
}

impl MockBroker {
    /// Create an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resting limit order without recording a call.
    pub fn seed_limit_order(
        &self,
        symbol: Symbol,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> BrokerOrderId {
        self.state.lock().insert(MockOrder {
            symbol,
            side,
            quantity,
            limit_price: Some(price),
            status: OrderStatus::New,
            filled: Decimal::ZERO,
        })
    }

    /// Overwrite an order's status and filled quantity.
    pub fn set_order_state(&self, order_id: &BrokerOrderId, status: OrderStatus, filled: Decimal) {
        if let Some(order) = self.state.lock().orders.get_mut(order_id) {
            order.status = status;
            order.filled = filled;
        }
    }

    /// Fail the next limit placement with `error`.
    pub fn fail_next_limit(&self, error: BrokerError) {
        self.state.lock().limit_failures.push_back(error);
    }

    /// Fail the next market placement with `error`.
    pub fn fail_next_market(&self, error: BrokerError) {
        self.state.lock().market_failures.push_back(error);
    }

    /// Fail the next cancel with `error`.
    pub fn fail_next_cancel(&self, error: BrokerError) {
        self.state.lock().cancel_failures.push_back(error);
    }

    /// Enable or disable native replace.
    pub fn set_supports_replace(&self, supported: bool) {
        self.state.lock().supports_replace = supported;
    }

    /// Fill new limit orders completely at their limit price.
    pub fn set_fill_limits_on_place(&self, fill: bool) {
        self.state.lock().fill_limits_on_place = fill;
    }

    /// Current status of an order.
    #[must_use]
    pub fn order_status(&self, order_id: &BrokerOrderId) -> Option<OrderStatus> {
        self.state.lock().orders.get(order_id).map(|o| o.status)
    }

    /// Every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.state.lock().calls.clone()
    }

    /// Every limit order request received, including failed ones.
    #[must_use]
    pub fn limit_orders(&self) -> Vec<LimitOrderRequest> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BrokerCall::PlaceLimit(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every market order request received, including failed ones.
    #[must_use]
    pub fn market_orders(&self) -> Vec<(Symbol, OrderSide, Decimal)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BrokerCall::PlaceMarket {
                    symbol,
                    side,
                    quantity,
                } => Some((symbol.clone(), *side, *quantity)),
                _ => None,
            })
            .collect()
    }

    /// Working orders with their unfilled quantity, sorted by ID.
    #[must_use]
    pub fn open_orders(&self) -> Vec<(BrokerOrderId, Symbol, OrderSide, Decimal)> {
        let state = self.state.lock();
        let mut open: Vec<_> = state
            .orders
            .iter()
            .filter(|(_, order)| order.status.is_active())
            .map(|(id, order)| {
                (
                    id.clone(),
                    order.symbol.clone(),
                    order.side,
                    (order.quantity - order.filled).max(Decimal::ZERO),
                )
            })
            .collect();
        open.sort_by(|a, b| a.0.cmp(&b.0));
        open
    }

    /// Orders cancelled through `cancel_order`.
    #[must_use]
    pub fn cancelled_orders(&self) -> Vec<BrokerOrderId> {
        self.state.lock().cancelled.clone()
    }
}

#[async_trait]
impl BrokerPort for MockBroker {
    async fn place_limit_order(&self, request: LimitOrderRequest) -> Result<OrderPlacement, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::PlaceLimit(request.clone()));
        if let Some(error) = state.limit_failures.pop_front() {
            return Err(error);
        }

        let (status, filled) = if state.fill_limits_on_place {
            (OrderStatus::Filled, request.quantity)
        } else {
            (OrderStatus::New, Decimal::ZERO)
        };
        let order_id = state.insert(MockOrder {
            symbol: request.symbol,
            side: request.side,
            quantity: request.quantity,
            limit_price: Some(request.limit_price),
            status,
            filled,
        });
        Ok(OrderPlacement {
            order_id,
            status,
            price: Some(request.limit_price),
        })
    }

    async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderPlacement, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::PlaceMarket {
            symbol: symbol.clone(),
            side,
            quantity,
        });
        if let Some(error) = state.market_failures.pop_front() {
            return Err(error);
        }

        let order_id = state.insert(MockOrder {
            symbol: symbol.clone(),
            side,
            quantity,
            limit_price: None,
            status: OrderStatus::Filled,
            filled: quantity,
        });
        Ok(OrderPlacement {
            order_id,
            status: OrderStatus::Filled,
            price: None,
        })
    }

    async fn cancel_order(&self, order_id: &BrokerOrderId) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::Cancel {
            order_id: order_id.clone(),
        });
        if let Some(error) = state.cancel_failures.pop_front() {
            return Err(error);
        }

        let status = state.order(order_id)?.status;
        if status.is_terminal() {
            return Err(BrokerError::OrderRejected {
                reason: format!("order {order_id} is already {status}"),
            });
        }
        if let Some(order) = state.orders.get_mut(order_id) {
            order.status = OrderStatus::Canceled;
        }
        state.cancelled.push(order_id.clone());
        Ok(())
    }

    async fn replace_order(
        &self,
        order_id: &BrokerOrderId,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderPlacement, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::Replace {
            order_id: order_id.clone(),
            quantity,
            price,
        });
        if !state.supports_replace {
            return Err(BrokerError::OrderRejected {
                reason: "replace not supported".to_string(),
            });
        }

        let original = state.order(order_id)?.clone();
        if original.status.is_terminal() {
            return Err(BrokerError::OrderRejected {
                reason: format!("order {order_id} is already {}", original.status),
            });
        }
        if let Some(order) = state.orders.get_mut(order_id) {
            order.status = OrderStatus::Canceled;
        }
        let new_id = state.insert(MockOrder {
            quantity,
            limit_price: Some(price),
            status: OrderStatus::New,
            filled: Decimal::ZERO,
            ..original
        });
        Ok(OrderPlacement {
            order_id: new_id,
            status: OrderStatus::New,
            price: Some(price),
        })
    }

    async fn get_order_execution_result(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<ExecutionReport, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::ExecutionResult {
            order_id: order_id.clone(),
        });
        let order = state.order(order_id)?;
        Ok(ExecutionReport {
            status: order.status,
            filled_qty: order.filled,
            avg_fill_price: (order.filled > Decimal::ZERO)
                .then_some(order.limit_price)
                .flatten(),
        })
    }

    async fn check_order_completion_status(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<OrderStatus, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::CompletionStatus {
            order_id: order_id.clone(),
        });
        Ok(state.order(order_id)?.status)
    }
}
