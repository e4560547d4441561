//! # Order Status Machine
//!
//! ```text
//!                 ┌──────────┐
//!                 │ PENDING  │
//!                 └────┬─────┘
//!            ┌─────────┴──────────┐
//!            ▼                    │
//!       ┌──────────┐              │
//!       │   PAID   │──────────┐   │
//!       └────┬─────┘          │   │
//!            ▼                ▼   ▼
//!       ┌──────────┐     ┌───────────┐
//!       │DELIVERED │────►│ CANCELLED │  (terminal)
//!       └──────────┘     └───────────┘
//! ```
//!
//! Moving to the status an order already has is always accepted and
//! changes nothing, including on a cancelled order.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, OrderStatus};

/// Outcome of a status change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current status.
    Unchanged,
    Changed { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    /// Statuses reachable in one step (excluding staying put).
    pub const fn allowed_targets(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Paid, OrderStatus::Cancelled],
            OrderStatus::Paid => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered => &[OrderStatus::Cancelled],
            OrderStatus::Cancelled => &[],
        }
    }

    /// True when `target` is the current status or one step away.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        *self == target || self.allowed_targets().contains(&target)
    }

    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    /// Lines, tax rate and similar fields may only change while PENDING.
    #[inline]
    pub const fn is_editable(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

/// Validates a status change without applying it.
///
/// ## Returns
/// * `Ok(Transition::Unchanged)` - `from == to`
/// * `Ok(Transition::Changed)` - edge exists in the graph
/// * `Err(CoreError::InvalidTransition)` - anything else
pub fn check_transition(from: OrderStatus, to: OrderStatus) -> CoreResult<Transition> {
    if from == to {
        return Ok(Transition::Unchanged);
    }
    if from.allowed_targets().contains(&to) {
        Ok(Transition::Changed { from, to })
    } else {
        Err(CoreError::InvalidTransition { from, to })
    }
}

impl Order {
    /// Applies a status change, refreshing `updated_at` when it happens.
    pub fn transition_to(&mut self, target: OrderStatus, now: DateTime<Utc>) -> CoreResult<Transition> {
        let transition = check_transition(self.status, target)?;
        if let Transition::Changed { to, .. } = transition {
            self.status = to;
            self.updated_at = now;
        }
        Ok(transition)
    }

    /// Fails unless the order is still PENDING.
    pub fn ensure_editable(&self) -> CoreResult<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(CoreError::OrderNotEditable {
                order_number: self.order_number.clone(),
                status: self.status,
            })
        }
    }

    /// Cancels the order.
    ///
    /// Stricter than `transition_to(Cancelled)`: cancelling twice is an
    /// error, and a delivered order stays delivered.
    ///
    /// ## Errors
    /// * `OrderAlreadyCancelled` - status is CANCELLED
    /// * `OrderAlreadyDelivered` - status is DELIVERED
    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        match self.status {
            OrderStatus::Cancelled => {
                return Err(CoreError::OrderAlreadyCancelled {
                    order_number: self.order_number.clone(),
                })
            }
            OrderStatus::Delivered => {
                return Err(CoreError::OrderAlreadyDelivered {
                    order_number: self.order_number.clone(),
                })
            }
            OrderStatus::Pending | OrderStatus::Paid => {}
        }
        self.transition_to(OrderStatus::Cancelled, now)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
