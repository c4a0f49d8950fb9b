//! Order status transition table and side-effect planning
//!
//! The transition rules live here as data, separate from their
//! execution. `plan_transition` inspects the previous order snapshot
//! and the requested status and returns the effective next status plus
//! the list of side-effect intents; the action handler executes those
//! intents inside its write transaction. Every effect is gated on the
//! previous state NOT already satisfying the target condition, which
//! is what makes repeated updates idempotent.

use crate::core::RescueRefundPolicy;
use crate::orders::ledger::LedgerAction;
use shared::order::{Order, OrderStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {from} -> {to}")]
    Invalid { from: OrderStatus, to: OrderStatus },

    #[error("Status {0} is assigned by the system and cannot be requested")]
    SystemAssigned(OrderStatus),

    #[error("Rejection requires a reason")]
    MissingRejectionReason,
}

/// Side-effect intent produced by planning a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Apply a ledger delta for the order's creation month
    Ledger(LedgerAction),
    /// Credit the order's user wallet (auto-refund path)
    CreditWallet { amount: i64 },
    /// Create a rescue listing for the order's non-refundable items
    CreateRescueListing,
}

/// Planned outcome of a status update
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    /// Effective resulting status (may differ from the requested one
    /// when cancellation is intercepted into `AwaitingRescue`)
    pub status: OrderStatus,
    pub effects: Vec<Effect>,
}

/// Whether `to` is directly reachable from `from`
///
/// This is the raw table; cancellation interception is layered on top
/// by `plan_transition`.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Placed, Preparing)
            | (Placed, Rejected)
            | (Placed, Cancelled)
            | (Preparing, Ready)
            | (Preparing, Cancelled)
            | (Ready, PickedUp)
            | (Ready, Completed)
            | (AwaitingRescue, Rescued)
    )
}

/// Plan a requested status update against the previous order snapshot
///
/// Returns the effective status and the side effects to execute. The
/// caller provides the rescue refund policy for the interception case.
pub fn plan_transition(
    order: &Order,
    requested: OrderStatus,
    rejection_reason: Option<&str>,
    policy: RescueRefundPolicy,
) -> Result<TransitionPlan, TransitionError> {
    // Rescue states are only ever produced by the state machine itself
    if matches!(
        requested,
        OrderStatus::AwaitingRescue | OrderStatus::Rescued
    ) {
        return Err(TransitionError::SystemAssigned(requested));
    }

    if !is_valid_transition(order.status, requested) {
        return Err(TransitionError::Invalid {
            from: order.status,
            to: requested,
        });
    }

    if requested == OrderStatus::Rejected && rejection_reason.is_none() {
        return Err(TransitionError::MissingRejectionReason);
    }

    // Cancellation interception: a preparing order with non-refundable
    // items goes to AwaitingRescue instead of Cancelled and spawns a
    // rescue listing. The refundable portion is held or paid out per
    // policy; no ledger `cancelled` event fires in this branch.
    if requested == OrderStatus::Cancelled
        && order.status == OrderStatus::Preparing
        && order.has_non_refundable_items()
    {
        let mut effects = vec![Effect::CreateRescueListing];
        if policy == RescueRefundPolicy::RefundImmediately && order.approved_refund_amount() == 0 {
            let refundable = order.refundable_subtotal();
            if refundable > 0 {
                effects.push(Effect::CreditWallet { amount: refundable });
                effects.push(Effect::Ledger(LedgerAction::Refunded { amount: refundable }));
            }
        }
        return Ok(TransitionPlan {
            status: OrderStatus::AwaitingRescue,
            effects,
        });
    }

    let mut effects = Vec::new();
    match requested {
        // Fires once: the table forbids re-entering Completed
        OrderStatus::Completed => {
            effects.push(Effect::Ledger(LedgerAction::Completed));
        }
        OrderStatus::Cancelled | OrderStatus::Rejected => {
            // Auto-refund XOR manual refund: an approved manual
            // refund means this order's money already moved
            let auto_refund = if order.approved_refund_amount() > 0 {
                0
            } else {
                order.refundable_subtotal()
            };
            effects.push(Effect::Ledger(LedgerAction::Cancelled {
                auto_refunded: auto_refund,
            }));
            if auto_refund > 0 {
                effects.push(Effect::CreditWallet {
                    amount: auto_refund,
                });
            }
        }
        _ => {}
    }

    Ok(TransitionPlan {
        status: requested,
        effects,
    })
}
