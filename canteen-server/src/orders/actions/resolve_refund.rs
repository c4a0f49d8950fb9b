use super::{ActionOutcome, CommandContext, CommandHandler};
use crate::orders::manager::ManagerError;
use crate::orders::{ledger, wallet};
use crate::orders::ledger::LedgerAction;
use shared::order::{Notification, OrderStatus, RefundStatus};

/// Resolve a pending refund request
///
/// Approval pays out and fires a ledger `refunded` event unless the
/// order already had its money returned through another path: the
/// cancel/reject auto-refund or the rescue settlement. Those states
/// hard-fail with `RefundAlreadyIssued` so the same order can never be
/// paid twice.
pub struct ResolveRefundAction {
    pub order_id: String,
    pub approve: bool,
    /// Manager override; defaults to the request amount, then the
    /// order total
    pub refund_amount: Option<i64>,
}

/// States whose money movement already happened outside manual review
fn refund_already_issued(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::Cancelled
            | OrderStatus::Rejected
            | OrderStatus::AwaitingRescue
            | OrderStatus::Rescued
    )
}

impl CommandHandler for ResolveRefundAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<ActionOutcome, ManagerError> {
        let mut order = ctx.storage.load_order(ctx.txn, &self.order_id)?;

        let Some(request) = order.refund_request.clone() else {
            return Err(ManagerError::Validation(format!(
                "order {} has no refund request",
                order.id
            )));
        };
        if request.status != RefundStatus::Pending {
            return Err(ManagerError::RefundAlreadyResolved(order.id.clone()));
        }

        let mut request = request;
        if self.approve {
            if refund_already_issued(order.status) {
                return Err(ManagerError::RefundAlreadyIssued(order.id.clone()));
            }

            let amount = self
                .refund_amount
                .or(request.refund_amount)
                .unwrap_or(order.total_amount);
            wallet::adjust(ctx.storage, ctx.txn, &order.user_id, amount, 0)?;
            ledger::apply(
                ctx.storage,
                ctx.txn,
                &order,
                LedgerAction::Refunded { amount },
                ctx.config.timezone,
            )?;

            request.status = RefundStatus::Approved;
            request.refund_amount = Some(amount);
            tracing::info!(order_id = %order.id, amount, "Refund approved");
        } else {
            request.status = RefundStatus::Rejected;
            tracing::info!(order_id = %order.id, "Refund rejected");
        }
        request.resolved_at = Some(ctx.now);
        order.refund_request = Some(request);
        ctx.storage.store_order(ctx.txn, &order)?;

        Ok(ActionOutcome {
            order_id: Some(order.id.clone()),
            notifications: vec![Notification::OrderUpdate { order }],
        })
    }
}
