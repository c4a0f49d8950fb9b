use super::{ActionOutcome, CommandContext, CommandHandler};
use crate::orders::manager::ManagerError;
use shared::order::{Notification, RefundRequest, RefundStatus};

/// Attach a pending refund request to an order
///
/// One request per order, whatever its state; resolution happens in
/// `ResolveRefundAction`. No money moves here.
pub struct RequestRefundAction {
    pub order_id: String,
    pub reason: String,
}

impl CommandHandler for RequestRefundAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<ActionOutcome, ManagerError> {
        if self.reason.trim().is_empty() {
            return Err(ManagerError::Validation(
                "refund request requires a reason".to_string(),
            ));
        }

        let mut order = ctx.storage.load_order(ctx.txn, &self.order_id)?;

        if let Some(existing) = &order.refund_request {
            return Err(match existing.status {
                RefundStatus::Pending => ManagerError::Validation(format!(
                    "order {} already has a pending refund request",
                    order.id
                )),
                _ => ManagerError::RefundAlreadyResolved(order.id.clone()),
            });
        }

        order.refund_request = Some(RefundRequest {
            status: RefundStatus::Pending,
            reason: self.reason.clone(),
            requested_at: ctx.now,
            refund_amount: None,
            resolved_at: None,
        });
        ctx.storage.store_order(ctx.txn, &order)?;

        tracing::info!(order_id = %order.id, "Refund requested");

        Ok(ActionOutcome {
            order_id: Some(order.id.clone()),
            notifications: vec![Notification::OrderUpdate { order }],
        })
    }
}
