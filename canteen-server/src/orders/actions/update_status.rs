use super::{ActionOutcome, CommandContext, CommandHandler};
use crate::orders::manager::ManagerError;
use crate::orders::transition;
use shared::order::{Notification, OrderStatus};

/// Move an order through the status table
///
/// The plan is computed from the stored snapshot, so the effective
/// status may differ from the requested one (cancellation
/// interception). The emitted notification carries the final state.
pub struct UpdateStatusAction {
    pub order_id: String,
    pub status: OrderStatus,
    pub rejection_reason: Option<String>,
}

impl CommandHandler for UpdateStatusAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<ActionOutcome, ManagerError> {
        let mut order = ctx.storage.load_order(ctx.txn, &self.order_id)?;

        let plan = transition::plan_transition(
            &order,
            self.status,
            self.rejection_reason.as_deref(),
            ctx.config.rescue_refund_policy,
        )?;

        ctx.apply_effects(&order, &plan.effects)?;

        let previous = order.status;
        order.status = plan.status;
        if plan.status == OrderStatus::Rejected {
            order.rejection_reason = self.rejection_reason.clone();
        }
        ctx.storage.store_order(ctx.txn, &order)?;

        tracing::info!(
            order_id = %order.id,
            from = %previous,
            requested = %self.status,
            to = %order.status,
            "Order status updated"
        );

        Ok(ActionOutcome {
            order_id: Some(order.id.clone()),
            notifications: vec![Notification::OrderUpdate { order }],
        })
    }
}
