use super::{ActionOutcome, CommandContext, CommandHandler};
use crate::orders::manager::ManagerError;
use crate::orders::{flash_sale, ledger, wallet};
use crate::orders::ledger::LedgerAction;
use shared::order::{
    Notification, Order, OrderDraft, OrderItem, OrderStatus, PaymentMethod,
};

/// Place a new order, optionally claiming a rescue listing first
///
/// Everything here shares the manager's write transaction: the claim,
/// the original buyer's credit, the new order, the payment debit and
/// the ledger event land together or not at all.
pub struct PlaceOrderAction {
    pub draft: OrderDraft,
    /// Pre-generated human-facing token
    pub token: String,
}

impl PlaceOrderAction {
    fn validate(&self) -> Result<(), ManagerError> {
        if self.draft.items.is_empty() {
            return Err(ManagerError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }
        for item in &self.draft.items {
            if item.quantity < 1 {
                return Err(ManagerError::Validation(format!(
                    "item {} has non-positive quantity",
                    item.name
                )));
            }
            if item.price < 0 {
                return Err(ManagerError::Validation(format!(
                    "item {} has negative price",
                    item.name
                )));
            }
        }
        if self.draft.branch.trim().is_empty() {
            return Err(ManagerError::Validation("branch is required".to_string()));
        }
        Ok(())
    }
}

impl CommandHandler for PlaceOrderAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<ActionOutcome, ManagerError> {
        self.validate()?;

        // The buyer must exist before any money moves
        ctx.storage.load_user(ctx.txn, &self.draft.user_id)?;

        let mut outcome = ActionOutcome::default();

        // Rescue purchase: claim the listing, pay the original buyer
        // their partial refund and close out the stranded order
        if let Some(flash_sale_id) = &self.draft.flash_sale_id {
            let sale = flash_sale::claim_listing(
                ctx.storage,
                ctx.txn,
                flash_sale_id,
                ctx.now,
                ctx.config.flash_sale_ttl_ms(),
            )?;
            wallet::adjust(
                ctx.storage,
                ctx.txn,
                &sale.original_user_id,
                sale.refund_amount,
                0,
            )?;

            let mut original = ctx.storage.load_order(ctx.txn, &sale.original_order_id)?;
            original.status = OrderStatus::Rescued;
            ctx.storage.store_order(ctx.txn, &original)?;

            tracing::info!(
                flash_sale_id = %sale.id,
                original_order_id = %original.id,
                refund_amount = sale.refund_amount,
                "Rescue listing claimed"
            );
            outcome
                .notifications
                .push(Notification::OrderUpdate { order: original });
        }

        let total_amount: i64 = self.draft.items.iter().map(OrderItem::line_total).sum();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            token: self.token.clone(),
            user_id: self.draft.user_id.clone(),
            branch: self.draft.branch.clone(),
            items: self.draft.items.clone(),
            total_amount,
            payment_method: self.draft.payment_method,
            status: OrderStatus::Placed,
            created_at: ctx.now,
            scheduled_time: self.draft.scheduled_time,
            feedback: None,
            refund_request: None,
            rejection_reason: None,
        };

        // Wallet pays from the stored balance; UPI settles outside and
        // only accrues loyalty points here
        let points = ctx.config.loyalty_points_for(total_amount);
        match order.payment_method {
            PaymentMethod::Wallet => {
                wallet::adjust(ctx.storage, ctx.txn, &order.user_id, -total_amount, points)?;
            }
            PaymentMethod::Upi => {
                wallet::adjust(ctx.storage, ctx.txn, &order.user_id, 0, points)?;
            }
        }

        ctx.storage.store_order(ctx.txn, &order)?;
        ctx.storage.index_token(ctx.txn, &order.token, &order.id)?;
        ledger::apply(ctx.storage, ctx.txn, &order, LedgerAction::New, ctx.config.timezone)?;

        tracing::info!(
            order_id = %order.id,
            token = %order.token,
            user_id = %order.user_id,
            total_amount,
            payment_method = ?order.payment_method,
            "Order placed"
        );

        outcome.order_id = Some(order.id.clone());
        outcome.notifications.push(Notification::NewOrder { order });
        Ok(outcome)
    }
}
