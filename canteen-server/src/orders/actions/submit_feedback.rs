use super::{ActionOutcome, CommandContext, CommandHandler};
use crate::orders::manager::ManagerError;
use shared::order::{Feedback, Notification};

/// Attach one feedback entry to an order
pub struct SubmitFeedbackAction {
    pub order_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

impl CommandHandler for SubmitFeedbackAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<ActionOutcome, ManagerError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ManagerError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                self.rating
            )));
        }

        let mut order = ctx.storage.load_order(ctx.txn, &self.order_id)?;

        if order.feedback.is_some() {
            return Err(ManagerError::FeedbackAlreadySubmitted(order.id.clone()));
        }

        order.feedback = Some(Feedback {
            rating: self.rating,
            comment: self.comment.clone(),
            submitted_at: ctx.now,
        });
        ctx.storage.store_order(ctx.txn, &order)?;

        tracing::info!(order_id = %order.id, rating = self.rating, "Feedback submitted");

        Ok(ActionOutcome {
            order_id: Some(order.id.clone()),
            notifications: vec![Notification::OrderUpdate { order }],
        })
    }
}
