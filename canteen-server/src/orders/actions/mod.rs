//! Command action implementations
//!
//! Each action handles one command type. Handlers run inside the
//! manager's write transaction and return the notifications to emit
//! after commit; nothing a handler does is visible externally until
//! the transaction commits.

use crate::core::Config;
use crate::orders::manager::ManagerError;
use crate::orders::storage::OrderStorage;
use crate::orders::{flash_sale, ledger, wallet};
use crate::orders::transition::Effect;
use redb::WriteTransaction;
use shared::order::{Notification, Order, OrderCommand, OrderCommandPayload};

mod place_order;
mod request_refund;
mod resolve_refund;
mod submit_feedback;
mod update_status;

pub use place_order::PlaceOrderAction;
pub use request_refund::RequestRefundAction;
pub use resolve_refund::ResolveRefundAction;
pub use submit_feedback::SubmitFeedbackAction;
pub use update_status::UpdateStatusAction;

/// Execution context shared by all handlers
pub struct CommandContext<'a> {
    pub txn: &'a WriteTransaction,
    pub storage: &'a OrderStorage,
    pub config: &'a Config,
    /// Server timestamp for this command (Unix millis)
    pub now: i64,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a OrderStorage,
        config: &'a Config,
        now: i64,
    ) -> Self {
        Self {
            txn,
            storage,
            config,
            now,
        }
    }

    /// Execute planned transition effects against an order
    pub fn apply_effects(&self, order: &Order, effects: &[Effect]) -> Result<(), ManagerError> {
        for effect in effects {
            match effect {
                Effect::Ledger(action) => {
                    ledger::apply(self.storage, self.txn, order, *action, self.config.timezone)?;
                }
                Effect::CreditWallet { amount } => {
                    wallet::adjust(self.storage, self.txn, &order.user_id, *amount, 0)?;
                }
                Effect::CreateRescueListing => {
                    flash_sale::create_listing(self.storage, self.txn, order, self.now)?;
                }
            }
        }
        Ok(())
    }
}

/// What a handler produced: the order it touched or created, and the
/// notifications to broadcast after commit
#[derive(Debug, Default)]
pub struct ActionOutcome {
    pub order_id: Option<String>,
    pub notifications: Vec<Notification>,
}

/// Command handler trait, one implementation per action
pub trait CommandHandler {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<ActionOutcome, ManagerError>;
}

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    PlaceOrder(PlaceOrderAction),
    UpdateStatus(UpdateStatusAction),
    RequestRefund(RequestRefundAction),
    ResolveRefund(ResolveRefundAction),
    SubmitFeedback(SubmitFeedbackAction),
}

impl CommandHandler for CommandAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<ActionOutcome, ManagerError> {
        match self {
            CommandAction::PlaceOrder(action) => action.execute(ctx),
            CommandAction::UpdateStatus(action) => action.execute(ctx),
            CommandAction::RequestRefund(action) => action.execute(ctx),
            CommandAction::ResolveRefund(action) => action.execute(ctx),
            CommandAction::SubmitFeedback(action) => action.execute(ctx),
        }
    }
}

impl CommandAction {
    /// Convert a command into its action
    ///
    /// `token` is the pre-generated order token; it is required for
    /// `PlaceOrder` and ignored by everything else (the manager
    /// allocates it outside the main transaction because redb does not
    /// nest writes). This is the only place that matches on
    /// `OrderCommandPayload`.
    pub fn from_command(cmd: &OrderCommand, token: Option<String>) -> Self {
        match &cmd.payload {
            OrderCommandPayload::PlaceOrder { draft } => {
                CommandAction::PlaceOrder(PlaceOrderAction {
                    draft: draft.clone(),
                    token: token.unwrap_or_default(),
                })
            }
            OrderCommandPayload::UpdateStatus {
                order_id,
                status,
                rejection_reason,
            } => CommandAction::UpdateStatus(UpdateStatusAction {
                order_id: order_id.clone(),
                status: *status,
                rejection_reason: rejection_reason.clone(),
            }),
            OrderCommandPayload::RequestRefund { order_id, reason } => {
                CommandAction::RequestRefund(RequestRefundAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
            OrderCommandPayload::ResolveRefund {
                order_id,
                approve,
                refund_amount,
            } => CommandAction::ResolveRefund(ResolveRefundAction {
                order_id: order_id.clone(),
                approve: *approve,
                refund_amount: *refund_amount,
            }),
            OrderCommandPayload::SubmitFeedback {
                order_id,
                rating,
                comment,
            } => CommandAction::SubmitFeedback(SubmitFeedbackAction {
                order_id: order_id.clone(),
                rating: *rating,
                comment: comment.clone(),
            }),
        }
    }
}
