use super::*;
use shared::models::{User, UserRole};
use shared::order::{OrderDraft, OrderItem, OrderStatus, PaymentMethod};

mod test_lifecycle;

fn create_test_manager() -> CanteenManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    CanteenManager::with_storage(storage, Config::default())
}

fn create_test_manager_with_config(config: Config) -> CanteenManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    CanteenManager::with_storage(storage, config)
}

fn seed_student(manager: &CanteenManager, id: &str, balance: i64) {
    manager
        .storage()
        .upsert_user(&User {
            id: id.to_string(),
            name: format!("Student {}", id),
            role: UserRole::Student,
            balance,
            points: 0,
            created_at: 0,
        })
        .unwrap();
}

fn item(name: &str, price: i64, quantity: i64, is_refundable: bool) -> OrderItem {
    OrderItem {
        id: format!("itm-{}", name),
        name: name.to_string(),
        price,
        quantity,
        is_refundable,
        category: None,
    }
}

fn draft(user_id: &str, items: Vec<OrderItem>, payment_method: PaymentMethod) -> OrderDraft {
    OrderDraft {
        user_id: user_id.to_string(),
        branch: "Main".to_string(),
        items,
        payment_method,
        scheduled_time: None,
        flash_sale_id: None,
    }
}

/// Place an order and return its id, asserting success
fn place_order(
    manager: &CanteenManager,
    user_id: &str,
    items: Vec<OrderItem>,
    payment_method: PaymentMethod,
) -> String {
    let cmd = OrderCommand::new(
        user_id,
        OrderCommandPayload::PlaceOrder {
            draft: draft(user_id, items, payment_method),
        },
    );
    let resp = manager.execute_command(&cmd);
    assert!(resp.success, "place order failed: {:?}", resp.error);
    resp.order_id.unwrap()
}

fn set_status(manager: &CanteenManager, order_id: &str, status: OrderStatus) -> CommandResponse {
    let cmd = OrderCommand::new(
        "cook-1",
        OrderCommandPayload::UpdateStatus {
            order_id: order_id.to_string(),
            status,
            rejection_reason: None,
        },
    );
    manager.execute_command(&cmd)
}

/// Walk an order to a target status through the valid kitchen edges
fn progress_to(manager: &CanteenManager, order_id: &str, target: OrderStatus) {
    let path: &[OrderStatus] = match target {
        OrderStatus::Preparing => &[OrderStatus::Preparing],
        OrderStatus::Ready => &[OrderStatus::Preparing, OrderStatus::Ready],
        OrderStatus::Completed => &[
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
        ],
        other => panic!("no canned path to {}", other),
    };
    for status in path {
        let resp = set_status(manager, order_id, *status);
        assert!(resp.success, "transition to {} failed: {:?}", status, resp.error);
    }
}

/// The ledger month for orders created "now" in the test config's
/// timezone
fn current_month(manager: &CanteenManager) -> (i32, u32) {
    use chrono::Datelike;
    let local = chrono::Utc::now().with_timezone(&manager.config.timezone);
    (local.year(), local.month())
}
