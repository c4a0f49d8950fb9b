use super::*;
use shared::order::CommandErrorCode;

#[test]
fn place_and_complete_full_lifecycle() {
    let manager = create_test_manager();
    seed_student(&manager, "stu-1", 500);

    let order_id = place_order(
        &manager,
        "stu-1",
        vec![item("Masala Dosa", 40, 2, true)],
        PaymentMethod::Wallet,
    );

    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Placed);
    assert_eq!(order.total_amount, 80);
    assert!(order.token.starts_with("CTN"));

    // Token lookup resolves to the same order
    let by_token = manager.get_order_by_token(&order.token).unwrap();
    assert_eq!(by_token.id, order_id);

    progress_to(&manager, &order_id, OrderStatus::Completed);
    assert_eq!(
        manager.get_order(&order_id).unwrap().status,
        OrderStatus::Completed
    );

    // Wallet debited once, loyalty accrued at total / 10
    let user = manager.get_user("stu-1").unwrap();
    assert_eq!(user.balance, 420);
    assert_eq!(user.points, 8);

    let (year, month) = current_month(&manager);
    let ledger = manager.monthly_ledger(year, month).unwrap();
    assert_eq!(ledger.total_orders, 1);
    assert_eq!(ledger.completed_orders, 1);
    assert_eq!(ledger.total_revenue, 80);
}

#[test]
fn duplicate_command_runs_effects_once() {
    let manager = create_test_manager();
    seed_student(&manager, "stu-1", 500);

    let cmd = OrderCommand::new(
        "stu-1",
        OrderCommandPayload::PlaceOrder {
            draft: draft(
                "stu-1",
                vec![item("Thali", 100, 1, true)],
                PaymentMethod::Wallet,
            ),
        },
    );

    let first = manager.execute_command(&cmd);
    assert!(first.success);
    let replay = manager.execute_command(&cmd);
    assert!(replay.success);
    assert_eq!(replay.order_id, None);

    // One debit, one ledger entry
    assert_eq!(manager.get_user("stu-1").unwrap().balance, 400);
    let (year, month) = current_month(&manager);
    assert_eq!(manager.monthly_ledger(year, month).unwrap().total_orders, 1);
}

#[test]
fn duplicate_is_caught_under_the_write_lock() {
    // Drives process_command directly, skipping the read-path fast
    // check, the way a second racing submission would arrive
    let manager = create_test_manager();
    seed_student(&manager, "stu-1", 500);

    let cmd = OrderCommand::new(
        "stu-1",
        OrderCommandPayload::PlaceOrder {
            draft: draft(
                "stu-1",
                vec![item("Thali", 100, 1, true)],
                PaymentMethod::Wallet,
            ),
        },
    );

    let (first, _) = manager.process_command(&cmd).unwrap();
    assert!(first.success);
    assert!(first.order_id.is_some());

    let (replay, notifications) = manager.process_command(&cmd).unwrap();
    assert!(replay.success);
    assert_eq!(replay.order_id, None);
    assert!(notifications.is_empty());

    assert_eq!(manager.get_user("stu-1").unwrap().balance, 400);
}

#[test]
fn invalid_transition_leaves_order_untouched() {
    let manager = create_test_manager();
    seed_student(&manager, "stu-1", 500);
    let order_id = place_order(
        &manager,
        "stu-1",
        vec![item("Idli", 30, 1, true)],
        PaymentMethod::Wallet,
    );

    // Placed cannot jump straight to Ready
    let resp = set_status(&manager, &order_id, OrderStatus::Ready);
    assert!(!resp.success);
    assert_eq!(
        resp.error.unwrap().code,
        CommandErrorCode::InvalidTransition
    );
    assert_eq!(
        manager.get_order(&order_id).unwrap().status,
        OrderStatus::Placed
    );
}

#[test]
fn rejection_requires_a_reason_and_refunds() {
    let manager = create_test_manager();
    seed_student(&manager, "stu-1", 500);
    let order_id = place_order(
        &manager,
        "stu-1",
        vec![item("Idli", 30, 1, true)],
        PaymentMethod::Wallet,
    );

    let resp = set_status(&manager, &order_id, OrderStatus::Rejected);
    assert!(!resp.success);
    assert_eq!(resp.error.unwrap().code, CommandErrorCode::ValidationFailed);

    let cmd = OrderCommand::new(
        "cook-1",
        OrderCommandPayload::UpdateStatus {
            order_id: order_id.clone(),
            status: OrderStatus::Rejected,
            rejection_reason: Some("out of batter".to_string()),
        },
    );
    let resp = manager.execute_command(&cmd);
    assert!(resp.success);

    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(order.rejection_reason.as_deref(), Some("out of batter"));
    assert_eq!(manager.get_user("stu-1").unwrap().balance, 500);
}

#[test]
fn feedback_is_settable_exactly_once() {
    let manager = create_test_manager();
    seed_student(&manager, "stu-1", 500);
    let order_id = place_order(
        &manager,
        "stu-1",
        vec![item("Idli", 30, 1, true)],
        PaymentMethod::Wallet,
    );
    progress_to(&manager, &order_id, OrderStatus::Completed);

    let feedback = |rating: u8| {
        OrderCommand::new(
            "stu-1",
            OrderCommandPayload::SubmitFeedback {
                order_id: order_id.clone(),
                rating,
                comment: Some("good".to_string()),
            },
        )
    };

    let resp = manager.execute_command(&feedback(6));
    assert_eq!(
        resp.error.unwrap().code,
        CommandErrorCode::ValidationFailed
    );

    let resp = manager.execute_command(&feedback(5));
    assert!(resp.success);
    assert_eq!(
        manager.get_order(&order_id).unwrap().feedback.unwrap().rating,
        5
    );

    let resp = manager.execute_command(&feedback(1));
    assert_eq!(
        resp.error.unwrap().code,
        CommandErrorCode::FeedbackAlreadySubmitted
    );
}

#[test]
fn unknown_user_cannot_place_orders() {
    let manager = create_test_manager();
    let cmd = OrderCommand::new(
        "ghost",
        OrderCommandPayload::PlaceOrder {
            draft: draft(
                "ghost",
                vec![item("Idli", 30, 1, true)],
                PaymentMethod::Upi,
            ),
        },
    );
    let resp = manager.execute_command(&cmd);
    assert!(!resp.success);
    assert_eq!(resp.error.unwrap().code, CommandErrorCode::UserNotFound);
}

#[test]
fn empty_order_is_rejected() {
    let manager = create_test_manager();
    seed_student(&manager, "stu-1", 500);
    let cmd = OrderCommand::new(
        "stu-1",
        OrderCommandPayload::PlaceOrder {
            draft: draft("stu-1", vec![], PaymentMethod::Wallet),
        },
    );
    let resp = manager.execute_command(&cmd);
    assert_eq!(resp.error.unwrap().code, CommandErrorCode::ValidationFailed);
}

#[test]
fn notifications_fire_after_commit() {
    let manager = create_test_manager();
    seed_student(&manager, "stu-1", 500);
    let mut rx = manager.subscribe();

    let order_id = place_order(
        &manager,
        "stu-1",
        vec![item("Idli", 30, 1, true)],
        PaymentMethod::Wallet,
    );
    match rx.try_recv().unwrap() {
        Notification::NewOrder { order } => assert_eq!(order.id, order_id),
        other => panic!("expected NewOrder, got {:?}", other),
    }

    set_status(&manager, &order_id, OrderStatus::Preparing);
    match rx.try_recv().unwrap() {
        Notification::OrderUpdate { order } => {
            assert_eq!(order.status, OrderStatus::Preparing)
        }
        other => panic!("expected OrderUpdate, got {:?}", other),
    }

    // A failed command emits nothing
    let resp = set_status(&manager, &order_id, OrderStatus::Completed);
    assert!(!resp.success);
    assert!(rx.try_recv().is_err());
}
