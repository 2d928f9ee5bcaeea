use mockall::mock;
use order_index::{
    board::{BoardView, OrderDetail, EMPTY_BUCKET_PLACEHOLDER},
    events::{update_feed, PushEvent},
    order_types::{DashboardSnapshot, Order, OrderId, OrderStatus},
    ActionError,
    ActionReceipt,
    Dashboard,
    DashboardView,
    OrderActions,
    MISSING_REASON_PROMPT,
};

mock! {
    pub Actions {}
    impl OrderActions for Actions {
        async fn confirm_order(&self, order_id: &OrderId, comment: Option<String>) -> Result<ActionReceipt, ActionError>;
        async fn cancel_order(&self, order_id: &OrderId, reason: String) -> Result<ActionReceipt, ActionError>;
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Drawn {
    Board(BoardView),
    Detail(OrderDetail),
    DetailClosed,
    Error(String),
    Prompt(String),
}

#[derive(Default)]
struct RecordingView {
    drawn: Vec<Drawn>,
}

impl RecordingView {
    fn last_board(&self) -> &BoardView {
        self.drawn
            .iter()
            .rev()
            .find_map(|d| match d {
                Drawn::Board(b) => Some(b),
                _ => None,
            })
            .expect("Nothing rendered")
    }

    fn last(&self) -> Option<&Drawn> {
        self.drawn.last()
    }
}

impl DashboardView for RecordingView {
    fn render_board(&mut self, board: &BoardView) {
        self.drawn.push(Drawn::Board(board.clone()));
    }

    fn show_detail(&mut self, detail: &OrderDetail) {
        self.drawn.push(Drawn::Detail(detail.clone()));
    }

    fn close_detail(&mut self) {
        self.drawn.push(Drawn::DetailClosed);
    }

    fn show_error(&mut self, message: &str) {
        self.drawn.push(Drawn::Error(message.to_string()));
    }

    fn prompt(&mut self, message: &str) {
        self.drawn.push(Drawn::Prompt(message.to_string()));
    }
}

fn dashboard_with_new_order() -> Dashboard<RecordingView> {
    let mut dashboard = Dashboard::new(RecordingView::default());
    let snapshot = DashboardSnapshot { new_orders: vec![Order::new(1u64, OrderStatus::New)], ..Default::default() };
    dashboard.load_snapshot(snapshot);
    dashboard
}

fn column_ids(board: &BoardView, status: OrderStatus) -> Vec<String> {
    board.column(&status).unwrap().order_ids().iter().map(|id| id.as_str().to_string()).collect()
}

fn receipt(kind: &str, id: u64, status: OrderStatus) -> ActionReceipt {
    ActionReceipt { event_type: Some(kind.to_string()), order: Some(Order::new(id, status)) }
}

#[test]
fn snapshot_renders_the_board() {
    let _ = env_logger::try_init();
    let dashboard = dashboard_with_new_order();
    let board = dashboard.view().last_board();
    assert_eq!(column_ids(board, OrderStatus::New), vec!["1"]);
    for status in [OrderStatus::Confirmed, OrderStatus::Canceled] {
        let column = board.column(&status).unwrap();
        assert!(column.is_placeholder());
        assert_eq!(column.entries, order_index::board::ColumnEntries::Placeholder(EMPTY_BUCKET_PLACEHOLDER));
    }
}

#[test]
fn push_event_moves_the_order() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let outcome = dashboard.apply_message(r#"{"order":{"id":1,"status":"CONFIRMED"}}"#);
    assert!(outcome.is_some());
    let board = dashboard.view().last_board();
    assert!(board.column(&OrderStatus::New).unwrap().is_placeholder());
    assert_eq!(column_ids(board, OrderStatus::Confirmed), vec!["1"]);
    assert!(board.column(&OrderStatus::Canceled).unwrap().is_placeholder());
}

#[test]
fn malformed_events_change_nothing() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let drawn = dashboard.view().drawn.len();
    for message in ["{}", r#"{"order": null}"#, r#"{"order": {"status": "NEW"}}"#, "garbage"] {
        assert_eq!(dashboard.apply_message(message), None);
    }
    assert_eq!(dashboard.apply_event(PushEvent::default()), None);
    assert_eq!(dashboard.view().drawn.len(), drawn);
    assert_eq!(dashboard.index().len(), 1);
    assert_eq!(dashboard.index().status_of(&OrderId::from(1u64)), Some(&OrderStatus::New));
}

#[tokio::test]
async fn blank_cancel_reason_prompts_and_sends_nothing() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let mut actions = MockActions::new();
    actions.expect_cancel_order().never();
    actions.expect_confirm_order().never();
    let id = OrderId::from(1u64);
    dashboard.open_order(&id);
    let err = dashboard.cancel(&actions, &id, "   ").await.unwrap_err();
    assert_eq!(err, ActionError::MissingReason);
    assert_eq!(dashboard.view().last(), Some(&Drawn::Prompt(MISSING_REASON_PROMPT.to_string())));
    // The detail stays open so the operator can fill in a reason
    assert_eq!(dashboard.active_order_id(), Some(&id));
}

#[tokio::test]
async fn successful_confirm_closes_the_detail_but_leaves_the_board() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let mut actions = MockActions::new();
    actions
        .expect_confirm_order()
        .withf(|id, comment| id.as_str() == "1" && comment.is_none())
        .times(1)
        .returning(|_, _| Ok(receipt("CONFIRMED", 1, OrderStatus::Confirmed)));
    let id = OrderId::from(1u64);
    assert!(dashboard.open_order(&id));
    let receipt = dashboard.confirm(&actions, &id, Some("  ")).await.unwrap();
    assert_eq!(receipt.event_type.as_deref(), Some("CONFIRMED"));
    assert_eq!(dashboard.view().last(), Some(&Drawn::DetailClosed));
    assert_eq!(dashboard.active_order_id(), None);
    // No optimistic update: the order waits for the feed
    assert_eq!(dashboard.index().status_of(&id), Some(&OrderStatus::New));
    assert_eq!(column_ids(dashboard.view().last_board(), OrderStatus::New), vec!["1"]);
}

#[tokio::test]
async fn cancel_sends_the_trimmed_reason() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let mut actions = MockActions::new();
    actions
        .expect_cancel_order()
        .withf(|id, reason| id.as_str() == "1" && reason.as_str() == "Customer changed their mind")
        .times(1)
        .returning(|_, _| Ok(receipt("CANCELED", 1, OrderStatus::Canceled)));
    let id = OrderId::from(1u64);
    dashboard.cancel(&actions, &id, "  Customer changed their mind\n").await.unwrap();
    assert_eq!(dashboard.index().status_of(&id), Some(&OrderStatus::New));
}

#[tokio::test]
async fn server_errors_are_surfaced_verbatim() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let mut actions = MockActions::new();
    actions
        .expect_confirm_order()
        .withf(|_, comment| comment.as_deref() == Some("rush"))
        .returning(|_, _| Err(ActionError::rejected(409, Some("Order is not in NEW state".into()))));
    let id = OrderId::from(1u64);
    dashboard.open_order(&id);
    let err = dashboard.confirm(&actions, &id, Some(" rush ")).await.unwrap_err();
    assert_eq!(err, ActionError::Rejected { status: 409, message: "Order is not in NEW state".into() });
    assert_eq!(dashboard.view().last(), Some(&Drawn::Error("Order is not in NEW state".into())));
    // Failure keeps the detail open
    assert_eq!(dashboard.active_order_id(), Some(&id));
}

#[tokio::test]
async fn finished_orders_are_not_sent() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    dashboard.apply_update(Order::new(1u64, OrderStatus::Confirmed));
    let mut actions = MockActions::new();
    actions.expect_confirm_order().never();
    actions.expect_cancel_order().never();
    let id = OrderId::from(1u64);
    let err = dashboard.confirm(&actions, &id, None).await.unwrap_err();
    assert!(matches!(err, ActionError::NotActionable { status: OrderStatus::Confirmed, .. }));
    let err = dashboard.cancel(&actions, &id, "too late").await.unwrap_err();
    assert!(matches!(err, ActionError::NotActionable { .. }));
    assert!(matches!(dashboard.view().last(), Some(Drawn::Error(_))));
}

#[tokio::test]
async fn unknown_orders_are_left_to_the_server() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let mut actions = MockActions::new();
    actions
        .expect_confirm_order()
        .withf(|id, _| id.as_str() == "99")
        .times(1)
        .returning(|_, _| Err(ActionError::rejected(404, None)));
    let err = dashboard.confirm(&actions, &OrderId::from(99u64), None).await.unwrap_err();
    assert_eq!(err.to_string(), "Operation failed");
}

#[test]
fn selection_follows_the_order_between_buckets() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let id = OrderId::from(1u64);
    assert!(dashboard.open_order(&id));
    let mut canceled = Order::new(1u64, OrderStatus::Canceled);
    canceled.cancellation_reason = Some("Duplicate order".into());
    dashboard.apply_update(canceled);
    assert_eq!(dashboard.active_order().map(|o| &o.status), Some(&OrderStatus::Canceled));
    match dashboard.view().last() {
        Some(Drawn::Detail(detail)) => {
            assert_eq!(detail.status, OrderStatus::Canceled);
            assert_eq!(detail.cancellation_reason.as_deref(), Some("Duplicate order"));
            assert!(!detail.actionable);
        },
        other => panic!("Expected a refreshed detail view, got {other:?}"),
    }
    // Updates to other orders leave the detail alone
    dashboard.apply_update(Order::new(2u64, OrderStatus::New));
    assert!(matches!(dashboard.view().last(), Some(Drawn::Board(_))));
}

#[test]
fn unknown_ids_do_not_open() {
    let mut dashboard = dashboard_with_new_order();
    assert!(dashboard.open_order(&OrderId::from(1u64)));
    assert!(!dashboard.open_order(&OrderId::from(42u64)));
    assert_eq!(dashboard.active_order_id(), Some(&OrderId::from(1u64)));
    dashboard.close_detail();
    assert_eq!(dashboard.active_order(), None);
}

#[tokio::test]
async fn following_a_feed_applies_every_update_in_order() {
    let _ = env_logger::try_init();
    let mut dashboard = dashboard_with_new_order();
    let (producer, mut feed) = update_feed(2);
    tokio::spawn(async move {
        producer.publish(Order::new(2u64, OrderStatus::New)).await;
        producer.publish(Order::new(1u64, OrderStatus::Confirmed)).await;
        producer.publish(Order::new(1u64, OrderStatus::Canceled)).await;
    });
    let applied = dashboard.follow(&mut feed).await;
    assert_eq!(applied, 3);
    let board = dashboard.view().last_board();
    assert_eq!(column_ids(board, OrderStatus::New), vec!["2"]);
    assert!(board.column(&OrderStatus::Confirmed).unwrap().is_placeholder());
    assert_eq!(column_ids(board, OrderStatus::Canceled), vec!["1"]);
}
