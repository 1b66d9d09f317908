use crate::test_support::TestApp;
use axum::http::{Method, StatusCode};
use serde_json::json;
use shared::dto::{ConnectionStatus, ConnectionView, ConversationsListResponse, RelayEvent, UserRole};

async fn two_users(app: &TestApp) -> ((i64, String), (i64, String)) {
    let student = app.user("ada@uni.edu", "Ada Lovelace", UserRole::Student).await;
    let alumnus = app.user("grace@corp.com", "Grace Hopper", UserRole::Alumni).await;
    (student, alumnus)
}

// ========== Create ==========

#[tokio::test]
async fn test_create_connection_is_pending_and_notifies_both() {
    let app = TestApp::new().await;
    let ((ada, ada_token), (grace, _)) = two_users(&app).await;
    let mut ada_events = app.state.relay.subscribe_user(ada).await;
    let mut grace_events = app.state.relay.subscribe_user(grace).await;

    let (status, body) = app
        .send(Method::POST, "/api/connections", Some(&ada_token), Some(json!({"receiver_id": grace})))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let view: ConnectionView = serde_json::from_value(body).unwrap();
    assert_eq!(view.status, ConnectionStatus::Pending);
    assert!(view.is_requester);
    assert_eq!(view.counterpart.full_name, "Grace Hopper");

    for rx in [&mut ada_events, &mut grace_events] {
        match rx.recv().await.unwrap() {
            RelayEvent::ConnectionRequested { connection } => assert_eq!(connection.id, view.id),
            other => panic!("unexpected event {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_create_connection_with_self() {
    let app = TestApp::new().await;
    let ((ada, ada_token), _) = two_users(&app).await;

    let (status, body) = app
        .send(Method::POST, "/api/connections", Some(&ada_token), Some(json!({"receiver_id": ada})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SelfConnection");
}

#[tokio::test]
async fn test_create_connection_unknown_receiver() {
    let app = TestApp::new().await;
    let ((_, ada_token), _) = two_users(&app).await;

    let (status, body) = app
        .send(Method::POST, "/api/connections", Some(&ada_token), Some(json!({"receiver_id": 4242})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NotFound");
}

#[tokio::test]
async fn test_duplicate_connection_in_either_direction() {
    let app = TestApp::new().await;
    let ((ada, ada_token), (grace, grace_token)) = two_users(&app).await;

    let (status, _) = app
        .send(Method::POST, "/api/connections", Some(&ada_token), Some(json!({"receiver_id": grace})))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(Method::POST, "/api/connections", Some(&ada_token), Some(json!({"receiver_id": grace})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DuplicateConnection");

    let (status, body) = app
        .send(Method::POST, "/api/connections", Some(&grace_token), Some(json!({"receiver_id": ada})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DuplicateConnection");
}

// ========== List ==========

#[tokio::test]
async fn test_list_connections_both_sides_and_filter() {
    let app = TestApp::new().await;
    let ((ada, ada_token), (grace, _)) = two_users(&app).await;
    let (alan, _) = app.user("alan@corp.com", "Alan Turing", UserRole::Alumni).await;

    app.connection(ada, grace, ConnectionStatus::Pending).await;
    app.connection(alan, ada, ConnectionStatus::Accepted).await;

    let (status, body) = app.send(Method::GET, "/api/connections", Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let connections: Vec<ConnectionView> = serde_json::from_value(body["connections"].clone()).unwrap();
    assert_eq!(connections.len(), 2);

    let with_alan = connections.iter().find(|c| c.counterpart.id == alan).unwrap();
    assert!(!with_alan.is_requester);
    assert_eq!(with_alan.status, ConnectionStatus::Accepted);

    let (_, body) = app
        .send(Method::GET, "/api/connections?status=pending", Some(&ada_token), None)
        .await;
    let pending: Vec<ConnectionView> = serde_json::from_value(body["connections"].clone()).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].counterpart.id, grace);
}

// ========== Status ==========

#[tokio::test]
async fn test_only_receiver_can_answer() {
    let app = TestApp::new().await;
    let ((ada, ada_token), (grace, _)) = two_users(&app).await;
    let (_, alan_token) = app.user("alan@corp.com", "Alan Turing", UserRole::Alumni).await;
    let id = app.connection(ada, grace, ConnectionStatus::Pending).await;
    let uri = format!("/api/connections/{}/status", id);

    let (status, body) = app
        .send(Method::POST, &uri, Some(&ada_token), Some(json!({"status": "accepted"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "Unauthorized");

    let (status, body) = app
        .send(Method::POST, &uri, Some(&alan_token), Some(json!({"status": "accepted"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "Unauthorized");
}

#[tokio::test]
async fn test_accept_is_final_and_notifies() {
    let app = TestApp::new().await;
    let ((ada, _), (grace, grace_token)) = two_users(&app).await;
    let id = app.connection(ada, grace, ConnectionStatus::Pending).await;
    let uri = format!("/api/connections/{}/status", id);
    let mut ada_events = app.state.relay.subscribe_user(ada).await;

    let (status, body) = app
        .send(Method::POST, &uri, Some(&grace_token), Some(json!({"status": "accepted"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["is_requester"], false);
    assert_eq!(body["counterpart"]["id"], ada);

    match ada_events.recv().await.unwrap() {
        RelayEvent::ConnectionUpdated { connection } => assert_eq!(connection.status, ConnectionStatus::Accepted),
        other => panic!("unexpected event {:?}", other),
    }

    let (status, body) = app
        .send(Method::POST, &uri, Some(&grace_token), Some(json!({"status": "rejected"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "InvalidTransition");
}

#[tokio::test]
async fn test_back_to_pending_and_unknown_connection() {
    let app = TestApp::new().await;
    let ((ada, _), (grace, grace_token)) = two_users(&app).await;
    let id = app.connection(ada, grace, ConnectionStatus::Pending).await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/connections/{}/status", id),
            Some(&grace_token),
            Some(json!({"status": "pending"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "InvalidTransition");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/connections/9999/status",
            Some(&grace_token),
            Some(json!({"status": "accepted"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ========== Conversations ==========

#[tokio::test]
async fn test_conversations_sorted_by_activity_with_unread() {
    let app = TestApp::new().await;
    let ((ada, ada_token), (grace, grace_token)) = two_users(&app).await;
    let (alan, _) = app.user("alan@corp.com", "Alan Turing", UserRole::Alumni).await;
    let (bob, _) = app.user("bob@uni.edu", "Bob", UserRole::Student).await;

    let with_grace = app.connection(ada, grace, ConnectionStatus::Accepted).await;
    let with_alan = app.connection(alan, ada, ConnectionStatus::Accepted).await;
    app.connection(ada, bob, ConnectionStatus::Pending).await;

    // The newer connection has no messages; the older one gets one afterwards.
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/connections/{}/messages", with_grace),
            Some(&grace_token),
            Some(json!({"content": "Happy to help with compilers"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send(Method::GET, "/api/conversations", Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list: ConversationsListResponse = serde_json::from_value(body).unwrap();

    let ids: Vec<i64> = list.conversations.iter().map(|c| c.connection_id).collect();
    assert_eq!(ids, vec![with_grace, with_alan]);

    let first = &list.conversations[0];
    assert_eq!(first.unread_count, 1);
    assert_eq!(first.last_message_preview.as_deref(), Some("Happy to help with compilers"));
    assert_eq!(first.counterpart.full_name, "Grace Hopper");
    assert!(list.conversations[1].last_message.is_none());
}
