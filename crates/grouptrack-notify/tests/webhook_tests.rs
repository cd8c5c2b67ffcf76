//! Integration tests for WebhookNotifier and NotificationDispatcher
//!
//! Uses wiremock to stand in for the chat webhook and verifies the posted
//! payloads, error mapping, and fire-and-forget ordering.

use std::sync::Arc;
use std::time::Duration;

use grouptrack_core::domain::{Group, GroupTag, Member, MemberId, MembershipEvent};
use grouptrack_core::ports::{INotifier, Notification};
use grouptrack_notify::{
    CollectingNotifier, MessageOptions, NotificationDispatcher, NotifyError, WebhookNotifier,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

async fn setup_webhook() -> (MockServer, WebhookNotifier) {
    let server = MockServer::start().await;
    let notifier = WebhookNotifier::new(
        format!("{}/api/webhooks/1/token", server.uri()),
        600,
        Duration::from_secs(5),
    )
    .expect("build notifier");
    (server, notifier)
}

fn tag(s: &str) -> GroupTag {
    GroupTag::new(s).unwrap()
}

fn id(s: &str) -> MemberId {
    MemberId::new(s).unwrap()
}

// ============================================================================
// WebhookNotifier
// ============================================================================

#[tokio::test]
async fn test_plain_text_is_posted_as_content() {
    let (server, notifier) = setup_webhook().await;

    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/token"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "content": "Group **alpha** has been deleted."
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    notifier
        .notify(&Notification::text("Group **alpha** has been deleted."))
        .await
        .expect("delivery should succeed");
}

#[tokio::test]
async fn test_transfer_alert_is_posted_as_embed() {
    let (server, notifier) = setup_webhook().await;

    let from_members: Group = vec![(id("2"), Member::new("Bob", false))]
        .into_iter()
        .collect();
    let to_members: Group = vec![
        (id("2"), Member::new("Bob", true)),
        (id("3"), Member::new("Carol", false)),
    ]
    .into_iter()
    .collect();
    let event = MembershipEvent::GroupTransfer {
        member: id("2"),
        name: "Bob".into(),
        from: tag("alpha"),
        from_members,
        to: tag("beta"),
        to_members,
    };
    let notification =
        grouptrack_notify::render(&event, &MessageOptions::with_alert_role("424242"));

    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({
            "content": "<@&424242>",
            "embeds": [{
                "title": "Group Change Detected for Bob (2)",
                "fields": [
                    { "name": "Old Group: alpha", "value": "Bob\u{1F534}", "inline": false },
                    { "name": "New Group: beta", "value": "Bob\u{1F7E2}, Carol\u{1F534}", "inline": false }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    notifier.notify(&notification).await.unwrap();
}

#[tokio::test]
async fn test_rejected_status_is_error() {
    let (server, notifier) = setup_webhook().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad embed"))
        .mount(&server)
        .await;

    let err = notifier
        .post(&Notification::text("x"))
        .await
        .expect_err("400 should fail");
    match err {
        NotifyError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "bad embed");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rate_limited_status_is_not_retried() {
    let (server, notifier) = setup_webhook().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
        .expect(1)
        .mount(&server)
        .await;

    let err = notifier.post(&Notification::text("x")).await.unwrap_err();
    assert!(matches!(
        err,
        NotifyError::RateLimited {
            retry_after: Some(s)
        } if s == 3.0
    ));
}

#[tokio::test]
async fn test_unreachable_sink_is_http_error() {
    let notifier =
        WebhookNotifier::new("http://127.0.0.1:9/hook", 60, Duration::from_secs(1)).unwrap();
    let err = notifier.post(&Notification::text("x")).await.unwrap_err();
    assert!(matches!(err, NotifyError::Http(_)));
}

// ============================================================================
// NotificationDispatcher
// ============================================================================

#[tokio::test]
async fn test_dispatcher_delivers_in_order() {
    let sink = CollectingNotifier::new();
    let dispatcher = NotificationDispatcher::spawn(Arc::new(sink.clone()), MessageOptions::default());

    dispatcher.dispatch_events(&[
        MembershipEvent::MemberLeft {
            member: id("2"),
            name: "Bob".into(),
            group: tag("alpha"),
        },
        MembershipEvent::MemberJoined {
            member: id("3"),
            name: "Carol".into(),
            group: tag("alpha"),
        },
    ]);
    dispatcher.dispatch(Notification::text("third"));
    dispatcher.close().await;

    let summaries: Vec<String> = sink
        .received()
        .iter()
        .map(|n| n.summary().to_string())
        .collect();
    assert_eq!(
        summaries,
        vec![
            "Member **Bob** (2) left group **alpha**".to_string(),
            "Member **Carol** (3) joined group **alpha**".to_string(),
            "third".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_dispatcher_survives_failed_deliveries() {
    let sink = CollectingNotifier::failing();
    let dispatcher = NotificationDispatcher::spawn(Arc::new(sink.clone()), MessageOptions::default());

    dispatcher.dispatch(Notification::text("one"));
    dispatcher.dispatch(Notification::text("two"));
    dispatcher.close().await;

    assert_eq!(sink.received().len(), 2);
}

#[tokio::test]
async fn test_dispatch_does_not_wait_for_slow_sink() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(server.uri(), 600, Duration::from_secs(5)).unwrap();
    let dispatcher = NotificationDispatcher::spawn(Arc::new(notifier), MessageOptions::default());

    let started = std::time::Instant::now();
    for i in 0..5 {
        dispatcher.dispatch(Notification::text(format!("n{i}")));
    }
    assert!(started.elapsed() < Duration::from_millis(500));
}
