#![cfg(feature = "server")]

use intent_mail::adapters::DryRunSender;
use intent_mail::server::{self, DISPATCH_PATH};
use intent_mail::{AddPolicy, ContactStore, Dispatcher, EmailAddress};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn spawn_server(policy: AddPolicy) -> (String, Dispatcher) {
    let store = ContactStore::with_contacts(
        vec![(
            "jim".to_string(),
            EmailAddress::parse("jim@example.com").unwrap(),
        )],
        policy,
    );
    let dispatcher = Dispatcher::new(store.into_shared(), Arc::new(DryRunSender));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, dispatcher.clone()));

    (format!("http://{}", addr), dispatcher)
}

#[tokio::test]
async fn test_healthz() {
    let (base, _) = spawn_server(AddPolicy::Overwrite).await;

    let response = reqwest::get(format!("{}/healthz", base)).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_add_contact_then_list() {
    let (base, dispatcher) = spawn_server(AddPolicy::Overwrite).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}{}", base, DISPATCH_PATH))
        .json(&json!({"type": "update", "action": "add", "name": "amy", "email": "amy@test.org"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["report"]["kind"], "contact_changed");
    assert_eq!(body["report"]["change"]["change"], "added");

    let contacts: Value = client
        .get(format!("{}/contacts", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        contacts,
        json!([
            {"name": "amy", "email": "amy@test.org"},
            {"name": "jim", "email": "jim@example.com"}
        ])
    );
    assert_eq!(dispatcher.contacts().lock().await.len(), 2);
}

#[tokio::test]
async fn test_email_intent_is_sent() {
    let (base, _) = spawn_server(AddPolicy::Overwrite).await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", base, DISPATCH_PATH))
        .json(&json!({"type": "email", "receiver": "jim@example.com", "subject": "Hi", "body": ""}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["report"]["kind"], "mail_sent");
    assert_eq!(body["report"]["to"], "jim@example.com");
}

#[tokio::test]
async fn test_invalid_email_is_rejected_before_dispatch() {
    let (base, dispatcher) = spawn_server(AddPolicy::Overwrite).await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", base, DISPATCH_PATH))
        .json(&json!({"type": "update", "action": "add", "name": "bob", "email": "not-an-email"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    assert!(dispatcher.contacts().lock().await.get("bob").is_none());
}

#[tokio::test]
async fn test_delete_unknown_contact_is_not_found() {
    let (base, _) = spawn_server(AddPolicy::Overwrite).await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", base, DISPATCH_PATH))
        .json(&json!({"type": "update", "action": "delete", "name": "ghost", "email": "ghost@example.com"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_existing_contact_conflicts_when_overwrite_disabled() {
    let (base, dispatcher) = spawn_server(AddPolicy::RejectExisting).await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", base, DISPATCH_PATH))
        .json(&json!({"type": "update", "action": "add", "name": "jim", "email": "jim@other.org"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 409);
    assert_eq!(
        dispatcher.contacts().lock().await.get("jim").unwrap().as_str(),
        "jim@example.com"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_are_all_applied() {
    let (base, dispatcher) = spawn_server(AddPolicy::RejectExisting).await;
    let client = reqwest::Client::new();
    let url = format!("{}{}", base, DISPATCH_PATH);

    let mut requests = tokio::task::JoinSet::new();
    for i in 0..50 {
        let client = client.clone();
        let url = url.clone();
        requests.spawn(async move {
            client
                .post(url)
                .json(&json!({
                    "type": "update",
                    "action": "add",
                    "name": format!("user{}", i),
                    "email": format!("user{}@example.com", i)
                }))
                .send()
                .await
                .map(|response| response.status())
        });
    }

    while let Some(result) = requests.join_next().await {
        assert_eq!(result.unwrap().unwrap(), 200);
    }

    let contacts = dispatcher.contacts().lock().await;
    assert_eq!(contacts.len(), 51);
    assert_eq!(contacts.get("user49").unwrap().as_str(), "user49@example.com");
}
