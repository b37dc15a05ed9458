use httpmock::prelude::*;
use intent_mail::adapters::{
    DryRunSender, GmailSender, GmailSettings, OllamaGenerator, StaticTokenProvider,
};
use intent_mail::config::toml_config::GeneratorConfig;
use intent_mail::core::contact_store::ContactChange;
use intent_mail::core::request_loop::PipelineOptions;
use intent_mail::{
    AddPolicy, ContactStore, DispatchReport, Dispatcher, EmailAddress, MailError, RequestOutcome,
    RequestPipeline, RequestStage,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn generator_for(server: &MockServer) -> Arc<OllamaGenerator> {
    let config = GeneratorConfig {
        endpoint: server.base_url(),
        timeout_seconds: 5,
        ..GeneratorConfig::default()
    };
    Arc::new(OllamaGenerator::new(config).unwrap())
}

fn jim_store() -> ContactStore {
    ContactStore::with_contacts(
        vec![(
            "jim".to_string(),
            EmailAddress::parse("jim@example.com").unwrap(),
        )],
        AddPolicy::Overwrite,
    )
}

#[tokio::test]
async fn test_email_request_reaches_gmail_with_resolved_receiver() {
    let ollama = MockServer::start();
    let generate_mock = ollama.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("send jim a note about lunch");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "response": "Here you go:\n{\"type\": \"email\", \"receiver\": \"jim\", \"subject\": \"Lunch\", \"body\": \"Noon at the usual place?\"}",
                "done": true
            }));
    });

    let gmail = MockServer::start();
    let send_mock = gmail.mock(|when, then| {
        when.method(POST)
            .path("/gmail/v1/users/me/messages/send")
            .header("authorization", "Bearer test-token");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"id": "msg-1", "threadId": "t-1"}));
    });

    let settings = GmailSettings {
        api_base: gmail.base_url(),
        ..GmailSettings::default()
    };
    let sender = GmailSender::new(Arc::new(StaticTokenProvider::new("test-token")), settings)
        .unwrap();
    let dispatcher = Dispatcher::new(jim_store().into_shared(), Arc::new(sender));
    let pipeline = RequestPipeline::new(
        generator_for(&ollama),
        dispatcher,
        PipelineOptions::default(),
    );

    let outcome = pipeline.process("send jim a note about lunch").await;

    generate_mock.assert();
    send_mock.assert();
    match outcome {
        RequestOutcome::Dispatched { report, .. } => match report {
            DispatchReport::MailSent { to, receipt } => {
                assert_eq!(to.as_str(), "jim@example.com");
                assert_eq!(receipt.message_id.as_deref(), Some("msg-1"));
                assert_eq!(receipt.attempts, 1);
            }
            other => panic!("unexpected report: {:?}", other),
        },
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_contact_update_from_model_output_changes_store() {
    let ollama = MockServer::start();
    ollama.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200).json_body(json!({
            "response": "<think>user wants a new contact</think>{\"type\":\"update\",\"action\":\"add\",\"name\":\"amy\",\"email\":\"amy@test.org\"}"
        }));
    });

    let dispatcher = Dispatcher::new(jim_store().into_shared(), Arc::new(DryRunSender));
    let pipeline = RequestPipeline::new(
        generator_for(&ollama),
        dispatcher.clone(),
        PipelineOptions::default(),
    );

    let outcome = pipeline.process("add amy, amy@test.org").await;

    assert!(outcome.is_dispatched());
    match outcome {
        RequestOutcome::Dispatched {
            report: DispatchReport::ContactChanged { change },
            ..
        } => assert!(matches!(change, ContactChange::Added { ref name, .. } if name == "amy")),
        other => panic!("unexpected outcome: {:?}", other),
    }

    let contacts = dispatcher.contacts().lock().await;
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts.get("amy").unwrap().as_str(), "amy@test.org");
}

#[tokio::test]
async fn test_model_output_without_json_is_rejected_before_dispatch() {
    let ollama = MockServer::start();
    ollama.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200)
            .json_body(json!({"response": "Sorry, I cannot help with that."}));
    });

    let gmail = MockServer::start();
    let send_mock = gmail.mock(|when, then| {
        when.method(POST).path("/gmail/v1/users/me/messages/send");
        then.status(200).json_body(json!({"id": "never"}));
    });

    let settings = GmailSettings {
        api_base: gmail.base_url(),
        ..GmailSettings::default()
    };
    let sender =
        GmailSender::new(Arc::new(StaticTokenProvider::new("t")), settings).unwrap();
    let pipeline = RequestPipeline::new(
        generator_for(&ollama),
        Dispatcher::new(jim_store().into_shared(), Arc::new(sender)),
        PipelineOptions::default(),
    );

    let outcome = pipeline.process("do something").await;

    send_mock.assert_hits(0);
    assert_eq!(outcome.terminal_stage(), RequestStage::Rejected);
    match outcome {
        RequestOutcome::Rejected { stage, error } => {
            assert_eq!(stage, RequestStage::Extracting);
            assert!(matches!(error, MailError::ExtractionError));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_gmail_failure_rejects_at_dispatching_stage() {
    let ollama = MockServer::start();
    ollama.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200).json_body(json!({
            "response": "{\"type\":\"email\",\"receiver\":\"jim@example.com\",\"subject\":\"\",\"body\":\"\"}"
        }));
    });

    let gmail = MockServer::start();
    let send_mock = gmail.mock(|when, then| {
        when.method(POST).path("/gmail/v1/users/me/messages/send");
        then.status(403).body("insufficient permissions");
    });

    let settings = GmailSettings {
        api_base: gmail.base_url(),
        retry_delay: Duration::from_millis(1),
        ..GmailSettings::default()
    };
    let sender =
        GmailSender::new(Arc::new(StaticTokenProvider::new("t")), settings).unwrap();
    let pipeline = RequestPipeline::new(
        generator_for(&ollama),
        Dispatcher::new(jim_store().into_shared(), Arc::new(sender)),
        PipelineOptions::default(),
    );

    let outcome = pipeline.process("email jim").await;

    send_mock.assert_hits(1);
    assert_eq!(outcome.terminal_stage(), RequestStage::Rejected);
    match outcome {
        RequestOutcome::Rejected { stage, error } => {
            assert_eq!(stage, RequestStage::Dispatching);
            assert!(matches!(
                error,
                MailError::MailSendError {
                    status: Some(403),
                    ..
                }
            ));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_run_loop_over_scripted_input() {
    let ollama = MockServer::start();
    let generate_mock = ollama.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200).json_body(json!({
            "response": "{\"type\":\"update\",\"action\":\"delete\",\"name\":\"jim\",\"email\":\"jim@example.com\"}"
        }));
    });

    let dispatcher = Dispatcher::new(jim_store().into_shared(), Arc::new(DryRunSender));
    let pipeline = RequestPipeline::new(
        generator_for(&ollama),
        dispatcher.clone(),
        PipelineOptions::default(),
    );

    // 第二次刪除同一個人會失敗
    let input: &[u8] = b"remove jim\n\nremove jim again\nquit\nnever read\n";
    let summary = pipeline.run(input).await.unwrap();

    generate_mock.assert_hits(2);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.rejected, 1);
    assert!(dispatcher.contacts().lock().await.is_empty());
}
