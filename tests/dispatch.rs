//! Integration tests for envelope dispatch: validation, isolation and the
//! messages each command produces.

mod common;

use common::{TestService, capture_errors};
use common::envelopes::{add_node_server, envelope, isy, slot};
use frontend_manager::processor::{CommandOutcome, EnvelopeOutcome};
use serde_json::json;

#[tokio::test]
async fn test_missing_identity_invokes_nothing() {
    let service = TestService::new();

    for raw in [
        json!({"clientId": "c1", "getIsys": {}}),
        json!({"userId": "u1", "getIsys": {}}),
        json!({"userId": "", "clientId": "c1", "getIsys": {}}),
    ] {
        let (_guard, errors) = capture_errors();
        let report = service.processor.process(raw).await;
        assert!(matches!(report.outcome, EnvelopeOutcome::Rejected { .. }));
        assert!(report.commands.is_empty());
        assert_eq!(errors.count(), 1);
    }
    // Rejections carry no identity, so nothing reaches a user topic either.
    assert!(service.broker.published().is_empty());
}

#[tokio::test]
async fn test_invalid_command_aborts_rest_of_envelope() {
    let service = TestService::new();

    let report = service
        .processor
        .process(envelope(&[
            ("removeNodeServer", json!({"isy": isy(true)})),
            ("getIsys", json!({})),
        ]))
        .await;

    assert_eq!(
        report.outcome,
        EnvelopeOutcome::Aborted {
            command: "removeNodeServer".to_string(),
            missing: "profileNum",
        }
    );
    assert!(report.commands.is_empty());
    assert!(service.broker.published_on("test/isy").is_empty());

    let notices = service.broker.published_on("test/frontend/u1");
    assert_eq!(notices.len(), 1);
    let msg = notices[0].payload["notification"]["msg"].as_str().unwrap();
    assert!(msg.starts_with("removeNodeServer was missing profileNum :: "));
}

#[tokio::test]
async fn test_falsy_required_value_counts_as_missing() {
    let service = TestService::new();
    let mut data = add_node_server(true);
    data["profileNum"] = json!(0);

    let report = service
        .processor
        .process(envelope(&[("addNodeServer", data)]))
        .await;

    assert_eq!(
        report.outcome,
        EnvelopeOutcome::Aborted {
            command: "addNodeServer".to_string(),
            missing: "profileNum",
        }
    );
    assert!(service.broker.published_on("test/workers").is_empty());
}

#[tokio::test]
async fn test_handler_error_does_not_stop_siblings() {
    let service = TestService::new();

    let report = service
        .processor
        .process(envelope(&[
            (
                "removeNodeServer",
                json!({"profileNum": 1, "isy": {"id": "i1", "isyOnline": true}}),
            ),
            ("getIsys", json!({})),
        ]))
        .await;

    assert_eq!(report.outcome, EnvelopeOutcome::Completed);
    assert_eq!(report.dispatched(), vec!["removeNodeServer", "getIsys"]);
    assert!(matches!(report.commands[0].outcome, CommandOutcome::Failed(_)));
    assert_eq!(report.commands[1].outcome, CommandOutcome::Sent);

    assert!(service.broker.published_on("test/workers").is_empty());
    assert_eq!(service.broker.published_on("test/isy").len(), 1);

    let notices = service.broker.published_on("test/frontend/u1");
    assert_eq!(notices.len(), 1);
    assert_eq!(
        notices[0].payload["notification"]["msg"],
        "removeNodeServer error :: required field missing: isy.isyData"
    );
}

#[tokio::test]
async fn test_publish_failure_does_not_stop_siblings() {
    let service = TestService::new();
    service.broker.fail_topic("test/workers");

    let report = service
        .processor
        .process(envelope(&[
            ("startNodeServer", slot(true)),
            ("polls", slot(true)),
        ]))
        .await;

    assert!(matches!(report.commands[0].outcome, CommandOutcome::Failed(_)));
    assert_eq!(report.commands[1].outcome, CommandOutcome::Sent);
    assert_eq!(service.broker.published_on("test/ns").len(), 1);
}

#[tokio::test]
async fn test_remove_node_server_offline() {
    let service = TestService::new();

    let report = service
        .processor
        .process(envelope(&[("removeNodeServer", slot(false))]))
        .await;

    assert_eq!(report.commands[0].outcome, CommandOutcome::Declined);
    assert!(service.broker.published_on("test/workers").is_empty());

    let notices = service.broker.published_on("test/frontend/u1");
    assert!(!notices.is_empty());
    assert_eq!(notices[0].payload["notification"]["type"], "error");
    assert_eq!(notices[0].payload["notification"]["msg"], "ISY not online.");
    for notice in &notices {
        assert!(!notice.scoped);
        assert_eq!(notice.payload["notification"]["type"], "error");
    }
}

#[tokio::test]
async fn test_add_node_server_online() {
    let service = TestService::new();

    let report = service
        .processor
        .process(envelope(&[("addNodeServer", add_node_server(true))]))
        .await;

    assert_eq!(report.commands[0].outcome, CommandOutcome::Sent);

    let sent = service.broker.published_on("test/workers");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].scoped);
    assert_eq!(
        sent[0].payload,
        json!({
            "addNodeServer": {
                "userId": "u1",
                "development": false,
                "id": "i1",
                "profileNum": 2,
                "url": "https://example.com/ns.git",
                "name": "Weather",
                "language": "python",
                "isyVersion": "5.0",
                "oauth": {},
                "ingressRequired": false
            },
            "userId": "u1",
            "topic": "test/frontend/u1/c1"
        })
    );
    assert!(service.broker.published_on("test/frontend/u1").is_empty());
}

#[tokio::test]
async fn test_node_server_request_shape() {
    let service = TestService::new();
    let mut data = slot(true);
    data["customparams"] = json!({"key": "abc"});

    service
        .processor
        .process(envelope(&[("customparams", data.clone())]))
        .await;

    let sent = service.broker.published_on("test/ns");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload["profileNum"], 1);
    assert_eq!(sent[0].payload["id"], "i1");
    assert_eq!(sent[0].payload["customparams"], data);
    assert_eq!(sent[0].payload["topic"], "test/frontend/u1/c1");
}

#[tokio::test]
async fn test_commands_run_in_declared_order() {
    let service = TestService::new();

    let report = service
        .processor
        .process(envelope(&[
            ("stopNodeServer", slot(true)),
            ("getNodeServers", json!({"id": "i1"})),
            ("notices", slot(true)),
        ]))
        .await;

    assert_eq!(
        report.dispatched(),
        vec!["stopNodeServer", "getNodeServers", "notices"]
    );
    let topics: Vec<String> = service
        .broker
        .published()
        .into_iter()
        .map(|m| m.topic)
        .collect();
    assert_eq!(topics, vec!["test/workers", "test/isy", "test/ns"]);
}

#[tokio::test]
async fn test_offline_check_precedes_decoding() {
    let service = TestService::new();
    let odd_isy = |online: bool| json!({"id": "i1", "isyOnline": online, "isyData": "5.0"});

    for name in ["removeNodeServer", "startNodeServer", "polls"] {
        let report = service
            .processor
            .process(envelope(&[(name, json!({"profileNum": 1, "isy": odd_isy(false)}))]))
            .await;
        assert_eq!(report.commands[0].outcome, CommandOutcome::Declined, "{name}");
    }
    assert!(service.broker.published_on("test/workers").is_empty());
    assert!(service.broker.published_on("test/ns").is_empty());
    let notices = service.broker.published_on("test/frontend/u1");
    assert_eq!(notices[0].payload["notification"]["msg"], "ISY not online.");
}

#[tokio::test]
async fn test_non_object_isy_data_omits_firmware() {
    let service = TestService::new();

    let report = service
        .processor
        .process(envelope(&[(
            "removeNodeServer",
            json!({"profileNum": 1, "isy": {"id": "i1", "isyOnline": true, "isyData": "5.0"}}),
        )]))
        .await;

    assert_eq!(report.commands[0].outcome, CommandOutcome::Sent);
    let sent = service.broker.published_on("test/workers");
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].payload["removeNodeServer"],
        json!({"profileNum": 1, "id": "i1"})
    );
}

#[tokio::test]
async fn test_null_query_fails_without_stopping_siblings() {
    let service = TestService::new();

    let report = service
        .processor
        .process(envelope(&[
            ("getIsys", json!(null)),
            ("getNodeServers", json!({"id": "i1"})),
        ]))
        .await;

    assert_eq!(
        report.commands[0].outcome,
        CommandOutcome::Failed("getIsys payload is not an object".to_string())
    );
    assert_eq!(report.commands[1].outcome, CommandOutcome::Sent);
    assert_eq!(service.broker.published_on("test/isy").len(), 1);
}
