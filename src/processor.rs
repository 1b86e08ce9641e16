//! Per-envelope command processing.
//!
//! One call handles one envelope: identity check, then each registered
//! command in the order it appears. A command failing validation stops the
//! whole envelope; a handler failing (error or panic) only costs that command.

use crate::envelope::Envelope;
use crate::error::HandlerError;
use crate::handlers::{Context, Registry};
use crate::notify::Notifier;
use crate::publisher::Publisher;
use crate::telemetry::spans;
use crate::validate::verify_props;
use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

/// What happened to one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Publish accepted by the broker.
    Sent,
    /// Handler refused, e.g. controller offline.
    Declined,
    /// Handler raised; the message is the error text.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command: String,
    pub outcome: CommandOutcome,
}

/// How processing of an envelope ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeOutcome {
    /// Identity field missing; nothing was looked at.
    Rejected { missing: &'static str },
    /// A command failed validation; later commands were not attempted.
    Aborted {
        command: String,
        missing: &'static str,
    },
    Completed,
}

/// Summary of one `process` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeReport {
    pub outcome: EnvelopeOutcome,
    pub commands: Vec<CommandReport>,
}

impl EnvelopeReport {
    fn new(outcome: EnvelopeOutcome) -> Self {
        Self {
            outcome,
            commands: Vec::new(),
        }
    }

    /// Names of the commands whose handler ran, in order.
    pub fn dispatched(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.command.as_str()).collect()
    }
}

/// Validates envelopes and dispatches their commands.
pub struct Processor {
    registry: Arc<Registry>,
    publisher: Arc<Publisher>,
    notifier: Notifier,
}

impl Processor {
    pub fn new(registry: Arc<Registry>, publisher: Arc<Publisher>) -> Self {
        let notifier = Notifier::new(Arc::clone(&publisher));
        Self {
            registry,
            publisher,
            notifier,
        }
    }

    /// Process one envelope as extracted from a queue message.
    pub async fn process(&self, message: Value) -> EnvelopeReport {
        let envelope = match Envelope::from_value(message) {
            Ok(envelope) => envelope,
            Err(rejected) => {
                crate::metrics::record_envelope_rejected();
                self.notifier
                    .error(
                        None,
                        format!(
                            "Request missing required property: {} :: {}",
                            rejected.missing, rejected.raw
                        ),
                    )
                    .await;
                return EnvelopeReport::new(EnvelopeOutcome::Rejected {
                    missing: rejected.missing,
                });
            }
        };

        let span = spans::envelope(envelope.user_id(), envelope.client_id());
        self.run(&envelope).instrument(span).await
    }

    async fn run(&self, envelope: &Envelope) -> EnvelopeReport {
        let user_id = envelope.user_id();
        let client_id = envelope.client_id();
        self.notifier.debug(None, envelope.to_json());

        let mut report = EnvelopeReport::new(EnvelopeOutcome::Completed);
        for (name, data) in envelope.commands() {
            let Some(descriptor) = self.registry.resolve(name) else {
                continue;
            };

            let check = verify_props(data, descriptor.required);
            if let (false, Some(missing)) = (check.valid, check.missing) {
                self.notifier
                    .error(
                        Some(user_id),
                        format!("{name} was missing {missing} :: {}", envelope.to_json()),
                    )
                    .await;
                report.outcome = EnvelopeOutcome::Aborted {
                    command: name.to_string(),
                    missing,
                };
                return report;
            }

            self.notifier.debug(
                Some(user_id),
                format!("Processing command {name} for {user_id}/{client_id}"),
            );

            let ctx = Context {
                command: name,
                envelope,
                channel: descriptor.channel,
                publisher: &self.publisher,
                notifier: &self.notifier,
            };
            let result = AssertUnwindSafe(descriptor.dispatch(&ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic_message(panic))));

            let outcome = match result {
                Ok(true) => {
                    self.notifier.debug(
                        Some(user_id),
                        format!("Sent {name} for {user_id}/{client_id}"),
                    );
                    CommandOutcome::Sent
                }
                Ok(false) => {
                    self.notifier
                        .error(
                            Some(user_id),
                            format!("Failed to process {name} for {user_id}/{client_id}"),
                        )
                        .await;
                    CommandOutcome::Declined
                }
                Err(e) => {
                    self.notifier
                        .error(Some(user_id), format!("{name} error :: {e}"))
                        .await;
                    CommandOutcome::Failed(e.to_string())
                }
            };
            report.commands.push(CommandReport {
                command: name.to_string(),
                outcome,
            });
        }
        report
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::RecordingBroker;
    use serde_json::json;

    fn processor() -> (Processor, Arc<RecordingBroker>) {
        let broker = Arc::new(RecordingBroker::new());
        let publisher = Arc::new(Publisher::new("test", broker.clone()));
        (Processor::new(Arc::new(Registry::new()), publisher), broker)
    }

    #[tokio::test]
    async fn test_unknown_commands_are_ignored() {
        let (processor, broker) = processor();
        let report = processor
            .process(json!({"userId": "u1", "clientId": "c1", "seq": 1, "frobnicate": {}}))
            .await;
        assert_eq!(report.outcome, EnvelopeOutcome::Completed);
        assert!(report.commands.is_empty());
        assert!(broker.published().is_empty());
    }

    #[tokio::test]
    async fn test_get_isys_publishes_to_state_source() {
        let (processor, broker) = processor();
        let report = processor
            .process(json!({
                "userId": "u1",
                "clientId": "c1",
                "getIsys": {"fullResponse": true}
            }))
            .await;
        assert_eq!(report.commands[0].outcome, CommandOutcome::Sent);

        let sent = broker.published_on("test/isy");
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].payload,
            json!({
                "fullResponse": true,
                "getIsys": {},
                "userId": "u1",
                "topic": "test/frontend/u1/c1"
            })
        );
    }

    #[tokio::test]
    async fn test_get_node_servers_carries_id() {
        let (processor, broker) = processor();
        processor
            .process(json!({
                "userId": "u1",
                "clientId": "c1",
                "getNodeServers": {"id": "i1", "fullResponse": false}
            }))
            .await;

        let sent = broker.published_on("test/isy");
        assert_eq!(sent[0].payload["id"], "i1");
        assert_eq!(sent[0].payload["getNodeServers"], json!({}));
        assert!(sent[0].payload.get("fullResponse").is_none());
    }

    struct PanickingHandler;

    #[async_trait::async_trait]
    impl crate::handlers::Handler for PanickingHandler {
        async fn handle(&self, _ctx: &Context<'_>) -> crate::error::HandlerResult {
            panic!("handler blew up");
        }
    }

    #[tokio::test]
    async fn test_handler_panic_is_isolated() {
        let broker = Arc::new(RecordingBroker::new());
        let publisher = Arc::new(Publisher::new("test", broker.clone()));
        let mut registry = Registry::new();
        registry.replace_handler("startNodeServer", Box::new(PanickingHandler));
        let processor = Processor::new(Arc::new(registry), publisher);

        let isy = json!({"id": "i1", "isyOnline": true});
        let report = processor
            .process(json!({
                "userId": "u1",
                "clientId": "c1",
                "startNodeServer": {"profileNum": 3, "isy": isy},
                "polls": {"profileNum": 3, "isy": isy, "short": 10}
            }))
            .await;

        assert_eq!(report.dispatched(), vec!["startNodeServer", "polls"]);
        assert_eq!(
            report.commands[0].outcome,
            CommandOutcome::Failed("handler panicked: handler blew up".to_string())
        );
        assert_eq!(report.commands[1].outcome, CommandOutcome::Sent);
        assert_eq!(broker.published_on("test/ns").len(), 1);
        let notices = broker.published_on("test/frontend/u1");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].payload["notification"]["type"], "error");
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "unknown panic");
    }
}
