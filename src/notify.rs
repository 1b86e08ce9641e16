//! Log records that double as user notifications.
//!
//! `error` records carrying a user id are also published to the user's
//! notification topic, so the frontend can surface them. `debug` records only
//! go to the log.

use crate::publisher::Publisher;
use serde_json::{Map, Value, json};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct Notifier {
    publisher: Arc<Publisher>,
}

impl Notifier {
    pub fn new(publisher: Arc<Publisher>) -> Self {
        Self { publisher }
    }

    pub async fn error(&self, user_id: Option<&str>, msg: impl Display) {
        let msg = msg.to_string();
        match user_id {
            Some(user_id) => {
                error!(user_id = %user_id, "{msg}");
                self.notify(user_id, msg).await;
            }
            None => error!("{msg}"),
        }
    }

    pub fn debug(&self, user_id: Option<&str>, msg: impl Display) {
        match user_id {
            Some(user_id) => debug!(user_id = %user_id, "{msg}"),
            None => debug!("{msg}"),
        }
    }

    async fn notify(&self, user_id: &str, msg: String) {
        let mut payload = Map::new();
        payload.insert(
            "notification".to_string(),
            json!({"type": "error", "msg": Value::String(msg)}),
        );
        let topic = self.publisher.user_topic(user_id);
        if let Err(e) = self.publisher.publish(topic, payload, None, 0).await {
            warn!(user_id = %user_id, error = %e, "Failed to publish notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::RecordingBroker;

    fn notifier() -> (Notifier, Arc<RecordingBroker>) {
        let broker = Arc::new(RecordingBroker::new());
        let publisher = Arc::new(Publisher::new("test", broker.clone()));
        (Notifier::new(publisher), broker)
    }

    #[tokio::test]
    async fn test_user_error_is_published() {
        let (notifier, broker) = notifier();
        notifier.error(Some("u1"), "ISY not online.").await;

        let sent = broker.published_on("test/frontend/u1");
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].payload,
            json!({"notification": {"type": "error", "msg": "ISY not online."}})
        );
    }

    #[tokio::test]
    async fn test_debug_and_anonymous_errors_stay_local() {
        let (notifier, broker) = notifier();
        notifier.debug(Some("u1"), "processing");
        notifier.error(None, "operator only").await;
        assert!(broker.published().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let (notifier, broker) = notifier();
        broker.fail_topic("test/frontend/u1");
        notifier.error(Some("u1"), "still logged").await;
        assert!(broker.published().is_empty());
    }
}
