//! Outbound publishes over the broker.
//!
//! Topics are namespaced by stage: `{stage}/{category}` for broadcasts and
//! `{stage}/frontend/{user}/{client}` as the reply topic of a session.

use crate::error::TransportError;
use crate::transport::{Broker, OutboundMessage};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Identity of the frontend session a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session<'a> {
    pub user_id: &'a str,
    pub client_id: &'a str,
}

/// Builds outbound messages and hands them to the broker.
pub struct Publisher {
    stage: String,
    broker: Arc<dyn Broker>,
}

impl Publisher {
    pub fn new(stage: impl Into<String>, broker: Arc<dyn Broker>) -> Self {
        Self {
            stage: stage.into(),
            broker,
        }
    }

    /// Broadcast topic for a category, e.g. `test/workers`.
    pub fn topic(&self, category: &str) -> String {
        format!("{}/{}", self.stage, category)
    }

    /// Notification topic for a user.
    pub fn user_topic(&self, user_id: &str) -> String {
        format!("{}/frontend/{}", self.stage, user_id)
    }

    /// Reply topic for one frontend session.
    pub fn session_topic(&self, session: Session<'_>) -> String {
        format!(
            "{}/frontend/{}/{}",
            self.stage, session.user_id, session.client_id
        )
    }

    /// Assemble the message without sending it.
    ///
    /// With a session, the payload is stamped with `userId` and the session
    /// reply `topic`; the delivery topic itself is left as given.
    pub fn prepare(
        &self,
        topic: String,
        mut payload: Map<String, Value>,
        session: Option<Session<'_>>,
        qos: u8,
    ) -> OutboundMessage {
        let scoped = session.is_some();
        if let Some(session) = session {
            payload.insert("userId".to_string(), Value::from(session.user_id));
            payload.insert("topic".to_string(), Value::from(self.session_topic(session)));
        }
        OutboundMessage {
            topic,
            payload: Value::Object(payload),
            qos,
            scoped,
        }
    }

    /// Publish once; no retry. Errors are returned for the caller to log.
    pub async fn publish(
        &self,
        topic: String,
        payload: Map<String, Value>,
        session: Option<Session<'_>>,
        qos: u8,
    ) -> Result<(), TransportError> {
        let message = self.prepare(topic, payload, session, qos);
        let result = self.broker.publish(&message).await;
        crate::metrics::record_publish(result.is_ok());
        debug!(topic = %message.topic, scoped = message.scoped, ok = result.is_ok(), "Published");
        result
    }
}
