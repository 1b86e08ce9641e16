//! Frontend command handlers.
//!
//! This module contains the Handler trait and command registry for dispatching
//! envelope commands to appropriate handlers.
//!
//! Handlers receive a [`Context`] borrowing the envelope for the duration of
//! one call. They check the controller is online where that matters, decode
//! their own sub-object, and publish a single request on their channel.

mod input;
mod isy;
mod nodeserver;
mod registry;
mod workers;

pub use isy::IsyQueryHandler;
pub use nodeserver::NodeServerRequestHandler;
pub use registry::{ChannelClass, Descriptor, Registry};
pub use workers::{AddNodeServerHandler, RemoveNodeServerHandler, StartStopHandler};

use crate::envelope::Envelope;
use crate::error::{HandlerError, HandlerResult};
use crate::notify::Notifier;
use crate::publisher::Publisher;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Message shown to the user when a command needs an offline controller.
pub const ISY_OFFLINE: &str = "ISY not online.";

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Command name as it appeared in the envelope.
    pub command: &'a str,
    /// The whole request the command came in.
    pub envelope: &'a Envelope,
    /// Channel the descriptor publishes on.
    pub channel: ChannelClass,
    pub publisher: &'a Publisher,
    pub notifier: &'a Notifier,
}

impl<'a> Context<'a> {
    /// This command's sub-object.
    pub fn data(&self) -> Result<&'a Value, HandlerError> {
        self.envelope
            .command(self.command)
            .ok_or_else(|| HandlerError::MissingCommand(self.command.to_string()))
    }

    /// This command's sub-object, which must be a JSON object.
    pub fn object(&self) -> Result<&'a Map<String, Value>, HandlerError> {
        self.data()?
            .as_object()
            .ok_or_else(|| HandlerError::NotAnObject(self.command.to_string()))
    }

    /// Wrap `body` under the command name, the usual request shape.
    pub fn keyed(&self, body: Value) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(self.command.to_string(), body);
        payload
    }

    /// Publish on the descriptor's channel, scoped to the requesting session.
    pub async fn publish(&self, payload: Map<String, Value>) -> HandlerResult {
        let topic = self.publisher.topic(self.channel.category());
        self.publisher
            .publish(topic, payload, Some(self.envelope.session()), 0)
            .await?;
        Ok(true)
    }

    /// Tell the user the controller is offline and decline the command.
    pub async fn decline_offline(&self) -> HandlerResult {
        self.notifier
            .error(Some(self.envelope.user_id()), ISY_OFFLINE)
            .await;
        Ok(false)
    }
}

/// Command handler.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult;
}
