//! Command handler registry and dispatch.
//!
//! The `Registry` is built once at startup and never changes. Names that are
//! not registered resolve to nothing; callers skip them.

use super::{
    AddNodeServerHandler, Context, Handler, IsyQueryHandler, NodeServerRequestHandler,
    RemoveNodeServerHandler, StartStopHandler,
};
use crate::error::HandlerResult;
use crate::telemetry::{CommandTimer, spans};
use std::collections::HashMap;
use tracing::{Instrument, debug};

/// Required paths shared by every command addressed at a node server slot.
const SLOT_PROPS: &[&str] = &["profileNum", "isy.id"];

const ADD_NODE_SERVER_PROPS: &[&str] = &[
    "profileNum",
    "ns.url",
    "ns.name",
    "ns.language",
    "isy.id",
    "isy.isyOnline",
];

/// Where a command's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelClass {
    /// Global controller state reads.
    Global,
    /// Per-controller state reads.
    Client,
    /// Worker orchestration.
    Workers,
    /// Requests for a running node server.
    NodeServer,
}

impl ChannelClass {
    /// Topic category under the stage prefix.
    pub fn category(self) -> &'static str {
        match self {
            Self::Global | Self::Client => "isy",
            Self::Workers => "workers",
            Self::NodeServer => "ns",
        }
    }
}

/// Static registration record for one command.
pub struct Descriptor {
    pub name: &'static str,
    /// Dot paths checked against the command's sub-object, in order.
    pub required: &'static [&'static str],
    pub channel: ChannelClass,
    handler: Box<dyn Handler>,
}

impl Descriptor {
    fn new(
        name: &'static str,
        required: &'static [&'static str],
        channel: ChannelClass,
        handler: Box<dyn Handler>,
    ) -> Self {
        Self {
            name,
            required,
            channel,
            handler,
        }
    }

    /// Run the handler inside a command span, timing it for metrics.
    pub async fn dispatch(&self, ctx: &Context<'_>) -> HandlerResult {
        let _timer = CommandTimer::new(self.name);
        let span = spans::command(self.name, ctx.channel.category());

        let result = self.handler.handle(ctx).instrument(span).await;

        if let Err(ref e) = result {
            crate::metrics::record_command_error(self.name, e.error_code());
            debug!(command = %self.name, error = %e, "Command error");
        }
        result
    }
}

/// Registry of command descriptors.
pub struct Registry {
    commands: HashMap<&'static str, Descriptor>,
}

impl Registry {
    /// Create a new registry with all commands registered.
    pub fn new() -> Self {
        let mut commands = HashMap::new();
        let mut register = |descriptor: Descriptor| {
            commands.insert(descriptor.name, descriptor);
        };

        // State reads
        register(Descriptor::new(
            "getIsys",
            &[],
            ChannelClass::Global,
            Box::new(IsyQueryHandler),
        ));
        register(Descriptor::new(
            "getNodeServers",
            &["id"],
            ChannelClass::Client,
            Box::new(IsyQueryHandler),
        ));

        // Worker orchestration
        register(Descriptor::new(
            "addNodeServer",
            ADD_NODE_SERVER_PROPS,
            ChannelClass::Workers,
            Box::new(AddNodeServerHandler),
        ));
        register(Descriptor::new(
            "removeNodeServer",
            SLOT_PROPS,
            ChannelClass::Workers,
            Box::new(RemoveNodeServerHandler),
        ));
        register(Descriptor::new(
            "startNodeServer",
            SLOT_PROPS,
            ChannelClass::Workers,
            Box::new(StartStopHandler),
        ));
        register(Descriptor::new(
            "stopNodeServer",
            SLOT_PROPS,
            ChannelClass::Workers,
            Box::new(StartStopHandler),
        ));

        // Node server requests
        for name in ["removenode", "customparams", "polls", "notices"] {
            register(Descriptor::new(
                name,
                SLOT_PROPS,
                ChannelClass::NodeServer,
                Box::new(NodeServerRequestHandler),
            ));
        }

        Self { commands }
    }

    /// Look up a command by its exact name.
    pub fn resolve(&self, name: &str) -> Option<&Descriptor> {
        self.commands.get(name)
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
impl Registry {
    /// Swap the handler behind a registered command.
    pub(crate) fn replace_handler(&mut self, name: &str, handler: Box<dyn Handler>) {
        if let Some(descriptor) = self.commands.get_mut(name) {
            descriptor.handler = handler;
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
