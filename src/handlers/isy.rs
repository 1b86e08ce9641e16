//! Controller state reads (`getIsys`, `getNodeServers`).

use super::{Context, Handler};
use crate::error::HandlerResult;
use crate::validate::truthy;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Asks the state source for controller or node server state.
///
/// The request carries an empty object under the command name, the optional
/// `fullResponse` flag when set, and `id` when the frontend supplied one.
/// A sub-object that is not a JSON object (e.g. `"getIsys": null`) fails the
/// command.
pub struct IsyQueryHandler;

#[async_trait]
impl Handler for IsyQueryHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let data = ctx.object()?;

        let mut payload = Map::new();
        if let Some(full) = data.get("fullResponse").filter(|v| truthy(v)) {
            payload.insert("fullResponse".to_string(), full.clone());
        }
        payload.insert(ctx.command.to_string(), Value::Object(Map::new()));
        if let Some(id) = data.get("id") {
            payload.insert("id".to_string(), id.clone());
        }

        ctx.publish(payload).await
    }
}
