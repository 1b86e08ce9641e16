//! Requests relayed to a running node server.

use super::input::{WorkerTarget, decode, isy_online};
use super::{Context, Handler};
use crate::error::HandlerResult;
use async_trait::async_trait;

/// `removenode`, `customparams`, `polls`, `notices`.
///
/// Published as `{profileNum, id, <command>: <sub-object>}` so the node
/// server host can route it without looking inside the command.
pub struct NodeServerRequestHandler;

#[async_trait]
impl Handler for NodeServerRequestHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let data = ctx.data()?;
        if !isy_online(data) {
            return ctx.decline_offline().await;
        }
        let target: WorkerTarget = decode(data)?;

        let mut payload = serde_json::Map::new();
        payload.insert("profileNum".to_string(), target.profile_num);
        payload.insert("id".to_string(), target.isy.id);
        payload.insert(ctx.command.to_string(), data.clone());
        ctx.publish(payload).await
    }
}
