//! Worker orchestration commands.
//!
//! All of them act on a node server slot of a controller and refuse to publish
//! while the controller is offline.

use super::input::{AddNodeServer, WorkerTarget, decode, isy_online, or_default};
use super::{Context, Handler};
use crate::error::HandlerResult;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

/// Install request sent to the worker manager.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstallRequest {
    user_id: String,
    development: Value,
    id: Value,
    profile_num: Value,
    url: Value,
    name: Value,
    language: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    isy_version: Option<Value>,
    oauth: Value,
    ingress_required: Value,
}

/// Removal request sent to the worker manager.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoveRequest {
    profile_num: Value,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    isy_version: Option<Value>,
}

/// `addNodeServer`: register a new worker.
pub struct AddNodeServerHandler;

#[async_trait]
impl Handler for AddNodeServerHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let data = ctx.data()?;
        if !isy_online(data) {
            return ctx.decline_offline().await;
        }
        let input: AddNodeServer = decode(data)?;

        let request = InstallRequest {
            user_id: ctx.envelope.user_id().to_string(),
            development: or_default(input.development, json!(false)),
            isy_version: input.isy.firmware()?,
            id: input.isy.id,
            profile_num: input.profile_num,
            url: input.ns.url,
            name: input.ns.name,
            language: input.ns.language,
            version: input.ns.version,
            oauth: or_default(input.ns.oauth, json!({})),
            ingress_required: or_default(input.ns.ingress_required, json!(false)),
        };
        ctx.publish(ctx.keyed(serde_json::to_value(request)?)).await
    }
}

/// `removeNodeServer`: deregister a worker.
pub struct RemoveNodeServerHandler;

#[async_trait]
impl Handler for RemoveNodeServerHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let data = ctx.data()?;
        if !isy_online(data) {
            return ctx.decline_offline().await;
        }
        let target: WorkerTarget = decode(data)?;

        let request = RemoveRequest {
            isy_version: target.isy.firmware()?,
            profile_num: target.profile_num,
            id: target.isy.id,
        };
        ctx.publish(ctx.keyed(serde_json::to_value(request)?)).await
    }
}

/// `startNodeServer` / `stopNodeServer`: forward the sub-object verbatim.
pub struct StartStopHandler;

#[async_trait]
impl Handler for StartStopHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let data = ctx.data()?;
        if !isy_online(data) {
            return ctx.decline_offline().await;
        }
        ctx.publish(ctx.keyed(data.clone())).await
    }
}
