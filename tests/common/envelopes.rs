//! Envelope and raw queue message builders.

#![allow(dead_code)]

use frontend_manager::transport::RawQueueMessage;
use frontend_manager::transport::memory::raw_message;
use serde_json::{Value, json};

/// Controller reference with firmware data.
pub fn isy(online: bool) -> Value {
    json!({
        "id": "i1",
        "isyOnline": online,
        "isyData": {"firmware": "5.0"}
    })
}

/// Envelope for `u1`/`c1` carrying `commands` in the given order.
pub fn envelope(commands: &[(&str, Value)]) -> Value {
    let mut fields = serde_json::Map::new();
    fields.insert("userId".into(), json!("u1"));
    fields.insert("clientId".into(), json!("c1"));
    for (name, data) in commands {
        fields.insert((*name).to_string(), data.clone());
    }
    Value::Object(fields)
}

pub fn add_node_server(online: bool) -> Value {
    json!({
        "profileNum": 2,
        "ns": {
            "url": "https://example.com/ns.git",
            "name": "Weather",
            "language": "python"
        },
        "isy": isy(online)
    })
}

pub fn slot(online: bool) -> Value {
    json!({"profileNum": 1, "isy": isy(online)})
}

/// Raw queue message wrapping `envelope` under `msg`.
pub fn queued(id: &str, envelope: &Value) -> RawQueueMessage {
    raw_message(id, json!({ "msg": envelope }).to_string())
}
