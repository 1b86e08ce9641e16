//! Typed command inputs.
//!
//! Decoded from a command's sub-object after path validation passed. Fields
//! that are forwarded to workers untouched stay as raw JSON values.

use crate::error::HandlerError;
use crate::validate::truthy;
use serde::Deserialize;
use serde_json::Value;

/// Reference to the controller a node server runs against.
///
/// `isyData` stays raw: only its `firmware` member is ever read, and a
/// non-object value simply has none.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsyRef {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub isy_data: Value,
}

impl IsyRef {
    /// Firmware version; `isyData` itself must be present and non-null.
    pub fn firmware(&self) -> Result<Option<Value>, HandlerError> {
        match &self.isy_data {
            Value::Null => Err(HandlerError::MissingField("isy.isyData")),
            data => Ok(data.get("firmware").cloned()),
        }
    }
}

/// Whether `isy.isyOnline` in a raw command sub-object is truthy.
///
/// Read before any decoding so an offline controller is always declined,
/// whatever shape the rest of the sub-object has.
pub fn isy_online(data: &Value) -> bool {
    data.pointer("/isy/isyOnline").is_some_and(truthy)
}

/// Any command addressed at one node server slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerTarget {
    pub profile_num: Value,
    pub isy: IsyRef,
}

/// Node server definition supplied when installing one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeServerSpec {
    pub url: Value,
    pub name: Value,
    pub language: Value,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub oauth: Value,
    #[serde(default)]
    pub ingress_required: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNodeServer {
    pub profile_num: Value,
    #[serde(default)]
    pub development: Value,
    pub ns: NodeServerSpec,
    pub isy: IsyRef,
}

/// Decode a command sub-object into its input type.
pub fn decode<T: serde::de::DeserializeOwned>(data: &Value) -> Result<T, HandlerError> {
    Ok(serde_json::from_value(data.clone())?)
}

/// `value` when truthy, otherwise `fallback`.
pub fn or_default(value: Value, fallback: Value) -> Value {
    if truthy(&value) { value } else { fallback }
}
