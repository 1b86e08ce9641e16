//! Frontend request envelopes.

use crate::publisher::Session;
use crate::validate::{Verification, verify_props};
use serde_json::{Map, Value};

/// Fields every envelope must carry before any command is looked at.
pub const IDENTITY_FIELDS: &[&str] = &["userId", "clientId"];

/// Keys that are never treated as command names.
pub const RESERVED_FIELDS: &[&str] = &["userId", "clientId", "seq"];

/// An envelope that failed identity validation.
#[derive(Debug, Clone)]
pub struct Rejected {
    pub missing: &'static str,
    pub raw: Value,
}

/// One logical frontend request: identity, session and named commands.
#[derive(Debug, Clone)]
pub struct Envelope {
    user_id: String,
    client_id: String,
    fields: Map<String, Value>,
}

impl Envelope {
    /// Validate the identity fields and take ownership of the request.
    pub fn from_value(value: Value) -> Result<Self, Rejected> {
        match verify_props(&value, IDENTITY_FIELDS) {
            Verification { valid: true, .. } => {}
            Verification { missing, .. } => {
                return Err(Rejected {
                    missing: missing.unwrap_or("userId"),
                    raw: value,
                });
            }
        }
        // verify_props only passes for objects.
        let Value::Object(fields) = value else {
            return Err(Rejected {
                missing: "userId",
                raw: value,
            });
        };
        let user_id = identity(&fields, "userId");
        let client_id = identity(&fields, "clientId");
        Ok(Self {
            user_id,
            client_id,
            fields,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn seq(&self) -> Option<&Value> {
        self.fields.get("seq")
    }

    pub fn session(&self) -> Session<'_> {
        Session {
            user_id: &self.user_id,
            client_id: &self.client_id,
        }
    }

    /// Candidate commands in the order they appear in the request.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn command(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The request as received, for log lines.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_default()
    }
}

/// Identity values are usually strings; anything else is rendered as JSON.
fn identity(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
