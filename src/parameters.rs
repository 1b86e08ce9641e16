//! Startup parameters.
//!
//! Fetched once from the parameter store before the consumer starts and
//! never modified afterwards.

use crate::error::ParameterError;
use crate::transport::ParameterStore;
use std::collections::HashMap;
use tracing::{debug, info};

/// Immutable map of parameter values keyed by the last path segment.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: HashMap<String, String>,
}

impl Parameters {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, or an error naming it.
    pub fn require(&self, key: &str) -> Result<&str, ParameterError> {
        self.get(key)
            .ok_or_else(|| ParameterError::MissingRequired(key.to_string()))
    }
}

/// Walk every page under `path`, one request at a time.
///
/// An empty page anywhere in the walk is an error, including the first.
pub async fn load_parameters(
    store: &dyn ParameterStore,
    path: &str,
    page_size: usize,
) -> Result<Parameters, ParameterError> {
    let mut values = HashMap::new();
    let mut next_token = None;

    loop {
        let page = store
            .get_parameters_by_path(path, page_size, next_token)
            .await?;
        if page.parameters.is_empty() {
            return Err(ParameterError::Empty(path.to_string()));
        }
        for parameter in page.parameters {
            let key = last_segment(&parameter.name).to_string();
            debug!(key = %key, "Loaded parameter");
            values.insert(key, parameter.value);
        }
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    info!(count = values.len(), path = %path, "Retrieved parameters");
    Ok(Parameters { values })
}

fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
