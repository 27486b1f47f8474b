//! Response envelopes of the two cPanel protocol dialects.
//!
//! Dialect A (UAPI) reports success through a top-level `status` integer.
//! Dialect B (API2) wraps everything in `cpanelresult`, reports call-level
//! failure through `event.result` and per-record failure through each
//! record's own `status`. Both are reduced here to `Result<_, GatewayError>`
//! so callers never look at the dialect.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::GatewayError;

/// Dialect A success sentinel for `status`.
pub const UAPI_SUCCESS: i64 = 1;

/// Dialect B success sentinel for a record's `status`.
pub const API2_SUCCESS: i64 = 1;

/// Dialect A envelope: `{errors, messages, warnings, status, data}`.
#[derive(Debug, Deserialize)]
pub struct UapiEnvelope<T> {
    #[serde(default)]
    pub errors: Option<Vec<String>>,
    #[serde(default)]
    pub messages: Option<Vec<String>>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub status: Option<i64>,
    pub data: Option<T>,
}

impl<T> UapiEnvelope<T> {
    /// Returns the payload if `status` equals the success sentinel.
    ///
    /// The rejection message is `errors` joined with `", "`, falling back to
    /// `messages` when the remote system left `errors` empty.
    pub fn into_result(self) -> Result<Option<T>, GatewayError> {
        if self.status == Some(UAPI_SUCCESS) {
            return Ok(self.data);
        }

        let message = joined(self.errors.as_deref())
            .or_else(|| joined(self.messages.as_deref()))
            .unwrap_or_else(|| match self.status {
                Some(status) => format!("remote call failed with status {status}"),
                None => "remote call failed without a status".to_string(),
            });
        Err(GatewayError::rejected(message))
    }
}

/// Dialect B envelope: `{cpanelresult: {...}}`.
#[derive(Debug, Deserialize)]
pub struct Api2Envelope<T> {
    pub cpanelresult: Api2Result<T>,
}

/// The `cpanelresult` object of a Dialect B response.
#[derive(Debug, Deserialize)]
pub struct Api2Result<T> {
    #[serde(default)]
    pub apiversion: Option<i64>,
    #[serde(default)]
    pub func: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub event: Option<Api2Event>,
    #[serde(default)]
    pub error: Option<String>,
    pub data: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Api2Event {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub result: Option<i64>,
}

impl<T> Api2Envelope<T> {
    /// Returns the data records, failing if the call-level event failed.
    pub fn into_rows(self) -> Result<Vec<T>, GatewayError> {
        let result = self.cpanelresult;
        let failed = result
            .event
            .as_ref()
            .and_then(|e| e.result)
            .is_some_and(|r| r == 0);
        if failed {
            let message = result
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| {
                    format!(
                        "{}::{} failed",
                        result.module.as_deref().unwrap_or("API2"),
                        result.func.as_deref().unwrap_or("call")
                    )
                });
            return Err(GatewayError::rejected(message));
        }
        Ok(result.data.unwrap_or_default())
    }
}

/// One acted-upon record of a mutating Dialect B call.
#[derive(Debug, Clone, Deserialize)]
pub struct Api2Status {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub linekey: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub status: Option<i64>,
    #[serde(default)]
    pub statusmsg: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Succeeds only if there is at least one record and every record reports success.
pub fn check_statuses(rows: &[Api2Status]) -> Result<(), GatewayError> {
    if rows.is_empty() {
        return Err(GatewayError::rejected("empty response"));
    }

    let failures: Vec<String> = rows
        .iter()
        .filter(|row| row.status != Some(API2_SUCCESS))
        .map(|row| {
            row.statusmsg
                .clone()
                .filter(|m| !m.is_empty())
                .or_else(|| row.reason.clone().filter(|r| !r.is_empty()))
                .unwrap_or_else(|| "unknown failure".to_string())
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::rejected(failures.join(", ")))
    }
}

fn joined(messages: Option<&[String]>) -> Option<String> {
    messages
        .filter(|m| !m.is_empty())
        .map(|m| m.join(", "))
}

/// Accepts integers, numeric strings and booleans; anything else becomes `None`.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Bool(b)) => Some(i64::from(b)),
        _ => None,
    })
}

/// Accepts strings and numbers, rendering numbers in their JSON form.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
