//! Crontab lines through the API2 `Cron` module.

use serde::Deserialize;

use crate::client::CpanelClient;
use crate::envelope::{Api2Status, check_statuses, lenient_i64, lenient_string};
use crate::error::GatewayError;
use crate::types::{Fields, ObservedRecord, RemoteKey, required_field};

pub const MODULE: &str = "Cron";

pub const FUNC_FETCH: &str = "fetchcron";
pub const FUNC_ADD_LINE: &str = "add_line";
pub const FUNC_EDIT_LINE: &str = "edit_line";
pub const FUNC_REMOVE_LINE: &str = "remove_line";

/// Schedule and command fields, in the order used for content identity.
pub const FIELDS: [&str; 6] = ["minute", "hour", "day", "weekday", "month", "command"];

/// One row of `fetchcron`.
///
/// The crontab also holds environment assignments and comments; those rows
/// carry no line key or a `type` other than `command` and are skipped.
#[derive(Debug, Deserialize)]
struct CronLine {
    #[serde(default, deserialize_with = "lenient_i64")]
    linekey: Option<i64>,
    #[serde(default, rename = "type")]
    line_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    minute: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    hour: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    day: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    weekday: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    month: Option<String>,
    #[serde(default)]
    command: Option<String>,
}

impl CronLine {
    fn into_record(self) -> Option<ObservedRecord> {
        if self.line_type.as_deref().is_some_and(|t| t != "command") {
            return None;
        }
        let linekey = self.linekey?;
        let command = self.command?;

        let mut fields = Fields::new();
        for (name, value) in FIELDS.iter().zip([
            self.minute,
            self.hour,
            self.day,
            self.weekday,
            self.month,
            Some(command),
        ]) {
            fields.insert((*name).to_string(), value.unwrap_or_default());
        }
        Some(ObservedRecord::new(Some(RemoteKey::Line(linekey)), fields))
    }
}

fn schedule_params(fields: &Fields) -> Result<Vec<(&'static str, &str)>, GatewayError> {
    FIELDS
        .iter()
        .map(|name| required_field(fields, name).map(|value| (*name, value)))
        .collect()
}

/// Picks the single acted-upon row of a mutating call.
fn single_status(rows: Vec<Api2Status>) -> Result<Api2Status, GatewayError> {
    check_statuses(&rows)?;
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row),
        _ => Err(GatewayError::rejected(format!(
            "expected one acted-upon record, got {count}"
        ))),
    }
}

fn schedule_fields(fields: &Fields) -> Fields {
    FIELDS
        .iter()
        .filter_map(|name| fields.get(*name).map(|v| ((*name).to_string(), v.clone())))
        .collect()
}

impl CpanelClient {
    pub(crate) async fn fetch_cron(&self) -> Result<Vec<ObservedRecord>, GatewayError> {
        let rows: Vec<CronLine> = self.api2(MODULE, FUNC_FETCH, &[]).await?;
        Ok(rows.into_iter().filter_map(CronLine::into_record).collect())
    }

    pub(crate) async fn add_cron_line(&self, fields: &Fields) -> Result<ObservedRecord, GatewayError> {
        let params = schedule_params(fields)?;
        let rows: Vec<Api2Status> = self.api2(MODULE, FUNC_ADD_LINE, &params).await?;
        let row = single_status(rows)?;
        tracing::debug!(linekey = ?row.linekey, "cron line added");
        Ok(ObservedRecord::new(
            row.linekey.map(RemoteKey::Line),
            schedule_fields(fields),
        ))
    }

    pub(crate) async fn edit_cron_line(
        &self,
        line: i64,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        let line_str = line.to_string();
        let mut params = vec![("linekey", line_str.as_str())];
        params.extend(schedule_params(fields)?);
        let rows: Vec<Api2Status> = self.api2(MODULE, FUNC_EDIT_LINE, &params).await?;
        let row = single_status(rows)?;
        Ok(ObservedRecord::new(
            Some(RemoteKey::Line(row.linekey.unwrap_or(line))),
            schedule_fields(fields),
        ))
    }

    pub(crate) async fn remove_cron_line(&self, line: i64) -> Result<(), GatewayError> {
        let line_str = line.to_string();
        let rows: Vec<Api2Status> = self
            .api2(MODULE, FUNC_REMOVE_LINE, &[("linekey", line_str.as_str())])
            .await?;
        single_status(rows).map(|_| ())
    }
}
