//! HTTP gateway against a cPanel host.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::config::GatewayConfig;
use crate::envelope::{Api2Envelope, UapiEnvelope};
use crate::error::GatewayError;
use crate::traits::Gateway;
use crate::types::{Fields, ObservedRecord, RemoteKey, ResourceKind};

/// Gateway that talks to cPanel over HTTPS, one request per call.
pub struct CpanelClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    api_token: String,
}

impl CpanelClient {
    /// Creates a client from validated configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::transport(None, format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header(
                AUTHORIZATION,
                format!("cpanel {}:{}", self.username, self.api_token),
            )
            .header(ACCEPT, "application/json")
    }

    /// Executes a UAPI (Dialect A) function and returns its `data` payload.
    pub(crate) async fn uapi<T: DeserializeOwned>(
        &self,
        module: &str,
        function: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<T>, GatewayError> {
        let url = format!("{}/execute/{module}/{function}", self.base_url);
        tracing::debug!(module, function, "UAPI call");
        let resp = self
            .request(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| GatewayError::transport(None, format!("Failed to connect to server: {e}")))?;
        let envelope: UapiEnvelope<T> = handle_response(resp).await?;
        envelope.into_result()
    }

    /// Executes an API2 (Dialect B) function and returns its `data` records.
    pub(crate) async fn api2<T: DeserializeOwned>(
        &self,
        module: &str,
        function: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, GatewayError> {
        let url = format!("{}/json-api/cpanel", self.base_url);
        let mut query: Vec<(&str, &str)> = vec![
            ("cpanel_jsonapi_apiversion", "2"),
            ("cpanel_jsonapi_user", self.username.as_str()),
            ("cpanel_jsonapi_module", module),
            ("cpanel_jsonapi_func", function),
        ];
        query.extend_from_slice(params);
        tracing::debug!(module, function, "API2 call");
        let resp = self
            .request(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| GatewayError::transport(None, format!("Failed to connect to server: {e}")))?;
        let envelope: Api2Envelope<T> = handle_response(resp).await?;
        envelope.into_rows()
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayError> {
    let status = resp.status();
    let body = resp.text().await.map_err(GatewayError::from)?;

    if !status.is_success() {
        return Err(GatewayError::transport(
            Some(status.as_u16()),
            format!("HTTP {status}: {body}"),
        ));
    }

    serde_json::from_str(&body).map_err(|e| GatewayError::decode(e.to_string()))
}

pub(crate) fn line_key(kind: ResourceKind, key: &RemoteKey) -> Result<i64, GatewayError> {
    match key {
        RemoteKey::Line(line) => Ok(*line),
        RemoteKey::Name(name) => Err(GatewayError::invalid_request(format!(
            "{kind} is addressed by line key, got name `{name}`"
        ))),
    }
}

pub(crate) fn name_key(kind: ResourceKind, key: &RemoteKey) -> Result<&str, GatewayError> {
    match key {
        RemoteKey::Name(name) => Ok(name),
        RemoteKey::Line(line) => Err(GatewayError::invalid_request(format!(
            "{kind} is addressed by name, got line key {line}"
        ))),
    }
}

#[async_trait]
impl Gateway for CpanelClient {
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<ObservedRecord>, GatewayError> {
        match kind {
            ResourceKind::CronJob => self.fetch_cron().await,
            ResourceKind::Database => self.list_databases().await,
            ResourceKind::User => self.list_users().await,
        }
    }

    async fn create_one(
        &self,
        kind: ResourceKind,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        match kind {
            ResourceKind::CronJob => self.add_cron_line(fields).await,
            ResourceKind::Database => self.create_database(fields).await,
            ResourceKind::User => self.create_user(fields).await,
        }
    }

    async fn update_one(
        &self,
        kind: ResourceKind,
        key: &RemoteKey,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        match kind {
            ResourceKind::CronJob => self.edit_cron_line(line_key(kind, key)?, fields).await,
            ResourceKind::User => self.set_password(name_key(kind, key)?, fields).await,
            ResourceKind::Database => Err(GatewayError::unsupported(kind, "update_one")),
        }
    }

    async fn rename_one(
        &self,
        kind: ResourceKind,
        key: &RemoteKey,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError> {
        match kind {
            ResourceKind::Database => self.rename_database(name_key(kind, key)?, fields).await,
            ResourceKind::User => self.rename_user(name_key(kind, key)?, fields).await,
            ResourceKind::CronJob => Err(GatewayError::unsupported(kind, "rename_one")),
        }
    }

    async fn delete_one(&self, kind: ResourceKind, key: &RemoteKey) -> Result<(), GatewayError> {
        match kind {
            ResourceKind::CronJob => self.remove_cron_line(line_key(kind, key)?).await,
            ResourceKind::Database => self.delete_database(name_key(kind, key)?).await,
            ResourceKind::User => self.delete_user(name_key(kind, key)?).await,
        }
    }

    async fn grant(&self, owner: &str, member: &str) -> Result<(), GatewayError> {
        self.grant_all_privileges(owner, member).await
    }

    async fn revoke(&self, owner: &str, member: &str) -> Result<(), GatewayError> {
        self.revoke_all_privileges(owner, member).await
    }
}
