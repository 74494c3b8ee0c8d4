//! # Zabbix JSON-RPC Client
//!
//! Minimal client for the three API methods the exporter needs: `host.get`,
//! `item.get` and `history.get`. Requests carry the configured API token in
//! the `auth` member. Each client owns its own request-id counter and HTTP
//! connection pool; nothing is shared between clients.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::client::traits::{HistorySource, HistorySourceFactory};
use crate::config::ServerConfig;
use crate::error::{SourceError, SourceResult};
use crate::models::{HistoryKind, HistoryRecord, Host, Metric, TimeWindow};
use crate::utils::serde::deserialize_string_or_number;

const JSON_RPC_CONTENT_TYPE: &str = "application/json-rpc";

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl RpcErrorBody {
    fn into_source_error(self) -> SourceError {
        let data = match self.data {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        SourceError::api(self.code, self.message, data)
    }
}

/// `history.get` row with `output = extend`
#[derive(Debug, Deserialize)]
struct RawHistoryRecord {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    itemid: String,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    clock: String,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    value: String,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    ns: String,
}

impl TryFrom<RawHistoryRecord> for HistoryRecord {
    type Error = SourceError;

    fn try_from(raw: RawHistoryRecord) -> Result<Self, Self::Error> {
        let seconds: i64 = raw.clock.trim().parse().map_err(|_| {
            SourceError::invalid_response("clock", format!("not a Unix time: {}", raw.clock))
        })?;
        let clock = chrono::DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            SourceError::invalid_response("clock", format!("out of range: {seconds}"))
        })?;
        let ns: u32 = raw.ns.trim().parse().map_err(|_| {
            SourceError::invalid_response("ns", format!("not a nanosecond count: {}", raw.ns))
        })?;

        Ok(HistoryRecord {
            metric_id: raw.itemid,
            clock,
            value: raw.value,
            ns,
        })
    }
}

/// JSON-RPC client bound to one Zabbix endpoint
pub struct ZabbixClient {
    http: Client,
    endpoint: Url,
    auth_token: String,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ZabbixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZabbixClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("auth_enabled", &!self.auth_token.is_empty())
            .finish()
    }
}

impl ZabbixClient {
    pub fn new(config: &ServerConfig) -> SourceResult<Self> {
        let endpoint = Url::parse(&config.endpoint()).map_err(|e| {
            SourceError::Configuration(format!("Invalid endpoint '{}': {e}", config.endpoint()))
        })?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("zabbix-history-export/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            auth_token: config.auth_token.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one JSON-RPC request and extract its `result`
    async fn call<P, R>(&self, method: &str, params: P) -> SourceResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            auth: (!self.auth_token.is_empty()).then_some(self.auth_token.as_str()),
            id,
        };
        let body = serde_json::to_vec(&request)?;

        debug!(method = %method, id = id, endpoint = %self.endpoint, "Sending JSON-RPC request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_RPC_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope: RpcResponse<R> = serde_json::from_slice(&bytes)?;

        match envelope {
            RpcResponse {
                error: Some(error), ..
            } => Err(error.into_source_error()),
            RpcResponse {
                result: Some(result),
                ..
            } => Ok(result),
            RpcResponse { .. } => Err(SourceError::invalid_response(
                "result",
                format!("{method} response has neither result nor error"),
            )),
        }
    }
}

#[async_trait]
impl HistorySource for ZabbixClient {
    async fn list_hosts(&self) -> SourceResult<Vec<Host>> {
        let hosts: Vec<Host> = self
            .call(
                "host.get",
                json!({
                    "output": ["hostid", "name", "host"],
                    "sortfield": ["name"],
                    "sortorder": ["ASC"],
                }),
            )
            .await?;
        debug!(count = hosts.len(), "Retrieved host list");
        Ok(hosts)
    }

    async fn list_metrics(&self, host_id: &str) -> SourceResult<Vec<Metric>> {
        let value_types: Vec<u8> = HistoryKind::NUMERIC
            .iter()
            .map(|kind| kind.api_value())
            .collect();
        self.call(
            "item.get",
            json!({
                "output": ["itemid", "name", "value_type"],
                "hostids": host_id,
                "sortfield": ["name"],
                "sortorder": ["ASC"],
                "filter": { "value_type": value_types },
            }),
        )
        .await
    }

    async fn fetch_history(
        &self,
        host_id: &str,
        metric_id: &str,
        kind: HistoryKind,
        window: &TimeWindow,
    ) -> SourceResult<Vec<HistoryRecord>> {
        let rows: Vec<RawHistoryRecord> = self
            .call(
                "history.get",
                json!({
                    "output": "extend",
                    "history": kind.api_value(),
                    "hostids": host_id,
                    "itemids": metric_id,
                    "sortfield": ["clock"],
                    "sortorder": ["ASC"],
                    "time_from": window.start().timestamp(),
                    "time_till": window.end().timestamp(),
                }),
            )
            .await?;

        rows.into_iter().map(HistoryRecord::try_from).collect()
    }
}

/// Creates one [`ZabbixClient`] per unit of work
#[derive(Debug, Clone)]
pub struct ZabbixClientFactory {
    config: ServerConfig,
}

impl ZabbixClientFactory {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

impl HistorySourceFactory for ZabbixClientFactory {
    type Source = ZabbixClient;

    fn create(&self) -> SourceResult<ZabbixClient> {
        ZabbixClient::new(&self.config)
    }
}
