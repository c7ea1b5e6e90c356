use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConnectionResponse, ConnectionsApi, DirectoryEntry, DirectoryKind, unwrap_list};
use crate::config::ApiConfig;
use crate::error::AppError;

/// REST client for the AluNet backend.
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("alunet/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_list(&self, path: &str) -> anyhow::Result<Vec<Value>> {
        let url = self.url(path);
        let resp = self
            .authorized(self.client.get(&url))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(AppError::from)?;

        if !resp.status().is_success() {
            return Err(AppError::HttpStatus {
                status: resp.status().as_u16(),
                url,
            }
            .into());
        }

        let body: Value = resp.json().await.map_err(AppError::from)?;
        unwrap_list(body).ok_or_else(|| AppError::ResponseShape(url).into())
    }
}

// ---------------------------------------------------------------------------
// Request/response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectRequestBody<'a> {
    alumni_id: &'a str,
    message: &'a str,
}

/// Lenient: error bodies are not guaranteed to be JSON at all.
#[derive(Debug, Deserialize, Default)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl ConnectionsApi for HttpApi {
    async fn fetch_connections(&self) -> anyhow::Result<Vec<Value>> {
        let records = self.get_list("/connections").await?;
        tracing::debug!("Fetched {} connection record(s)", records.len());
        Ok(records)
    }

    async fn fetch_directory(&self, kind: DirectoryKind) -> anyhow::Result<Vec<DirectoryEntry>> {
        let entries = self.get_list(kind.path()).await?;
        tracing::debug!("Fetched {} {:?} directory entries", entries.len(), kind);
        Ok(entries.into_iter().map(DirectoryEntry).collect())
    }

    async fn request_connection(
        &self,
        alumni_id: &str,
        message: &str,
    ) -> anyhow::Result<ConnectionResponse> {
        let resp = self
            .authorized(self.client.post(self.url("/connections/request")))
            .json(&ConnectRequestBody { alumni_id, message })
            .send()
            .await
            .map_err(AppError::from)?;

        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str::<MessageBody>(&text).unwrap_or_default();

        Ok(ConnectionResponse {
            status,
            message: body.message.or(body.error),
        })
    }
}
