// HTTP client for the FlowHunt flow session API

use crate::config::{ApiConfig, FlowTarget};
use crate::error::ClientError;
use crate::events::FlowEvent;
use crate::timestamp::Timestamp;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const API_KEY_HEADER: &str = "Api-Key";

/// Operations the poll pipeline needs from the remote flow service
#[async_trait]
pub trait FlowApi: Send + Sync {
    /// Create a session bound to a flow and return its id
    async fn create_session(&self, target: &FlowTarget) -> Result<String, ClientError>;

    /// Submit a message to the session
    async fn invoke(&self, session_id: &str, message: &str) -> Result<(), ClientError>;

    /// Events created after `from_timestamp`
    async fn poll_events(
        &self,
        session_id: &str,
        from_timestamp: &Timestamp,
    ) -> Result<Vec<FlowEvent>, ClientError>;

    /// Plain download of an artefact body
    async fn fetch_artefact(&self, download_url: &str) -> Result<String, ClientError>;
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    flow_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    message: &'a str,
}

pub struct FlowClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl FlowClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http: reqwest::Client::new(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");
        let response = self
            .http
            .post(&url)
            .query(query)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl FlowApi for FlowClient {
    async fn create_session(&self, target: &FlowTarget) -> Result<String, ClientError> {
        let response = self
            .post(
                "/v2/flows/sessions/from_flow/create",
                &[("workspace_id", target.workspace_id.as_str())],
                &CreateSessionRequest {
                    flow_id: &target.flow_id,
                },
            )
            .await?;

        let body: CreateSessionResponse = response.json().await?;
        body.session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("missing session_id".to_string()))
    }

    async fn invoke(&self, session_id: &str, message: &str) -> Result<(), ClientError> {
        self.post(
            &format!("/v2/flows/sessions/{}/invoke", session_id),
            &[],
            &InvokeRequest { message },
        )
        .await?;
        Ok(())
    }

    async fn poll_events(
        &self,
        session_id: &str,
        from_timestamp: &Timestamp,
    ) -> Result<Vec<FlowEvent>, ClientError> {
        let events: Option<Vec<FlowEvent>> = self
            .get(&format!(
                "/v2/flows/sessions/{}/invocation_response/{}",
                session_id, from_timestamp
            ))
            .await?;
        Ok(events.unwrap_or_default())
    }

    async fn fetch_artefact(&self, download_url: &str) -> Result<String, ClientError> {
        tracing::debug!(url = %download_url, "downloading artefact");
        let response = self.http.get(download_url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.text().await?)
    }
}
