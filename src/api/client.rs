//! HTTP implementation of [`AgentsApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::{ParseError, Url};

use super::types::{
    Agent, AgentThread, CreateAgentRequest, CreateMessageRequest, CreateRunRequest, ListOrder,
    ListResponse, RunStep, SubmitToolApprovalsRequest, ThreadMessage, ThreadRun, ToolApproval,
};
use super::{AgentsApi, ApiError};
use crate::config::Config;

/// Client for the agents REST API of one project endpoint.
#[derive(Debug, Clone)]
pub struct AgentsClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    api_version: String,
}

impl AgentsClient {
    /// Create a client for `endpoint`.
    ///
    /// Every request carries `api-version` and a bearer token.
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("weather-agent/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
            api_version: api_version.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.project_endpoint,
            config.api_key.clone(),
            config.api_version.clone(),
            config.http_timeout,
        )
    }

    /// Append `segments` to the endpoint path. Each segment is percent-encoded,
    /// so an id can never add path levels, a query or a fragment.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder
            .query(&[("api-version", self.api_version.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(
                operation,
                status = status.as_u16(),
                "Agents service returned an error"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { operation, source })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &[&str],
    ) -> Result<T, ApiError> {
        let builder = self.http.get(self.url(path)?);
        self.send(operation, builder).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let builder = self.http.post(self.url(path)?).json(body);
        self.send(operation, builder).await
    }

    /// Fetch every page of a list endpoint, following the `after` cursor.
    async fn list_all<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &[&str],
        order: ListOrder,
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut builder = self
                .http
                .get(self.url(path)?)
                .query(&[("order", order.as_str())]);
            if let Some(cursor) = &after {
                builder = builder.query(&[("after", cursor.as_str())]);
            }

            let page: ListResponse<T> = self.send(operation, builder).await?;
            items.extend(page.data);

            match (page.has_more, page.last_id) {
                // A cursor that does not advance would loop forever.
                (true, Some(last_id)) if after.as_deref() != Some(last_id.as_str()) => {
                    after = Some(last_id);
                }
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl AgentsApi for AgentsClient {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, ApiError> {
        self.get("agents.get", &["assistants", agent_id]).await
    }

    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent, ApiError> {
        self.post("agents.create", &["assistants"], request).await
    }

    async fn create_thread(&self) -> Result<AgentThread, ApiError> {
        self.post("threads.create", &["threads"], &serde_json::json!({}))
            .await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, ApiError> {
        self.post(
            "messages.create",
            &["threads", thread_id, "messages"],
            request,
        )
        .await
    }

    async fn create_run(
        &self,
        thread_id: &str,
        request: &CreateRunRequest,
    ) -> Result<ThreadRun, ApiError> {
        self.post("runs.create", &["threads", thread_id, "runs"], request)
            .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun, ApiError> {
        self.get("runs.get", &["threads", thread_id, "runs", run_id])
            .await
    }

    async fn list_run_steps(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Vec<RunStep>, ApiError> {
        self.list_all(
            "run_steps.list",
            &["threads", thread_id, "runs", run_id, "steps"],
            ListOrder::Ascending,
        )
        .await
    }

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: &[ToolApproval],
    ) -> Result<ThreadRun, ApiError> {
        let body = SubmitToolApprovalsRequest {
            tool_approvals: approvals.to_vec(),
        };
        self.post(
            "runs.submit_tool_outputs",
            &["threads", thread_id, "runs", run_id, "submit_tool_outputs"],
            &body,
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun, ApiError> {
        self.post(
            "runs.cancel",
            &["threads", thread_id, "runs", run_id, "cancel"],
            &serde_json::json!({}),
        )
        .await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
    ) -> Result<Vec<ThreadMessage>, ApiError> {
        self.list_all("messages.list", &["threads", thread_id, "messages"], order)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> AgentsClient {
        AgentsClient::new(endpoint, "key", "v1", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = client("https://example.services.ai.azure.com/api/projects/demo/");
        assert_eq!(
            c.url(&["threads", "t1", "runs"]).unwrap().as_str(),
            "https://example.services.ai.azure.com/api/projects/demo/threads/t1/runs"
        );
    }

    #[test]
    fn ids_are_escaped_as_single_segments() {
        let c = client("https://example.services.ai.azure.com/api/projects/demo");
        let url = c.url(&["assistants", "asst/../x?y#z"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://example.services.ai.azure.com/api/projects/demo/assistants/asst%2F..%2Fx%3Fy%23z"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let err = AgentsClient::new("not a url", "key", "v1", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn endpoint_without_a_path_base_is_rejected() {
        let err =
            AgentsClient::new("mailto:ops@example.com", "key", "v1", Duration::from_secs(5))
                .unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidUrl(ParseError::RelativeUrlWithCannotBeABaseBase)
        ));
    }
}
