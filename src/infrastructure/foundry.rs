//! HTTP client for the Foundry agent service
//!
//! Agents are resolved through `{endpoint}/agents` and invoked through the
//! project's OpenAI-compatible Responses API at `{endpoint}/openai/responses`,
//! with an `agent_reference` selecting the agent.

use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::domain::{AgentRef, ResponseInput};
use crate::infrastructure::sse::SseDeltas;
use crate::infrastructure::traits::{AgentBackend, TextStream, TokenCredential};
use crate::infrastructure::{InfraError, InfraResult};

#[derive(Debug, Deserialize)]
struct AgentRecord {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AgentPage {
    #[serde(default)]
    data: Vec<AgentRecord>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: ServiceErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

/// Build the blocking HTTP client shared by the credential chain and the agent client.
pub fn http_client(timeout: Duration) -> InfraResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(InfraError::from)
}

/// URL of one agent record; the name is a single percent-encoded path segment.
pub fn agent_url(endpoint: &str, name: &str) -> InfraResult<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| InfraError::invalid_response(format!("endpoint {}: {}", endpoint, e)))?;
    url.path_segments_mut()
        .map_err(|_| {
            InfraError::invalid_response(format!("endpoint {} cannot hold a path", endpoint))
        })?
        .pop_if_empty()
        .push("agents")
        .push(name);
    Ok(url)
}

/// Extract the service's error message from a failed response body.
pub fn service_error_message(body: &str) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(ServiceErrorBody {
            error: ServiceErrorDetail {
                code: Some(code),
                message,
            },
        }) => format!("({}) {}", code, message),
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Response text: `output_text` if present, otherwise every `output_text`
/// content part of every output item, concatenated in order.
pub fn extract_output_text(body: &Value) -> String {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        return text.to_string();
    }

    body.get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect()
}

/// Request body for the Responses API.
pub fn response_request_body(input: ResponseInput<'_>, agent: &AgentRef, stream: bool) -> Value {
    let input = match input {
        ResponseInput::Text(text) => Value::String(text.to_string()),
        ResponseInput::Conversation(turns) => json!(turns),
    };
    let mut body = json!({
        "input": input,
        "agent": agent,
    });
    if stream {
        body["stream"] = Value::Bool(true);
    }
    body
}

/// Agent service client over the project endpoint.
pub struct FoundryClient {
    http: Client,
    endpoint: String,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
    scope: String,
}

impl FoundryClient {
    pub fn new(
        http: Client,
        endpoint: &str,
        api_version: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            credential,
            scope: scope.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// Attach bearer token and api-version.
    fn authorize(&self, request: RequestBuilder) -> InfraResult<RequestBuilder> {
        let token = self.credential.get_token(&self.scope)?;
        Ok(request
            .bearer_auth(token.token)
            .query(&[("api-version", self.api_version.as_str())]))
    }

    fn send(&self, request: RequestBuilder) -> InfraResult<Response> {
        let response = self.authorize(request)?.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        debug!("service error {}: {}", status, body);
        Err(InfraError::Service {
            status: status.as_u16(),
            message: service_error_message(&body),
        })
    }
}

impl AgentBackend for FoundryClient {
    #[instrument(level = "debug", skip(self))]
    fn get_agent(&self, name: &str) -> InfraResult<AgentRef> {
        let response = self.send(self.http.get(agent_url(&self.endpoint, name)?))?;
        let record: AgentRecord = response
            .json()
            .map_err(|e| InfraError::invalid_response(format!("agent record: {}", e)))?;
        AgentRef::new(record.name).map_err(|e| InfraError::invalid_response(e.to_string()))
    }

    #[instrument(level = "debug", skip(self, input))]
    fn create_response(&self, input: ResponseInput<'_>, agent: &AgentRef) -> InfraResult<String> {
        let body = response_request_body(input, agent, false);
        let response = self.send(self.http.post(self.url("openai/responses")).json(&body))?;
        let value: Value = response
            .json()
            .map_err(|e| InfraError::invalid_response(format!("response body: {}", e)))?;

        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("response failed")
                .to_string();
            return Err(InfraError::Service {
                status: 200,
                message,
            });
        }
        Ok(extract_output_text(&value))
    }

    #[instrument(level = "debug", skip(self, input))]
    fn stream_response<'a>(
        &'a self,
        input: ResponseInput<'_>,
        agent: &AgentRef,
    ) -> InfraResult<TextStream<'a>> {
        let body = response_request_body(input, agent, true);
        let response = self.send(
            self.http
                .post(self.url("openai/responses"))
                .header(ACCEPT, "text/event-stream")
                .json(&body),
        )?;
        Ok(Box::new(SseDeltas::new(BufReader::new(response))))
    }

    #[instrument(level = "debug", skip(self))]
    fn list_agents(&self, limit: u32) -> InfraResult<Vec<String>> {
        let response = self.send(
            self.http
                .get(self.url("agents"))
                .query(&[("limit", limit.to_string())]),
        )?;
        let page: AgentPage = response
            .json()
            .map_err(|e| InfraError::invalid_response(format!("agent list: {}", e)))?;
        Ok(page
            .data
            .into_iter()
            .take(limit as usize)
            .map(|a| a.name)
            .collect())
    }
}
