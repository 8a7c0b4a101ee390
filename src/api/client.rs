use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::utils::error::{ChatError, ChatResult};

/// Body of `POST /question`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<String>>,
}

impl QuestionRequest {
    /// Build a request; choices are trimmed and blanks dropped, and `answers`
    /// is only sent when at least one choice survives.
    pub fn new(question: impl Into<String>, choices: &[String]) -> Self {
        let answers: Vec<String> = choices
            .iter()
            .map(|choice| choice.trim())
            .filter(|choice| !choice.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            question: question.into(),
            answers: if answers.is_empty() { None } else { Some(answers) },
        }
    }
}

/// Response as received from the wire, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// 200 response with an `application/json` content type
    pub fn json(body: impl Into<String>) -> Self {
        Self::new(200, Some("application/json"), body)
    }

    /// 200 response with a `text/plain` content type
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(200, Some("text/plain; charset=utf-8"), body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }
}

/// Seam between the session and the network
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one question. Any HTTP status is returned as a `RawResponse`;
    /// only transport failures are errors.
    async fn post_question(&self, request: &QuestionRequest) -> ChatResult<RawResponse>;

    /// Probe the service root and return its status message
    async fn health(&self) -> ChatResult<String>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> ChatResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ChatError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("greenchoice-cli/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_question(&self, request: &QuestionRequest) -> ChatResult<RawResponse> {
        let url = self.url("question");
        debug!(%url, answers = request.answers.as_ref().map_or(0, Vec::len), "posting question");

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        debug!(status, content_type = content_type.as_deref().unwrap_or(""), "question answered");

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }

    async fn health(&self) -> ChatResult<String> {
        let response = self.client.get(self.url("")).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::status(status.as_u16(), body));
        }

        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| json["message"].as_str().map(str::to_string))
            .unwrap_or(body);

        Ok(message)
    }
}
