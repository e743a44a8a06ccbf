// src/analysis/client.rs
use crate::utils::error::AnalysisError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-5.1";

/// Raw model answer plus what it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: i64,
}

/// Text-in, text-out model call. Implemented by [`OpenAiClient`] and by
/// fakes in tests.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Completion, AnalysisError>;
}

/// Client for the OpenAI Responses API.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: [InputMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: i64,
}

impl OpenAiClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// HTTP client with the long timeout model calls need.
    pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
        Client::builder().timeout(timeout).build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmBackend for OpenAiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Completion, AnalysisError> {
        let request = ResponsesRequest {
            model: &self.model,
            input: [
                InputMessage { role: "system", content: system_prompt },
                InputMessage { role: "user", content: user_prompt },
            ],
        };

        let url = format!("{}/responses", self.base_url);
        debug!("Calling {} with model {} ({} prompt bytes)", url, self.model, user_prompt.len());
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Api(format!("HTTP {}: {}", status, body)));
        }

        let body = resp.text().await?;
        let parsed: ResponsesResponse = serde_json::from_str(&body)?;

        // Concatenation of every output_text part, like the SDK's output_text helper.
        let text: String = parsed
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .map(|part| part.text.as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        Ok(Completion {
            text,
            tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(Client::new(), server.uri(), "sk-test", DEFAULT_MODEL)
    }

    #[tokio::test]
    async fn test_output_text_and_usage_collected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-5.1",
                "input": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "usr"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "resp_1",
                "output": [
                    {"type": "reasoning", "id": "rs_1", "summary": []},
                    {"type": "message", "role": "assistant", "content": [
                        {"type": "output_text", "text": "{\"company_name\":", "annotations": []},
                        {"type": "output_text", "text": "\"ACME\"}", "annotations": []}
                    ]}
                ],
                "usage": {"input_tokens": 100, "output_tokens": 23, "total_tokens": 123}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client(&server).complete("sys", "usr").await.unwrap();
        assert_eq!(completion.text, "{\"company_name\":\"ACME\"}");
        assert_eq!(completion.tokens_used, 123);
    }

    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": [{"type": "message", "content": [{"type": "output_text", "text": "  "}]}]
            })))
            .mount(&server)
            .await;

        let err = client(&server).complete("sys", "usr").await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client(&server).complete("sys", "usr").await.unwrap_err();
        match err {
            AnalysisError::Api(msg) => assert!(msg.contains("429") && msg.contains("rate limited")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
