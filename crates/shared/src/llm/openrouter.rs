use std::time::Duration;

use futures_util::{StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::completion::ChatCompletionRequest;
use super::gateway::{CompletionFuture, CompletionGateway, CompletionStream, GatewayError};
use crate::config::{ConfigError, ProviderConfig};

const HTTP_REFERER_HEADER: &str = "HTTP-Referer";
const TITLE_HEADER: &str = "X-Title";

#[derive(Clone)]
pub struct OpenRouterGateway {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl OpenRouterGateway {
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder.build().map_err(|err| {
            ConfigError::InvalidConfiguration(format!(
                "failed to build OpenRouter http client: {err}"
            ))
        })?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn send(
        &self,
        turns: Vec<Value>,
        stream: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        let body = ChatCompletionRequest::with_system_prompt(&self.config.model, turns, stream);

        let mut request = self
            .client
            .post(&self.config.chat_completions_url)
            .bearer_auth(&self.config.api_key)
            .json(&body);
        if let Some(site_url) = self.config.site_url.as_deref() {
            request = request.header(HTTP_REFERER_HEADER, site_url);
        }
        if let Some(site_name) = self.config.site_name.as_deref() {
            request = request.header(TITLE_HEADER, site_name);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                GatewayError::Unavailable("request timed out".to_string())
            } else {
                GatewayError::Unavailable(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                provider_code = %parse_provider_error_code(&body),
                model = %self.config.model,
                stream,
                "completion provider rejected request"
            );
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        debug!(model = %self.config.model, stream, "completion provider accepted request");
        Ok(response)
    }
}

impl CompletionGateway for OpenRouterGateway {
    fn complete<'a>(&'a self, turns: Vec<Value>) -> CompletionFuture<'a, Value> {
        Box::pin(async move {
            let response = self.send(turns, false).await?;
            let body = response
                .bytes()
                .await
                .map_err(|err| GatewayError::StreamRead(err.to_string()))?;

            serde_json::from_slice::<Value>(&body)
                .map_err(|err| GatewayError::InvalidPayload(err.to_string()))
        })
    }

    fn stream<'a>(&'a self, turns: Vec<Value>) -> CompletionFuture<'a, CompletionStream> {
        Box::pin(async move {
            let response = self.send(turns, true).await?;
            let body: CompletionStream = response
                .bytes_stream()
                .map_err(|err| GatewayError::StreamRead(err.to_string()))
                .boxed();
            Ok(body)
        })
    }
}

fn parse_provider_error_code(body: &str) -> String {
    #[derive(Deserialize)]
    struct ProviderErrorEnvelope {
        error: Option<ProviderErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ProviderErrorDetails {
        code: Option<Value>,
    }

    let parsed = serde_json::from_str::<ProviderErrorEnvelope>(body).ok();
    let Some(provider_error_code) = parsed
        .and_then(|envelope| envelope.error)
        .and_then(|details| details.code)
    else {
        return "unknown".to_string();
    };

    match provider_error_code {
        Value::String(code) => code,
        Value::Number(code) => code.to_string(),
        _ => "unknown".to_string(),
    }
}
