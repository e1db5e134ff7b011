use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ChatModel, ChatRequest, GeneratedImage, ImageModel, ImageRequest};
use crate::{
    config::OpenAiConfig,
    errors::{AppError, Result},
};

const ERROR_BODY_LIMIT: usize = 500;

/// Chat and image client for the OpenAI REST API, or any server that speaks
/// the same `/chat/completions` and `/images/generations` dialect.
#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    chat_model: String,
    image_model: String,
}

impl OpenAiProvider {
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(AppError::MissingConfig("openai.api_key"))?;

        let mut builder =
            HttpClient::builder().user_agent(concat!("prompt-forge/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            api_key,
            base_url: config.base_url.clone(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .http_client
            .post(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::provider(format!(
                "{path} returned {status}: {}",
                summarize_error_body(&body)
            )));
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl ChatModel for OpenAiProvider {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let messages = [
            RequestMessage {
                role: "system",
                content: &request.system,
            },
            RequestMessage {
                role: "user",
                content: &request.user,
            },
        ];
        let payload = ChatCompletionRequest {
            model: &self.chat_model,
            messages: &messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            target: "openai_provider",
            model = %self.chat_model,
            max_tokens = request.max_tokens,
            temperature = request.temperature,
            "sending chat completion"
        );

        let response: ChatCompletionResponse = self.post_json("chat/completions", &payload).await?;
        response
            .extract_text()
            .ok_or_else(|| AppError::provider("chat completion returned no text"))
    }
}

#[async_trait]
impl ImageModel for OpenAiProvider {
    async fn generate(&self, request: ImageRequest) -> Result<Vec<GeneratedImage>> {
        let payload = ImageGenerationRequest {
            model: &self.image_model,
            prompt: &request.prompt,
            size: request.size.as_str(),
            quality: request.quality.as_str(),
            n: request.count,
        };

        debug!(
            target: "openai_provider",
            model = %self.image_model,
            size = %request.size,
            quality = %request.quality,
            "sending image generation"
        );

        let response: ImageGenerationResponse =
            self.post_json("images/generations", &payload).await?;
        Ok(response.into_images())
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        debug!(target: "openai_provider", "fetching image from {url}");
        let response = self
            .http_client
            .get(url)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::provider(format!(
                "image download returned {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?)
    }

    fn model_name(&self) -> &str {
        &self.image_model
    }
}

fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    trimmed.chars().take(ERROR_BODY_LIMIT).collect()
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [RequestMessage<'a>],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

impl ChatCompletionResponse {
    fn extract_text(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref()?.content.as_ref()?.extract_text())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

#[derive(Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Segments(Vec<MessageSegment>),
}

impl MessageContent {
    fn extract_text(&self) -> Option<String> {
        match self {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::Segments(segments) if segments.is_empty() => None,
            MessageContent::Segments(segments) => Some(
                segments
                    .iter()
                    .filter_map(|segment| segment.text.as_deref())
                    .collect::<Vec<_>>()
                    .join(""),
            ),
        }
    }
}

#[derive(Deserialize)]
struct MessageSegment {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u32,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

impl ImageGenerationResponse {
    fn into_images(self) -> Vec<GeneratedImage> {
        self.data
            .into_iter()
            .map(|datum| GeneratedImage {
                url: datum.url,
                revised_prompt: datum.revised_prompt,
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ImageQuality, ImageSize};

    fn config(api_key: Option<&str>) -> OpenAiConfig {
        OpenAiConfig {
            api_key: api_key.map(str::to_string),
            base_url: "http://localhost:9/v1".into(),
            chat_model: "gpt-4".into(),
            image_model: "dall-e-3".into(),
            request_timeout: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn building_without_key_fails() {
        assert!(matches!(
            OpenAiProvider::from_config(&config(None)),
            Err(AppError::MissingConfig(_))
        ));
    }

    #[test]
    fn endpoints_join_base_url() {
        let provider = OpenAiProvider::from_config(&config(Some("sk"))).unwrap();
        assert_eq!(
            provider.endpoint("chat/completions"),
            "http://localhost:9/v1/chat/completions"
        );
        assert_eq!(provider.model_name(), "dall-e-3");
    }

    #[test]
    fn chat_payload_shape() {
        let messages = [
            RequestMessage {
                role: "system",
                content: "be brief",
            },
            RequestMessage {
                role: "user",
                content: "hi",
            },
        ];
        let payload = ChatCompletionRequest {
            model: "gpt-4",
            messages: &messages,
            max_tokens: 300,
            temperature: 0.5,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 300);
        assert_eq!(value["temperature"], 0.5);
    }

    #[test]
    fn image_payload_shape() {
        let payload = ImageGenerationRequest {
            model: "dall-e-3",
            prompt: "a fox",
            size: ImageSize::Portrait.as_str(),
            quality: ImageQuality::Hd.as_str(),
            n: 1,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["size"], "1024x1792");
        assert_eq!(value["quality"], "hd");
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn reads_plain_string_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  refined prompt \n"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.extract_text().as_deref(), Some("refined prompt"));
    }

    #[test]
    fn reads_segmented_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":[{"type":"text","text":"part one, "},{"type":"text","text":"part two"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.extract_text().as_deref(),
            Some("part one, part two")
        );
    }

    #[test]
    fn empty_choices_yield_nothing() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(response.extract_text().is_none());

        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(response.extract_text().is_none());
    }

    #[test]
    fn decodes_image_urls() {
        let response: ImageGenerationResponse = serde_json::from_str(
            r#"{"created":1,"data":[{"url":"https://img.example/1.png","revised_prompt":"a red fox"}]}"#,
        )
        .unwrap();
        let images = response.into_images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url.as_deref(), Some("https://img.example/1.png"));
        assert_eq!(images[0].revised_prompt.as_deref(), Some("a red fox"));
    }

    #[test]
    fn error_bodies_are_summarized() {
        assert_eq!(
            summarize_error_body(r#"{"error":{"message":"Incorrect API key provided"}}"#),
            "Incorrect API key provided"
        );
        assert_eq!(summarize_error_body("   "), "empty response body");
        assert_eq!(summarize_error_body(&"x".repeat(900)).len(), ERROR_BODY_LIMIT);
    }
}
