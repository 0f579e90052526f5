use std::time::Duration;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use studio_logging::studio_debug;
use url::Url;

use crate::chat::ChatRequest;
use crate::data_uri::{base64_payload, data_uri_mime, encode_base64_data_uri};
use crate::fetch::map_reqwest_error;
use crate::sse::decode_text_stream;
use crate::wire::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GoogleSearch, Operation, Part, PredictResponse, Tool,
};
use crate::{ApiError, EditOutput, FailureKind, Inspiration, VideoJob};

pub type ChunkStream = BoxStream<'static, Result<String, ApiError>>;

const API_KEY_HEADER: &str = "x-goog-api-key";
const API_VERSION: &str = "v1beta";
const IMAGE_COUNT: u32 = 4;

/// System instruction of the code-review assistant.
pub const REVIEW_PERSONA: &str = "You are an expert code reviewer. Review the submitted code for bugs, security issues, performance problems, readability and adherence to idiomatic conventions of its language. Respond in Markdown with a short summary followed by a list of concrete findings, each with a suggested fix. If the code is fine, say so and mention optional improvements.";

/// Remote generation service. Every method is one request; none retries.
#[async_trait::async_trait]
pub trait GenerationApi: Send + Sync {
    /// Text-to-image; returns data URIs.
    async fn generate_images(&self, prompt: &str) -> Result<Vec<String>, ApiError>;

    /// Edits `image` inside the `mask` area following `prompt`. Both are data URIs.
    async fn edit_image(&self, image: &str, mask: &str, prompt: &str)
        -> Result<EditOutput, ApiError>;

    /// Starts a long-running video job.
    async fn submit_video(&self, prompt: &str) -> Result<VideoJob, ApiError>;

    /// One status query; returns a fresh snapshot.
    async fn poll_video(&self, job: &VideoJob) -> Result<VideoJob, ApiError>;

    /// Search-grounded answer with citations.
    async fn inspire(&self, prompt: &str) -> Result<Inspiration, ApiError>;

    async fn review_code(&self, code: &str, language: &str) -> Result<String, ApiError>;

    /// Opens a reply stream. The stream is finite and cannot be restarted.
    async fn stream_chat(&self, request: ChatRequest) -> Result<ChunkStream, ApiError>;

    /// URL to download a finished job's result from.
    fn result_url(&self, locator: &str) -> Result<String, ApiError> {
        Ok(locator.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base: String,
    pub api_key: String,
    pub image_model: String,
    pub edit_model: String,
    pub video_model: String,
    pub text_model: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            image_model: "imagen-4.0-generate-001".to_string(),
            edit_model: "gemini-2.5-flash-image-preview".to_string(),
            video_model: "veo-2.0-generate-001".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// REST client for the generative-language API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
    // No overall timeout: a chat stream lives as long as the model writes.
    stream_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(settings.api_base.trim_end_matches('/'))
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
            stream_client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{API_VERSION}/{path}"))
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn model_endpoint(&self, model: &str, method: &str) -> Result<Url, ApiError> {
        self.endpoint(&format!("models/{model}:{method}"))
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        studio_debug!("POST {} ({} bytes)", url.path(), body.len());
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.settings.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ApiError> {
        let url = self.model_endpoint(model, "generateContent")?;
        self.post_json(url, request).await
    }
}

#[async_trait::async_trait]
impl GenerationApi for GeminiClient {
    async fn generate_images(&self, prompt: &str) -> Result<Vec<String>, ApiError> {
        let url = self.model_endpoint(&self.settings.image_model, "predict")?;
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": IMAGE_COUNT,
                "aspectRatio": "1:1",
                "outputOptions": { "mimeType": "image/png" },
            },
        });
        let response: PredictResponse = self.post_json(url, &body).await?;
        let images: Vec<String> = response
            .predictions
            .into_iter()
            .filter_map(|prediction| {
                let data = prediction.bytes_base64_encoded?;
                let mime = prediction.mime_type.unwrap_or_else(|| "image/png".to_string());
                Some(encode_base64_data_uri(&mime, &data))
            })
            .collect();
        if images.is_empty() {
            return Err(ApiError::new(FailureKind::Decode, "no images in response"));
        }
        Ok(images)
    }

    async fn edit_image(
        &self,
        image: &str,
        mask: &str,
        prompt: &str,
    ) -> Result<EditOutput, ApiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline(
                    data_uri_mime(image).unwrap_or("image/png"),
                    base64_payload(image),
                ),
                Part::inline(
                    data_uri_mime(mask).unwrap_or("image/png"),
                    base64_payload(mask),
                ),
                Part::text(prompt),
            ])],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
                ..GenerationConfig::default()
            }),
            ..GenerateContentRequest::default()
        };
        let response = self
            .generate_content(&self.settings.edit_model, &request)
            .await?;
        Ok(EditOutput {
            text: response.text(),
            images: response.inline_media(),
        })
    }

    async fn submit_video(&self, prompt: &str) -> Result<VideoJob, ApiError> {
        let url = self.model_endpoint(&self.settings.video_model, "predictLongRunning")?;
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1 },
        });
        let operation: Operation = self.post_json(url, &body).await?;
        Ok(VideoJob::from(operation))
    }

    async fn poll_video(&self, job: &VideoJob) -> Result<VideoJob, ApiError> {
        let url = self.endpoint(&job.handle)?;
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.settings.api_key)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let operation: Operation = read_json(response).await?;
        Ok(VideoJob::from(operation))
    }

    async fn inspire(&self, prompt: &str) -> Result<Inspiration, ApiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
            ..GenerateContentRequest::default()
        };
        let response = self
            .generate_content(&self.settings.text_model, &request)
            .await?;
        Ok(Inspiration {
            text: response.text(),
            sources: response.citations(),
        })
    }

    async fn review_code(&self, code: &str, language: &str) -> Result<String, ApiError> {
        let prompt = format!("Please review the following {language} code:\n\n```{language}\n{code}\n```");
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(&prompt)])],
            system_instruction: Some(Content::system(REVIEW_PERSONA)),
            ..GenerateContentRequest::default()
        };
        let response = self
            .generate_content(&self.settings.text_model, &request)
            .await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ApiError::new(FailureKind::Decode, "empty review"));
        }
        Ok(text)
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<ChunkStream, ApiError> {
        let mut url = self.model_endpoint(&self.settings.text_model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");
        let body = GenerateContentRequest {
            contents: request
                .turns
                .iter()
                .map(|turn| Content::with_role(turn.role.as_str(), &turn.text))
                .collect(),
            system_instruction: Some(Content::system(&request.system_instruction)),
            generation_config: Some(GenerationConfig {
                temperature: Some(request.temperature),
                ..GenerationConfig::default()
            }),
            ..GenerateContentRequest::default()
        };
        let body = serde_json::to_vec(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .stream_client
            .post(url)
            .header(API_KEY_HEADER, &self.settings.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let bytes = response.bytes().await.map_err(map_reqwest_error)?;
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                error_message(&bytes, status),
            ));
        }
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error));
        Ok(decode_text_stream(bytes))
    }

    fn result_url(&self, locator: &str) -> Result<String, ApiError> {
        let mut url = Url::parse(locator)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.settings.api_key);
        Ok(url.to_string())
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            error_message(&bytes, status),
        ));
    }
    serde_json::from_slice(&bytes).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn error_message(body: &[u8], status: reqwest::StatusCode) -> String {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|err| err.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status.to_string())
}
