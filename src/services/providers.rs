// AI Provider Service
// HTTP clients for the text-generation backends used by the rewriter

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

use super::rewriter::{GenerationError, TextGenerator};

const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_DEFAULT_URL: &str = "https://api.deepseek.com/chat/completions";
const GLM_DEFAULT_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const ANTHROPIC_DEFAULT_URL: &str = "https://api.anthropic.com/v1/messages";

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";
pub const GLM_DEFAULT_MODEL: &str = "glm-4-flash";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const REQUEST_TIMEOUT_SECS: u64 = 80;
const REWRITE_MAX_TOKENS: i32 = 4096;
const REWRITE_TEMPERATURE: f64 = 0.9;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured for {0}")]
    MissingApiKey(String),
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
}

/// Wire format spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAiCompatible,
    Anthropic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSpec {
    pub name: String,
    pub model: String,
}

impl ProviderSpec {
    /// Canonical provider name ("claude" is an alias of "anthropic").
    pub fn canonical_name(&self) -> &str {
        match self.name.as_str() {
            "claude" => "anthropic",
            other => other,
        }
    }

    pub fn kind(&self) -> Result<ProviderKind, ProviderError> {
        match self.canonical_name() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" | "deepseek" | "glm" => Ok(ProviderKind::OpenAiCompatible),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(ProviderError::UnsupportedProvider(other.to_string())),
        }
    }

    /// Model to request, falling back to the provider default.
    pub fn resolved_model(&self) -> String {
        if !self.model.trim().is_empty() {
            return self.model.trim().to_string();
        }
        match self.canonical_name() {
            "gemini" => GEMINI_DEFAULT_MODEL,
            "openai" => OPENAI_DEFAULT_MODEL,
            "deepseek" => DEEPSEEK_DEFAULT_MODEL,
            "glm" => GLM_DEFAULT_MODEL,
            "anthropic" => ANTHROPIC_DEFAULT_MODEL,
            _ => "",
        }
        .to_string()
    }
}

/// Parse `"name[:model]"`.
pub fn parse_provider(spec: &str) -> ProviderSpec {
    let spec = spec.trim();
    match spec.split_once(':') {
        Some((name, model)) => ProviderSpec {
            name: name.trim().to_lowercase(),
            model: model.trim().to_string(),
        },
        None => ProviderSpec {
            name: spec.to_lowercase(),
            model: String::new(),
        },
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
}

pub struct ProviderClient {
    client: Client,
    gemini_url: String,
    openai_url: String,
    deepseek_url: String,
    glm_url: String,
    anthropic_url: String,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self::with_client(client)
    }

    pub fn with_proxy(proxy_url: &str) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .proxy(proxy)
            .build()?;
        Ok(Self::with_client(client))
    }

    fn with_client(client: Client) -> Self {
        Self {
            client,
            gemini_url: env_url("GEMINI_API_URL", GEMINI_DEFAULT_URL),
            openai_url: env_url("OPENAI_API_URL", OPENAI_DEFAULT_URL),
            deepseek_url: env_url("DEEPSEEK_API_URL", DEEPSEEK_DEFAULT_URL),
            glm_url: env_url("GLM_API_URL", GLM_DEFAULT_URL),
            anthropic_url: env_url("ANTHROPIC_API_URL", ANTHROPIC_DEFAULT_URL),
        }
    }

    fn default_url(&self, provider: &str) -> &str {
        match provider {
            "gemini" => &self.gemini_url,
            "deepseek" => &self.deepseek_url,
            "glm" => &self.glm_url,
            "anthropic" | "claude" => &self.anthropic_url,
            _ => &self.openai_url,
        }
    }

    /// Send a single-turn prompt to the provider named by `spec`.
    pub async fn generate(
        &self,
        spec: &ProviderSpec,
        api_key: &str,
        custom_url: Option<&str>,
        prompt: &str,
    ) -> Result<ChatResult, ProviderError> {
        let url = custom_url.unwrap_or_else(|| self.default_url(spec.canonical_name()));
        let model = spec.resolved_model();
        match spec.kind()? {
            ProviderKind::Gemini => self.call_gemini_api(url, &model, api_key, prompt).await,
            ProviderKind::OpenAiCompatible => {
                self.call_chat_api(url, &model, api_key, prompt, REWRITE_MAX_TOKENS).await
            }
            ProviderKind::Anthropic => {
                self.call_anthropic_api(url, &model, api_key, prompt, REWRITE_MAX_TOKENS)
                    .await
            }
        }
    }

    async fn call_gemini_api(
        &self,
        base_url: &str,
        model: &str,
        api_key: &str,
        prompt: &str,
    ) -> Result<ChatResult, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("X-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let data: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult { content, latency_ms })
    }

    async fn call_anthropic_api(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        prompt: &str,
        max_tokens: i32,
    ) -> Result<ChatResult, ProviderError> {
        #[derive(Serialize)]
        struct AnthropicRequest {
            model: String,
            max_tokens: i32,
            messages: Vec<ChatMessage>,
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Option<Vec<AnthropicContent>>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            text: Option<String>,
        }

        let request = AnthropicRequest {
            model: model.to_string(),
            max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let data: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .content
            .and_then(|c| c.into_iter().find_map(|c| c.text))
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult { content, latency_ms })
    }

    async fn call_chat_api(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        prompt: &str,
        max_tokens: i32,
    ) -> Result<ChatResult, ProviderError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
            temperature: REWRITE_TEMPERATURE,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult { content, latency_ms })
    }
}

async fn read_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::RateLimited;
    }
    let body = response.text().await.unwrap_or_default();
    ProviderError::ApiError {
        status: status.as_u16(),
        message: body,
    }
}

fn env_url(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Get API key from environment or config file
pub fn get_api_key(provider: &str) -> Option<String> {
    let env_keys: &[&str] = match provider {
        "gemini" => &["GEMINI_API_KEY", "REHUMANIZER_GEMINI_API_KEY"],
        "openai" => &["OPENAI_API_KEY", "REHUMANIZER_OPENAI_API_KEY"],
        "deepseek" => &["DEEPSEEK_API_KEY", "REHUMANIZER_DEEPSEEK_API_KEY"],
        "glm" => &["GLM_API_KEY", "REHUMANIZER_GLM_API_KEY"],
        "anthropic" | "claude" => &["ANTHROPIC_API_KEY", "REHUMANIZER_ANTHROPIC_API_KEY"],
        _ => &[],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    let store = super::ConfigStore::default_config_dir().map(super::ConfigStore::new)?;
    store.get_api_key(provider).ok().flatten()
}

fn resolve_custom_url(provider: &str) -> Option<String> {
    let store = super::ConfigStore::default_config_dir().map(super::ConfigStore::new)?;
    store.get_provider_url(provider).ok().flatten()
}

/// A configured provider exposed as a text-generation capability.
pub struct ProviderGenerator {
    client: ProviderClient,
    spec: ProviderSpec,
    api_key: String,
    custom_url: Option<String>,
}

impl ProviderGenerator {
    pub fn new(client: ProviderClient, spec: ProviderSpec, api_key: String) -> Self {
        Self {
            client,
            spec,
            api_key,
            custom_url: None,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.custom_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    /// Build from a `"name[:model]"` spec, resolving the key and any
    /// configured base URL.
    pub fn from_spec(spec: &str, proxy: Option<&str>) -> Result<Self, ProviderError> {
        let spec = parse_provider(spec);
        spec.kind()?;
        let api_key = get_api_key(spec.canonical_name())
            .ok_or_else(|| ProviderError::MissingApiKey(spec.name.clone()))?;
        let client = match proxy {
            Some(p) => ProviderClient::with_proxy(p)?,
            None => ProviderClient::new(),
        };
        let url = resolve_custom_url(spec.canonical_name());
        info!(
            "[PROVIDERS] Using provider={} model={} custom_url={}",
            spec.canonical_name(),
            spec.resolved_model(),
            url.is_some()
        );
        Ok(Self::new(client, spec, api_key).with_url(url))
    }

    /// `"name:model"` label for logs and health reports.
    pub fn label(&self) -> String {
        format!("{}:{}", self.spec.canonical_name(), self.spec.resolved_model())
    }
}

#[async_trait]
impl TextGenerator for ProviderGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self
            .client
            .generate(&self.spec, &self.api_key, self.custom_url.as_deref(), prompt)
            .await
        {
            Ok(result) => {
                info!(
                    "[PROVIDERS] {} ok latency_ms={} chars={}",
                    self.label(),
                    result.latency_ms,
                    result.content.chars().count()
                );
                Ok(result.content)
            }
            Err(e) => {
                warn!("[PROVIDERS] {} failed: {}", self.label(), e);
                Err(GenerationError::Provider(e))
            }
        }
    }

    fn name(&self) -> String {
        self.label()
    }
}
