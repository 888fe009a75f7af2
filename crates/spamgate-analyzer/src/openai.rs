//! OpenAI-compatible chat completions analyzer
//!
//! Posts the text to `{base_url}/chat/completions` and reads
//! `choices[0].message.content` from the non-streaming response:
//! ```text
//! {"id":"chatcmpl-xxx","model":"gpt-4o-mini","choices":[{"index":0,"message":{"role":"assistant","content":"{\"isSpam\": false, ...}"}}]}
//! ```

use crate::analyzer::{Analyzer, AnalyzerFactory, DisabledAnalyzer};
use crate::error::AnalyzerError;
use crate::verdict::parse_verdict;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use spamgate_core::AnalyzerVerdict;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a content moderation assistant for a social network. \
Decide whether the user's post is spam. Spam includes unsolicited promotion, scams, phishing, \
misleading links, engagement bait, and repetitive or automated content. \
Respond with only a JSON object of the form \
{\"isSpam\": boolean, \"confidence\": number between 0 and 1, \"reasoning\": string, \
\"categories\": array of strings, \"severity\": \"low\" | \"medium\" | \"high\"}.";

const PROBE_PROMPT: &str = "Reply with the single word OK.";
const PROBE_ACK: &str = "OK";

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Client-side request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Completion budget per analysis
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_tokens() -> u32 {
    300
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Analyzer backed by an OpenAI-compatible endpoint
pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    settings: AnalyzerSettings,
    api_key: String,
}

impl OpenAiAnalyzer {
    /// Create a new analyzer for `api_key`
    pub fn new(settings: AnalyzerSettings, api_key: impl Into<String>) -> Result<Self, AnalyzerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AnalyzerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    /// Send one chat turn and return the assistant content
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, AnalyzerError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.1,
            max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Status(status.as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AnalyzerError::EmptyResponse)
    }
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    fn configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn analyze(&self, text: &str) -> Result<AnalyzerVerdict, AnalyzerError> {
        if !self.configured() {
            return Err(AnalyzerError::NotConfigured);
        }

        let user = format!("Analyze this post:\n\n{}", text);
        let content = self
            .complete(SYSTEM_PROMPT, &user, self.settings.max_tokens)
            .await?;

        let parsed = parse_verdict(&content);
        if parsed.is_fallback() {
            warn!(model = %self.settings.model, "Analyzer returned no usable verdict");
        }

        let verdict = parsed.into_verdict();
        debug!(
            is_spam = verdict.is_spam,
            confidence = verdict.confidence,
            "Analyzer verdict"
        );

        Ok(verdict)
    }

    async fn test_connection(&self) -> bool {
        if !self.configured() {
            return false;
        }

        match self.complete(PROBE_PROMPT, "ping", 5).await {
            Ok(reply) => reply.contains(PROBE_ACK),
            Err(e) => {
                warn!(error = %e, "Analyzer connection test failed");
                false
            }
        }
    }

    fn model(&self) -> Option<&str> {
        Some(&self.settings.model)
    }
}

/// Builds [`OpenAiAnalyzer`]s from shared settings
#[derive(Debug, Clone, Default)]
pub struct OpenAiAnalyzerFactory {
    settings: AnalyzerSettings,
}

impl OpenAiAnalyzerFactory {
    pub fn new(settings: AnalyzerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }
}

impl AnalyzerFactory for OpenAiAnalyzerFactory {
    fn build(&self, key: Option<&str>) -> Arc<dyn Analyzer> {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return Arc::new(DisabledAnalyzer);
        };

        match OpenAiAnalyzer::new(self.settings.clone(), key) {
            Ok(analyzer) => Arc::new(analyzer),
            Err(e) => {
                warn!(error = %e, "Failed to build analyzer client, analysis disabled");
                Arc::new(DisabledAnalyzer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: AnalyzerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.base_url, "https://api.openai.com/v1");
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.max_tokens, 300);
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let settings = AnalyzerSettings {
            base_url: "http://localhost:9000/v1/".to_string(),
            ..Default::default()
        };
        let analyzer = OpenAiAnalyzer::new(settings, "sk-test").unwrap();
        assert_eq!(analyzer.endpoint(), "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_factory_without_key_is_disabled() {
        let factory = OpenAiAnalyzerFactory::default();
        assert!(!factory.build(None).configured());
        assert!(!factory.build(Some("")).configured());

        let analyzer = factory.build(Some("sk-test"));
        assert!(analyzer.configured());
        assert_eq!(analyzer.model(), Some("gpt-4o-mini"));
    }
}
