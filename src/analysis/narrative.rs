//! Optional free-text treatment notes from a chat-completions endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_NARRATIVE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_NARRATIVE_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_NARRATIVE_TIMEOUT: Duration = Duration::from_secs(20);

const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 300;

const SYSTEM_PROMPT: &str = "You are a clinical microbiology expert providing concise treatment \
recommendations for antibiotic-resistant bacterial infections.";

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Response contained no text")]
    EmptyResponse,
}

/// Generates treatment notes for a resistant sample
pub trait NarrativeGenerator: Send + Sync {
    /// # Errors
    ///
    /// Any failure; callers fall back to a canned note.
    fn generate(
        &self,
        genes: &[String],
        recommended: &[String],
        avoid: &[String],
    ) -> Result<String, NarrativeError>;
}

/// Settings for [`ChatCompletionNarrator`]
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    pub api_key: String,
    pub url: String,
    pub model: String,
    pub timeout: Duration,
}

impl NarrativeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: DEFAULT_NARRATIVE_URL.to_string(),
            model: DEFAULT_NARRATIVE_MODEL.to_string(),
            timeout: DEFAULT_NARRATIVE_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

/// Narrative generator backed by an OpenAI-compatible chat-completions API.
///
/// Uses a blocking client; build it outside any async runtime.
pub struct ChatCompletionNarrator {
    client: reqwest::blocking::Client,
    config: NarrativeConfig,
}

impl ChatCompletionNarrator {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }
}

fn build_prompt(genes: &[String], recommended: &[String], avoid: &[String]) -> String {
    format!(
        "Provide concise treatment recommendations for a Staphylococcus aureus infection \
with the following antibiotic resistance genes: {}.\n\n\
Based on the resistance profile, these antibiotics are likely to be effective: {}.\n\
These antibiotics should be avoided due to resistance: {}.\n\n\
Please provide:\n\
1. A brief explanation of the clinical significance of these resistance genes\n\
2. Any additional considerations for treatment\n\
3. Alternative treatment options if the first-line recommendations fail\n\n\
Keep the response under 150 words and focus on practical clinical advice.",
        genes.join(", "),
        recommended.join(", "),
        avoid.join(", ")
    )
}

impl NarrativeGenerator for ChatCompletionNarrator {
    fn generate(
        &self,
        genes: &[String],
        recommended: &[String],
        avoid: &[String],
    ) -> Result<String, NarrativeError> {
        let prompt = build_prompt(genes, recommended, avoid);
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response: ChatResponse = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(NarrativeError::EmptyResponse)
    }
}
