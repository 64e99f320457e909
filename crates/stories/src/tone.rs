//! Emotional tone classification through the generation model.

use crate::text::take_graphemes;
use peerconnect_core::config::AppConfig;
use peerconnect_core::{AppError, AppResult, ProviderPhase};
use peerconnect_llm::{create_client, LlmClient, LlmRequest};
use peerconnect_prompt::{
    build_prompt, load_prompt, PromptDefinition, TONE_ARTICLE_PROMPT_ID, TONE_ENTRY_PROMPT_ID,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Characters of an article sent for classification
pub const ARTICLE_CLASSIFY_CHARS: usize = 500;

/// A short tone label such as "hopeful" or "anxious".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tone(String);

impl Tone {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    /// Clean a raw model response into a label.
    ///
    /// Uses the first non-empty line, drops a leading `Tone:`, surrounding
    /// quotes or emphasis, and trailing punctuation. An empty result is
    /// `unknown`.
    pub fn from_response(raw: &str) -> Self {
        let line = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
        let line = match line.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("tone:") => line[5..].trim(),
            _ => line,
        };
        let label = line
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`'))
            .trim_end_matches(['.', '!'])
            .trim();

        if label.is_empty() || label.eq_ignore_ascii_case(Self::UNKNOWN) {
            Self::unknown()
        } else {
            Self(label.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::UNKNOWN)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Requests tone labels from an [`LlmClient`].
pub struct ToneClassifier {
    client: Arc<dyn LlmClient>,
    model: String,
    entry_prompt: PromptDefinition,
    article_prompt: PromptDefinition,
}

impl ToneClassifier {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        entry_prompt: PromptDefinition,
        article_prompt: PromptDefinition,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            entry_prompt,
            article_prompt,
        }
    }

    /// Build a classifier from the configured provider and workspace prompts.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let ollama = config.ollama_settings();
        let client = create_client(&config.provider, &ollama)?;
        let (entry_prompt, _) = load_prompt(&config.workspace, TONE_ENTRY_PROMPT_ID)?;
        let (article_prompt, _) = load_prompt(&config.workspace, TONE_ARTICLE_PROMPT_ID)?;

        Ok(Self::new(client, ollama.model, entry_prompt, article_prompt))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Label a mood entry in one or two words.
    ///
    /// # Errors
    /// `AppError::ProviderUnavailable` (classify phase) if the model call
    /// fails. An empty response is not an error; it yields `unknown`.
    pub async fn classify_entry(&self, text: &str) -> AppResult<Tone> {
        self.classify_with(&self.entry_prompt, text).await
    }

    /// Label an article from its first 500 characters.
    pub async fn classify_article(&self, text: &str) -> AppResult<Tone> {
        self.classify_with(&self.article_prompt, take_graphemes(text, ARTICLE_CLASSIFY_CHARS))
            .await
    }

    /// Like [`classify_entry`](Self::classify_entry), but a failure is logged
    /// and reported as `unknown`.
    pub async fn classify_entry_or_unknown(&self, text: &str) -> Tone {
        match self.classify_entry(text).await {
            Ok(tone) => tone,
            Err(e) => {
                tracing::warn!("Tone classification failed, using '{}': {}", Tone::UNKNOWN, e);
                Tone::unknown()
            }
        }
    }

    #[instrument(skip(self, prompt, text), fields(prompt = %prompt.id, model = %self.model))]
    async fn classify_with(&self, prompt: &PromptDefinition, text: &str) -> AppResult<Tone> {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), text.to_string());
        let built = build_prompt(prompt, vars)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|e| AppError::unavailable(ProviderPhase::Classify, e))?;

        let tone = Tone::from_response(&response.content);
        tracing::debug!("Classified tone: {}", tone);
        Ok(tone)
    }
}
