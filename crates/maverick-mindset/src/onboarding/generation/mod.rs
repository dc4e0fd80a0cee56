//! Generative-text seam: prompt templates, the generator trait and validation of structured
//! output before it reaches the plan or the catalogs.

mod client;
mod output;
mod prompts;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use client::{ChatCompletionsClient, ChatCompletionsConfig};
pub use output::{parse_challenge, parse_plan, parse_quiz, ChallengeDraft, QuizDraft};
pub(crate) use output::{parse_catch_up_week, parse_text};

/// Produces text for a rendered prompt. Implementations are blocking.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    OnboardingPlan,
    Quiz,
    Challenge,
    CatchUpPlan,
    Chat,
    Report,
}

impl PromptTemplate {
    pub const fn label(self) -> &'static str {
        match self {
            Self::OnboardingPlan => "onboarding_plan",
            Self::Quiz => "quiz",
            Self::Challenge => "challenge",
            Self::CatchUpPlan => "catch_up_plan",
            Self::Chat => "chat",
            Self::Report => "report",
        }
    }

    /// Templates whose answer must be a single JSON document.
    pub const fn expects_json(self) -> bool {
        matches!(
            self,
            Self::OnboardingPlan | Self::Quiz | Self::Challenge | Self::CatchUpPlan
        )
    }

    pub const fn system_prompt(self) -> &'static str {
        prompts::system_prompt(self)
    }

    pub const fn user_template(self) -> &'static str {
        prompts::user_template(self)
    }

    /// Placeholders the user template reads; missing ones render as empty text.
    pub const fn placeholders(self) -> &'static [&'static str] {
        prompts::placeholders(self)
    }
}

/// A template plus the values substituted into its `{placeholder}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub template: PromptTemplate,
    pub variables: BTreeMap<String, String>,
}

impl PromptRequest {
    pub fn new(template: PromptTemplate) -> Self {
        Self {
            template,
            variables: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn system(&self) -> &'static str {
        self.template.system_prompt()
    }

    /// User message with every known placeholder replaced.
    pub fn render(&self) -> String {
        let pairs: Vec<(&str, &str)> = self
            .template
            .placeholders()
            .iter()
            .map(|key| {
                let value = self.variables.get(*key).map(String::as_str).unwrap_or("");
                (*key, value)
            })
            .collect();
        fill_template(self.template.user_template(), &pairs)
    }
}

/// Replaces each `{key}` in `template` with its value.
pub fn fill_template(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in pairs {
        let needle = format!("{{{}}}", key);
        out = out.replace(&needle, value);
    }
    out
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("text generation is not configured")]
    Disabled,
    #[error("generator request failed: {0}")]
    Transport(String),
    #[error("generator returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("generator returned no content")]
    Empty,
    #[error("generated {template} output is invalid: {reason}")]
    InvalidOutput {
        template: &'static str,
        reason: String,
    },
}

impl GenerationError {
    pub(crate) fn invalid(template: PromptTemplate, reason: impl Into<String>) -> Self {
        Self::InvalidOutput {
            template: template.label(),
            reason: reason.into(),
        }
    }
}
