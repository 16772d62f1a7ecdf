//! Generated worker headline and blurb, backed by a chat-completion provider.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use super::domain::{Principal, WorkerProfile};
use super::error::HiringError;
use super::repository::ProfileRepository;
use crate::config::TextGenerationConfig;

pub const TITLE_LIMIT: usize = 60;
pub const DESCRIPTION_LIMIT: usize = 200;

const SYSTEM_PROMPT: &str = "You write short professional profiles for home-service workers. \
Reply with valid JSON only, no markdown and no extra text.";

#[derive(Debug, Error)]
pub enum TextGenerationError {
    #[error("text generation provider is not configured")]
    NotConfigured,
    #[error("text generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("text generation provider answered {status}")]
    Provider { status: u16 },
    #[error("text generation reply was not the expected JSON: {0}")]
    MalformedReply(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCopy {
    pub profile_title: String,
    pub profile_description: String,
}

#[async_trait]
pub trait ProfileTextGenerator: Send + Sync {
    async fn generate(&self, worker: &WorkerProfile) -> Result<ProfileCopy, TextGenerationError>;
}

/// Stand-in used when no provider key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredWriter;

#[async_trait]
impl ProfileTextGenerator for UnconfiguredWriter {
    async fn generate(&self, _worker: &WorkerProfile) -> Result<ProfileCopy, TextGenerationError> {
        Err(TextGenerationError::NotConfigured)
    }
}

/// Builds the user prompt from the worker's public attributes only.
pub fn build_prompt(worker: &WorkerProfile) -> String {
    let skills = worker
        .work
        .skills
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Write a profile title (at most {TITLE_LIMIT} characters) summarising skills and \
         experience, and a description (at most {DESCRIPTION_LIMIT} characters) highlighting \
         expertise and location.\n\n\
         Name: {name}\nGender: {gender}\nState: {state}\nCity: {city}\n\
         Experience: {experience} years\nJob type: {job_type}\nSkills: {skills}\n\n\
         Answer with exactly this JSON shape:\n\
         {{\"profile_title\": \"...\", \"profile_description\": \"...\"}}",
        name = worker.personal.full_name,
        gender = worker.personal.gender,
        state = worker.personal.state,
        city = worker.personal.city,
        experience = worker.work.experience_years,
        job_type = worker.work.job_type,
    )
}

/// Parses a bare JSON reply and clamps both fields to their limits.
pub fn parse_copy(reply: &str) -> Result<ProfileCopy, TextGenerationError> {
    let copy: ProfileCopy = serde_json::from_str(reply.trim())
        .map_err(|err| TextGenerationError::MalformedReply(err.to_string()))?;
    Ok(ProfileCopy {
        profile_title: clamp(copy.profile_title.trim(), TITLE_LIMIT),
        profile_description: clamp(copy.profile_description.trim(), DESCRIPTION_LIMIT),
    })
}

fn clamp(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// OpenAI-compatible `/v1/chat/completions` client.
pub struct ChatCompletionWriter {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionWriter {
    pub fn new(
        config: &TextGenerationConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, TextGenerationError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ProfileTextGenerator for ChatCompletionWriter {
    async fn generate(&self, worker: &WorkerProfile) -> Result<ProfileCopy, TextGenerationError> {
        let payload = json!({
            "model": self.model,
            "temperature": 0.7,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(worker) },
            ],
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TextGenerationError::Provider {
                status: status.as_u16(),
            });
        }

        let body: CompletionBody = response
            .json()
            .await
            .map_err(|err| TextGenerationError::MalformedReply(err.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TextGenerationError::MalformedReply("empty completion".to_string()))?;
        parse_copy(&content)
    }
}

impl std::fmt::Debug for ChatCompletionWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionWriter")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Regenerates and stores a worker's title and description.
pub struct ProfileWriter<P> {
    generator: Arc<dyn ProfileTextGenerator>,
    profiles: Arc<P>,
}

impl<P> ProfileWriter<P>
where
    P: ProfileRepository + 'static,
{
    pub fn new(generator: Arc<dyn ProfileTextGenerator>, profiles: Arc<P>) -> Self {
        Self {
            generator,
            profiles,
        }
    }

    pub async fn refresh(&self, principal: Principal) -> Result<WorkerProfile, HiringError> {
        let worker_id = principal
            .as_worker()
            .ok_or(HiringError::Forbidden("worker account required"))?;
        let mut profile = self
            .profiles
            .worker(worker_id)?
            .ok_or(HiringError::NotFound("worker"))?;

        let copy = self.generator.generate(&profile).await.map_err(|err| {
            warn!(worker_id = %worker_id, error = %err, "profile copy generation failed");
            HiringError::from(err)
        })?;

        profile.work.profile_title = copy.profile_title;
        profile.work.profile_description = copy.profile_description;
        let stored = self.profiles.update_worker(profile)?;
        info!(worker_id = %worker_id, "profile copy refreshed");
        Ok(stored)
    }
}
