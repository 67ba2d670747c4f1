//! Language-Model Capability
//!
//! A thin contract over chat completions. The core only ever needs two
//! shapes of call: a free-text completion (narration) and a completion
//! constrained to a single JSON object (interest filtering), both driven by
//! a fixed instruction plus one user input.

use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use async_trait::async_trait;

/// A generic client for one-shot completions against a language model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-text completion.
    async fn complete(&self, instruction: &str, input: &str) -> Result<String>;

    /// Completion constrained to return a single JSON object.
    async fn complete_json(&self, instruction: &str, input: &str) -> Result<String>;
}

/// An implementation of `LanguageModel` for any OpenAI-compatible API.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatModel {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration (key, base URL).
    /// * `model` - Model identifier for chat completions (e.g. "gpt-4o-mini").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    async fn request(
        &self,
        instruction: &str,
        input: &str,
        response_format: Option<ResponseFormat>,
    ) -> Result<String> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instruction)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(input)
                .build()?
                .into(),
        ]);
        if let Some(format) = response_format {
            builder.response_format(format);
        }
        let request = builder.build()?;

        let response = self.client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from model")?
            .message
            .content
            .as_ref()
            .context("No content in model response")?;

        Ok(answer.clone())
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    async fn complete(&self, instruction: &str, input: &str) -> Result<String> {
        self.request(instruction, input, None).await
    }

    async fn complete_json(&self, instruction: &str, input: &str) -> Result<String> {
        self.request(instruction, input, Some(ResponseFormat::JsonObject))
            .await
    }
}
