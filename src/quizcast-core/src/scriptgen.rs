//! Script generation via an OpenAI-compatible chat API.
//!
//! Sends the prompt pair with strict-JSON output requested and parses the
//! reply into a validated [`AudioScript`].

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs, ResponseFormat,
};

use crate::config::ModelConfig;
use crate::error::RunError;
use crate::prompt::PromptPair;
use crate::script::AudioScript;

/// Client for the language-model collaborator that scripts the quiz audio.
pub struct ScriptGenerator {
    config: ModelConfig,
}

impl ScriptGenerator {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Ask the model for an audio script and validate its reply.
    ///
    /// A transport failure maps to [`RunError::ModelUnavailable`], an API
    /// error to [`RunError::ModelRefused`], and an unparseable reply to
    /// [`RunError::MalformedResponse`]. A parse failure never yields a
    /// partial script.
    pub async fn generate(&self, prompts: &PromptPair) -> Result<AudioScript, RunError> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| RunError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let config = OpenAIConfig::new()
            .with_api_key(&self.config.api_key)
            .with_api_base(&self.config.api_base);

        let client = Client::with_config(config).with_http_client(http_client);

        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: prompts.system_prompt.clone().into(),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: prompts.user_prompt.clone().into(),
                name: None,
            }),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .temperature(self.config.temperature)
            .response_format(ResponseFormat::JsonObject)
            .messages(messages)
            .build()
            .map_err(|e| RunError::Config(format!("Failed to build model request: {}", e)))?;

        let response = client.chat().create(request).await.map_err(|e| match e {
            OpenAIError::ApiError(api) => RunError::ModelRefused(api.message),
            other => RunError::ModelUnavailable(other.to_string()),
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                RunError::MalformedResponse("model reply contained no content".to_string())
            })?;

        AudioScript::from_json(&content)
    }
}
