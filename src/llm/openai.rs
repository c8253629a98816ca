//! OpenAI-compatible chat completions backend.

use super::{ChatMessage, ChatModel, ChatRequest, ModelTurn, ToolCallRequest};
use crate::config::ModelSettings;
use crate::error::{KursError, Result};
use crate::openai::create_client;
use crate::tools::ToolSpec;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    FunctionCall, FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model served by an OpenAI-compatible API.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIChatModel {
    /// Create a chat model from settings.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        Ok(Self::with_client(
            create_client(settings)?,
            &settings.model,
            settings.temperature,
            settings.max_tokens,
        ))
    }

    /// Create a chat model with an existing client.
    pub fn with_client(client: Client<OpenAIConfig>, model: &str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }
}

fn transport<E: std::fmt::Display>(e: E) -> KursError {
    KursError::ModelTransport(e.to_string())
}

fn to_openai_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let converted = match message {
        ChatMessage::System(content) => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(transport)?
            .into(),
        ChatMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(transport)?
            .into(),
        ChatMessage::Assistant { content, tool_calls } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(text) = content {
                args.content(text.clone());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(
                    tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            args.build().map_err(transport)?.into()
        }
        ChatMessage::Tool {
            tool_call_id,
            content,
        } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(tool_call_id.clone())
            .content(content.clone())
            .build()
            .map_err(transport)?
            .into(),
    };

    Ok(converted)
}

fn to_openai_tool(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.input_schema()),
            strict: None,
        },
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    #[allow(deprecated)]
    async fn complete(&self, request: ChatRequest) -> Result<ModelTurn> {
        let messages = request
            .messages
            .iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);

        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(to_openai_tool).collect::<Vec<_>>())
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        let response = self
            .client
            .chat()
            .create(args.build().map_err(transport)?)
            .await
            .map_err(|e| KursError::ModelTransport(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KursError::ModelTransport("No response from model".to_string()))?;

        let tool_calls: Vec<ToolCallRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!("Model returned {} tool calls", tool_calls.len());

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParameterKind, ToolParameter};

    #[test]
    fn test_tool_conversion() {
        let spec = ToolSpec {
            name: "get_course_outline".to_string(),
            description: "Outline".to_string(),
            parameters: vec![ToolParameter::required("course_name", ParameterKind::String, "Course")],
        };

        let tool = to_openai_tool(&spec);
        assert_eq!(tool.function.name, "get_course_outline");
        assert_eq!(tool.function.parameters, Some(spec.input_schema()));
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            ChatMessage::System("sys".to_string()),
            ChatMessage::User("hi".to_string()),
            ChatMessage::Assistant {
                content: None,
                tool_calls: vec![ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "search_course_content".to_string(),
                    arguments: r#"{"query":"x"}"#.to_string(),
                }],
            },
            ChatMessage::Tool {
                tool_call_id: "call_1".to_string(),
                content: "result".to_string(),
            },
        ];

        let converted: Vec<_> = messages.iter().map(|m| to_openai_message(m).unwrap()).collect();
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[1], ChatCompletionRequestMessage::User(_)));
        match &converted[2] {
            ChatCompletionRequestMessage::Assistant(msg) => {
                let calls = msg.tool_calls.as_ref().unwrap();
                assert_eq!(calls[0].function.name, "search_course_content");
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert!(matches!(converted[3], ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn test_model_from_settings() {
        let model = OpenAIChatModel::from_settings(&ModelSettings::default()).unwrap();
        assert_eq!(model.model, "gpt-4o-mini");
        assert_eq!(model.max_tokens, 800);
    }
}
