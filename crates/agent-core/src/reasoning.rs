//! Reasoning Loop
//!
//! ReAct-style loop: ask the model, run the tool it requests, feed the
//! result back, and stop once it answers without a tool call.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{ToolCall, ToolRegistry, ToolResult};

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub system_prompt: String,

    /// Upper bound on model round trips per user turn
    pub max_iterations: usize,

    pub generation: GenerationOptions,

    /// Append the registry's tool descriptions to the system prompt
    pub inject_tool_descriptions: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant.

When you need to use a tool, respond with a JSON block in this exact format:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, synthesize them into a helpful response.
If you can answer directly without tools, do so."#;

const TOOL_FENCE: &str = "```tool";
const FENCE_END: &str = "```";

/// The agent: a provider, a tool registry and a configuration
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Full system prompt including tool descriptions
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Run one user turn. The caller has already pushed the user message.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        conversation.ensure_system_prompt(self.system_prompt());

        for iteration in 1..=self.config.max_iterations {
            conversation.truncate_to_fit();

            let completion = self
                .provider
                .complete(conversation.messages(), &self.config.generation)
                .await?;
            let content = completion.content;

            conversation.push(Message::assistant(content.clone()));

            let Some(call) = parse_tool_call(&content) else {
                return Ok(content);
            };

            tracing::debug!(tool = %call.name, iteration, "Executing tool");
            let result = self.execute_tool(&call).await;
            conversation.push(Message::tool(format_tool_result(&result), call.id.clone()));
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// One-shot question in a throwaway conversation
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::with_system_prompt(self.system_prompt());
        conversation.push(Message::user(question));
        self.run(&mut conversation).await
    }

    /// Registry errors (unknown tool, bad arguments) become failed results
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id.clone_from(&call.id);
                result
            }
            Err(e) => {
                tracing::debug!(tool = %call.name, error = %e, "Tool call rejected");
                ToolResult {
                    name: call.name.clone(),
                    id: call.id.clone(),
                    success: false,
                    output: format!("Error: {e}"),
                    data: None,
                }
            }
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Extract a tool call from a model reply: a fenced ```` ```tool ```` block
/// first, then a bare JSON object mentioning `"tool"`.
pub fn parse_tool_call(content: &str) -> Option<ToolCall> {
    let mut call = parse_fenced_tool_call(content).or_else(|| parse_inline_tool_call(content))?;
    if call.id.is_none() {
        call.id = Some(uuid::Uuid::new_v4().to_string());
    }
    Some(call)
}

fn parse_fenced_tool_call(content: &str) -> Option<ToolCall> {
    let start = content.find(TOOL_FENCE)? + TOOL_FENCE.len();
    let body = &content[start..];
    let end = body.find(FENCE_END)?;
    serde_json::from_str(body[..end].trim()).ok()
}

fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str(&content[start..=end]).ok()
}

fn format_tool_result(result: &ToolResult) -> String {
    if result.success {
        format!("[Tool '{}' returned]\n{}", result.name, result.output)
    } else {
        format!("[Tool '{}' failed]\n{}", result.name, result.output)
    }
}

/// Builder for [`Agent`]
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::provider::{Completion, ModelInfo, ProviderInfo};
    use crate::tool::{ParameterSchema, Tool, ToolSchema};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies with canned responses in order
    struct ScriptedProvider {
        replies: Mutex<VecDeque<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn info(&self) -> Result<ProviderInfo> {
            Ok(ProviderInfo {
                name: "scripted".into(),
                default_model: "scripted".into(),
                models: Vec::new(),
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "out of script".into());
            Ok(Completion::text(reply, options.model.clone()))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "upper".into(),
                description: "Uppercase text".into(),
                parameters: vec![ParameterSchema::required("text", "string", "Input")],
                category: None,
                has_side_effects: false,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success("upper", call.required_str("text")?.to_uppercase()))
        }
    }

    fn agent(replies: &[&str], max_iterations: usize) -> Agent {
        AgentBuilder::new()
            .provider(Arc::new(ScriptedProvider::new(replies)))
            .tool(UpperTool)
            .max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_fenced_tool_call() {
        let content = "Let me check.\n```tool\n{\"tool\": \"upper\", \"arguments\": {\"text\": \"btc\"}}\n```";
        let call = parse_tool_call(content).unwrap();
        assert_eq!(call.name, "upper");
        assert_eq!(call.str_arg("text"), Some("btc"));
        assert!(call.id.is_some());
    }

    #[test]
    fn test_parse_inline_tool_call() {
        let content = r#"Calling {"tool": "upper", "arguments": {"text": "eth"}} now"#;
        let call = parse_tool_call(content).unwrap();
        assert_eq!(call.name, "upper");
    }

    #[test]
    fn test_plain_answer_is_not_a_tool_call() {
        assert!(parse_tool_call("Bitcoin looks range-bound this week.").is_none());
    }

    #[tokio::test]
    async fn test_run_executes_tool_then_answers() {
        let agent = agent(
            &[
                "```tool\n{\"tool\": \"upper\", \"arguments\": {\"text\": \"sol\"}}\n```",
                "The answer is SOL.",
            ],
            5,
        );

        let mut conversation = Conversation::new();
        conversation.push(Message::user("shout sol"));
        let answer = agent.run(&mut conversation).await.unwrap();

        assert_eq!(answer, "The answer is SOL.");
        let tool_msg = conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_msg.content.contains("[Tool 'upper' returned]"));
        assert!(tool_msg.content.contains("SOL"));
        assert_eq!(conversation.messages()[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_tool_errors_are_fed_back_not_raised() {
        let agent = agent(
            &[
                "```tool\n{\"tool\": \"missing_tool\", \"arguments\": {}}\n```",
                "Sorry, I could not do that.",
            ],
            5,
        );

        let answer = agent.ask("do something").await.unwrap();
        assert_eq!(answer, "Sorry, I could not do that.");
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let call = "```tool\n{\"tool\": \"upper\", \"arguments\": {\"text\": \"x\"}}\n```";
        let agent = agent(&[call, call, call], 2);

        let err = agent.ask("loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(2)));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(
            AgentBuilder::new().build(),
            Err(AgentError::Config(_))
        ));
    }
}
