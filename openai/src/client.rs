use crate::{
    DEEPSEEK_BASE_URL, DEFAULT_BASE_URL, DEFAULT_MODEL, OPENROUTER_BASE_URL,
    error::OpenAIError,
    request::{
        ChatCompletionRequest, ChatMessagePayload, ParameterSnapshot, ResponsesInputItem,
        ResponsesRequest, ResponsesTool, ResponsesToolChoice, ToolPayload,
        convert_responses_tools, convert_tools, responses_tool_choice, to_chat_messages,
        to_responses_input,
    },
    response::{ChatCompletionChunk, ChatCompletionResponse, ResponsesOutput, should_skip_event},
};
use aither_core::{
    LanguageModel,
    llm::{
        Event, LLMRequest, ToolCall,
        model::{Ability, Profile as ModelProfile},
        tool::ToolDefinition,
    },
};
use futures_core::Stream;
use futures_lite::StreamExt;
use std::{future::Future, pin::Pin, sync::Arc};
use zenwave::{Client, client, header};

/// `OpenAI` model backed by the Responses API by default, with legacy
/// `chat.completions` support for compatibility.
#[derive(Clone, Debug)]
pub struct OpenAI {
    inner: Arc<Config>,
}

/// Selects which OpenAI API surface to use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApiKind {
    /// The recommended Responses API.
    Responses,
    /// Legacy Chat Completions API (deprecated by OpenAI).
    ChatCompletions,
}

impl OpenAI {
    /// Create a new client using the provided API key and default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).build()
    }

    /// Create a client configured for [`Deepseek`](https://api-docs.deepseek.com)'s OpenAI-compatible endpoint.
    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).base_url(DEEPSEEK_BASE_URL).build()
    }

    /// Create a client configured for [`OpenRouter`](https://openrouter.ai)'s OpenAI-compatible endpoint.
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).base_url(OPENROUTER_BASE_URL).build()
    }

    /// Start building an [`OpenAI`] client with custom configuration.
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> Builder {
        Builder::new(api_key)
    }

    /// Override the default chat model in-place.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).chat_model = sanitize_model(model);
        self
    }

    /// Override the REST base URL (useful for OpenAI-compatible endpoints).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).base_url = base_url.into();
        self
    }

    /// Select which OpenAI API to call.
    #[must_use]
    pub fn with_api(mut self, api: ApiKind) -> Self {
        Arc::make_mut(&mut self.inner).api_kind = api;
        self
    }

    /// Use the recommended Responses API.
    #[must_use]
    pub fn with_responses_api(self) -> Self {
        self.with_api(ApiKind::Responses)
    }

    /// Use the legacy Chat Completions API (deprecated by OpenAI).
    #[must_use]
    pub fn with_chat_completions_api(self) -> Self {
        self.with_api(ApiKind::ChatCompletions)
    }

    /// Send deprecated `max_tokens` alongside `max_completion_tokens` for compatibility.
    ///
    /// OpenAI deprecates `max_tokens` and it is incompatible with reasoning models.
    #[must_use]
    pub fn with_legacy_max_tokens(mut self, enabled: bool) -> Self {
        Arc::make_mut(&mut self.inner).legacy_max_tokens = enabled;
        self
    }

    pub(crate) fn config(&self) -> Arc<Config> {
        self.inner.clone()
    }
}

type BoxedEventStream = Pin<Box<dyn Stream<Item = Result<Event, OpenAIError>> + Send>>;

impl LanguageModel for OpenAI {
    type Error = OpenAIError;

    fn respond(&self, request: LLMRequest) -> impl Stream<Item = Result<Event, Self::Error>> + Send {
        let cfg = self.inner.clone();
        let (messages, parameters, tool_definitions) = request.into_parts();
        let mut snapshot = ParameterSnapshot::from(&parameters);
        snapshot.legacy_max_tokens = cfg.legacy_max_tokens;

        let stream: BoxedEventStream = match cfg.api_kind {
            ApiKind::ChatCompletions => {
                let payload_messages = to_chat_messages(&messages);
                if tool_definitions.is_empty() {
                    Box::pin(chat_completions_stream(cfg, payload_messages, snapshot))
                } else {
                    Box::pin(chat_completions_oneshot(
                        cfg,
                        payload_messages,
                        snapshot,
                        tool_definitions,
                    ))
                }
            }
            ApiKind::Responses => {
                let input = to_responses_input(&messages);
                Box::pin(responses_oneshot(cfg, input, snapshot, tool_definitions))
            }
        };

        stream
    }

    fn profile(&self) -> impl Future<Output = ModelProfile> + Send {
        let cfg = self.inner.clone();
        async move {
            let mut profile = ModelProfile::new(
                cfg.chat_model.clone(),
                "OpenAI",
                cfg.chat_model.clone(),
                "OpenAI GPT family model",
                128_000,
            )
            .with_ability(Ability::ToolUse);
            for ability in &cfg.native_abilities {
                if !profile.abilities.contains(ability) {
                    profile.abilities.push(*ability);
                }
            }
            profile
        }
    }
}

fn chat_completions_stream(
    cfg: Arc<Config>,
    payload_messages: Vec<ChatMessagePayload>,
    snapshot: ParameterSnapshot,
) -> impl Stream<Item = Result<Event, OpenAIError>> + Send {
    let include_reasoning = snapshot.include_reasoning;
    let init_future = async move {
        let endpoint = cfg.request_url("/chat/completions");
        let mut backend = client();
        let mut builder = backend.post(endpoint);
        builder = builder.header(header::AUTHORIZATION.as_str(), cfg.request_auth());
        builder = builder.header(header::USER_AGENT.as_str(), "aither-openai/0.1");
        if let Some(org) = &cfg.organization {
            builder = builder.header("OpenAI-Organization", org.clone());
        }
        builder = builder.header(header::ACCEPT.as_str(), "text/event-stream");

        let request = ChatCompletionRequest::new(
            cfg.chat_model.clone(),
            payload_messages,
            &snapshot,
            None,
            true,
        );

        builder.json_body(&request).sse().await
    };

    let events = futures_lite::stream::iter(vec![init_future])
        .then(|fut| fut)
        .filter_map(Result::ok)
        .flatten();

    events
        .filter_map(|event| match &event {
            Ok(e) if should_skip_event(e) => None,
            Ok(e) if e.text_data() == "[DONE]" => None,
            _ => Some(event),
        })
        .map(move |event| match event {
            Ok(e) => serde_json::from_str::<ChatCompletionChunk>(e.text_data())
                .map(|chunk| chunk.into_events(include_reasoning))
                .map_err(OpenAIError::from),
            Err(err) => Err(OpenAIError::from(err)),
        })
        .map(|result| {
            let events = match result {
                Ok(events) => events.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(err) => vec![Err(err)],
            };
            futures_lite::stream::iter(events)
        })
        .flatten()
}

fn chat_completions_oneshot(
    cfg: Arc<Config>,
    payload_messages: Vec<ChatMessagePayload>,
    snapshot: ParameterSnapshot,
    tool_defs: Vec<ToolDefinition>,
) -> impl Stream<Item = Result<Event, OpenAIError>> + Send {
    let openai_tools = convert_tools(tool_defs);
    futures_lite::stream::once(fetch_chat_completion_events(
        cfg,
        payload_messages,
        snapshot,
        openai_tools,
    ))
    .map(|result| {
        let events = match result {
            Ok(events) => events.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(err) => vec![Err(err)],
        };
        futures_lite::stream::iter(events)
    })
    .flatten()
}

async fn fetch_chat_completion_events(
    cfg: Arc<Config>,
    messages: Vec<ChatMessagePayload>,
    snapshot: ParameterSnapshot,
    tools: Vec<ToolPayload>,
) -> Result<Vec<Event>, OpenAIError> {
    let endpoint = cfg.request_url("/chat/completions");
    let mut backend = client();
    let mut builder = backend.post(endpoint);
    builder = builder.header(header::AUTHORIZATION.as_str(), cfg.request_auth());
    builder = builder.header(header::USER_AGENT.as_str(), "aither-openai/0.1");
    if let Some(org) = &cfg.organization {
        builder = builder.header("OpenAI-Organization", org.clone());
    }

    let tools = if tools.is_empty() { None } else { Some(tools) };
    let request = ChatCompletionRequest::new(cfg.chat_model.clone(), messages, &snapshot, tools, false);

    let response: ChatCompletionResponse = builder
        .json_body(&request)
        .json()
        .await
        .map_err(OpenAIError::Http)?;

    let message = response
        .into_primary()
        .ok_or_else(|| OpenAIError::Api("chat completion response missing message".into()))?;

    let (texts, reasoning, tool_calls) = message.into_parts();

    let mut events = Vec::with_capacity(texts.len() + reasoning.len() + tool_calls.len());
    for text in texts {
        events.push(Event::text(text));
    }
    if snapshot.include_reasoning {
        for step in reasoning {
            events.push(Event::reasoning(step));
        }
    }
    for call in tool_calls {
        let arguments =
            serde_json::from_str(&call.function.arguments).unwrap_or(serde_json::Value::Null);
        events.push(Event::ToolCall(ToolCall::new(
            call.id,
            call.function.name,
            arguments,
        )));
    }

    Ok(events)
}

fn responses_oneshot(
    cfg: Arc<Config>,
    input: Vec<ResponsesInputItem>,
    snapshot: ParameterSnapshot,
    tool_defs: Vec<ToolDefinition>,
) -> impl Stream<Item = Result<Event, OpenAIError>> + Send {
    let has_function_tools = !tool_defs.is_empty();
    let mut response_tools = convert_responses_tools(tool_defs);
    if snapshot.websearch {
        response_tools.push(ResponsesTool::WebSearch);
    }
    if snapshot.code_execution {
        response_tools.push(ResponsesTool::CodeInterpreter);
    }
    let response_tools = if response_tools.is_empty() {
        None
    } else {
        Some(response_tools)
    };
    let tool_choice = responses_tool_choice(&snapshot, has_function_tools);

    futures_lite::stream::once(fetch_responses_events(
        cfg,
        input,
        snapshot,
        response_tools,
        tool_choice,
    ))
    .map(|result| {
        let events = match result {
            Ok(events) => events.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(err) => vec![Err(err)],
        };
        futures_lite::stream::iter(events)
    })
    .flatten()
}

async fn fetch_responses_events(
    cfg: Arc<Config>,
    input: Vec<ResponsesInputItem>,
    snapshot: ParameterSnapshot,
    tools: Option<Vec<ResponsesTool>>,
    tool_choice: Option<ResponsesToolChoice>,
) -> Result<Vec<Event>, OpenAIError> {
    let endpoint = cfg.request_url("/responses");
    let mut backend = client();
    let mut builder = backend.post(endpoint);
    builder = builder.header(header::AUTHORIZATION.as_str(), cfg.request_auth());
    builder = builder.header(header::USER_AGENT.as_str(), "aither-openai/0.1");
    if let Some(org) = &cfg.organization {
        builder = builder.header("OpenAI-Organization", org.clone());
    }

    let request = ResponsesRequest::new(cfg.chat_model.clone(), input, &snapshot, tools, tool_choice);

    let response: ResponsesOutput = builder
        .json_body(&request)
        .json()
        .await
        .map_err(OpenAIError::Http)?;

    let (texts, reasoning, tool_calls, _id) = response.into_parts();

    let mut events = Vec::with_capacity(texts.len() + reasoning.len() + tool_calls.len());
    for text in texts {
        events.push(Event::text(text));
    }
    if snapshot.include_reasoning {
        for step in reasoning {
            events.push(Event::reasoning(step));
        }
    }
    for call in tool_calls {
        let arguments = serde_json::from_str(&call.arguments).unwrap_or(serde_json::Value::Null);
        events.push(Event::ToolCall(ToolCall::new(
            call.call_id,
            call.name,
            arguments,
        )));
    }

    Ok(events)
}

/// Builder for [`OpenAI`] clients.
#[derive(Debug)]
pub struct Builder {
    api_key: String,
    base_url: String,
    api_kind: ApiKind,
    chat_model: String,
    legacy_max_tokens: bool,
    organization: Option<String>,
    native_abilities: Vec<Ability>,
}

impl Builder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_kind: ApiKind::Responses,
            chat_model: DEFAULT_MODEL.to_string(),
            legacy_max_tokens: false,
            organization: None,
            native_abilities: Vec::new(),
        }
    }

    /// Set a custom API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Use the recommended Responses API.
    #[must_use]
    pub fn use_responses_api(mut self) -> Self {
        self.api_kind = ApiKind::Responses;
        self
    }

    /// Use the legacy Chat Completions API (deprecated by OpenAI).
    #[must_use]
    pub fn use_chat_completions_api(mut self) -> Self {
        self.api_kind = ApiKind::ChatCompletions;
        self
    }

    /// Send deprecated `max_tokens` alongside `max_completion_tokens` for compatibility.
    ///
    /// OpenAI deprecates `max_tokens` and it is incompatible with reasoning models.
    #[must_use]
    pub fn legacy_max_tokens(mut self, enabled: bool) -> Self {
        self.legacy_max_tokens = enabled;
        self
    }

    /// Select a model identifier (e.g., `gpt-4o-mini`, `o1-mini`).
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = sanitize_model(model);
        self
    }

    /// Attach an `OpenAI` organization header.
    #[must_use]
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Declare extra native capabilities (e.g., web search, PDF understanding) supported by the upstream model.
    #[must_use]
    pub fn native_capabilities(mut self, abilities: impl IntoIterator<Item = Ability>) -> Self {
        for ability in abilities {
            if !self.native_abilities.contains(&ability) {
                self.native_abilities.push(ability);
            }
        }
        self
    }

    /// Mark this model as having built-in web search support.
    #[must_use]
    pub fn enable_native_web_search(self) -> Self {
        self.native_capabilities([Ability::WebSearch])
    }

    /// Mark this model as having native PDF/document understanding.
    #[must_use]
    pub fn enable_native_pdf(self) -> Self {
        self.native_capabilities([Ability::Pdf])
    }

    /// Consume the builder and create an [`OpenAI`] client.
    #[must_use]
    pub fn build(self) -> OpenAI {
        OpenAI {
            inner: Arc::new(Config {
                api_key: self.api_key,
                base_url: self.base_url,
                api_kind: self.api_kind,
                chat_model: self.chat_model,
                legacy_max_tokens: self.legacy_max_tokens,
                organization: self.organization,
                native_abilities: self.native_abilities,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) api_kind: ApiKind,
    pub(crate) chat_model: String,
    pub(crate) legacy_max_tokens: bool,
    pub(crate) organization: Option<String>,
    pub(crate) native_abilities: Vec<Ability>,
}

impl Config {
    pub(crate) fn request_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn request_auth(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

fn sanitize_model(model: impl Into<String>) -> String {
    model.into().trim().to_string()
}
