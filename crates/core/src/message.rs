//! Message domain types.
//!
//! A [`Message`] is the atomic unit of a conversation: it is appended to the
//! history by callers, or synthesized by the memory store for the system
//! prompt, the context prompt and the retrieved-content block.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Result of a function the assistant asked to call
    Function,
}

/// A function invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to invoke
    pub name: String,

    /// Arguments as raw text (usually JSON)
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// A single message in a conversation.
///
/// The token cost is memoized on first use. Every setter drops the memo, so a
/// cached cost always belongs to the current `(role, content, name,
/// function_call)` tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,

    #[serde(skip)]
    token_cost: OnceLock<usize>,
}

impl Message {
    /// Create a message with the given role and text content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            function_call: None,
            token_cost: OnceLock::new(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a function result message, named after the function that produced it.
    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::Function, content).with_name(name)
    }

    /// Create an assistant message that only carries a function call.
    pub fn assistant_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
            token_cost: OnceLock::new(),
        }
    }

    /// An empty user message, used as a placeholder when no message qualifies.
    pub fn placeholder() -> Self {
        Self {
            role: Role::User,
            content: None,
            name: None,
            function_call: None,
            token_cost: OnceLock::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(Some(name.into()));
        self
    }

    pub fn with_function_call(mut self, call: FunctionCall) -> Self {
        self.set_function_call(Some(call));
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.function_call.as_ref()
    }

    pub fn set_content(&mut self, content: Option<String>) {
        self.content = content;
        self.token_cost = OnceLock::new();
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
        self.token_cost = OnceLock::new();
    }

    pub fn set_function_call(&mut self, call: Option<FunctionCall>) {
        self.function_call = call;
        self.token_cost = OnceLock::new();
    }

    /// A message is empty when it has no text, no name and no function call.
    /// Empty messages are never sent.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty)
            && self.name.is_none()
            && self.function_call.is_none()
    }

    /// The memoized token cost, if it has been computed.
    pub fn cached_token_cost(&self) -> Option<usize> {
        self.token_cost.get().copied()
    }

    /// Return the memoized cost, computing and attaching it on first use.
    pub fn token_cost_or_init(&self, compute: impl FnOnce(&Message) -> usize) -> usize {
        *self.token_cost.get_or_init(|| compute(self))
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
            && self.content == other.content
            && self.name == other.name
            && self.function_call == other.function_call
    }
}

impl Eq for Message {}
