//! Token cost accounting.
//!
//! Costs follow the chat-completion prompt framing of OpenAI-family models.
//! These constants are a pinned contract, not an estimate:
//!
//! | Item | Cost |
//! |------|------|
//! | message | 3 + content [+ name + 1] [+ call name + call arguments] |
//! | function declaration | name + description + compact JSON schema |
//! | reply priming | 3 |
//!
//! Message costs are memoized on the message itself, so a growing history is
//! only ever encoded once per message.

use chatwindow_core::{FunctionDeclaration, Message, TokenEncoder};

/// Framing overhead of every message (role and delimiters).
pub const MESSAGE_OVERHEAD: usize = 3;

/// Extra token charged when a message carries a name.
pub const NAME_OVERHEAD: usize = 1;

/// Tokens that prime the assistant's reply (`<|start|>assistant<|message|>`).
pub const REPLY_PRIMING: usize = 3;

/// Cost of a message, computed without touching the memo.
pub fn compute_message_tokens(encoder: &dyn TokenEncoder, message: &Message) -> usize {
    let mut tokens = MESSAGE_OVERHEAD + message.content().map_or(0, |c| encoder.encode(c));
    if let Some(name) = message.name() {
        tokens += encoder.encode(name) + NAME_OVERHEAD;
    }
    if let Some(call) = message.function_call() {
        tokens += encoder.encode(&call.name) + encoder.encode(&call.arguments);
    }
    tokens
}

/// Cost of a message. Returns the memoized value when present, otherwise
/// computes it and attaches it to the message.
pub fn message_tokens(encoder: &dyn TokenEncoder, message: &Message) -> usize {
    message.token_cost_or_init(|m| compute_message_tokens(encoder, m))
}

/// Cost of a message as sent: empty messages are filtered out, so they cost nothing.
pub fn sent_message_tokens(encoder: &dyn TokenEncoder, message: &Message) -> usize {
    if message.is_empty() {
        0
    } else {
        message_tokens(encoder, message)
    }
}

/// Sum of the sent cost of a slice of messages.
pub fn messages_tokens(encoder: &dyn TokenEncoder, messages: &[Message]) -> usize {
    messages
        .iter()
        .map(|m| sent_message_tokens(encoder, m))
        .sum()
}

/// Cost of a function declaration.
pub fn function_tokens(encoder: &dyn TokenEncoder, function: &FunctionDeclaration) -> usize {
    encoder.encode(&function.name)
        + encoder.encode(&function.description)
        + encoder.encode(&function.schema_text())
}

/// Sum of the cost of a slice of function declarations.
pub fn functions_tokens(encoder: &dyn TokenEncoder, functions: &[FunctionDeclaration]) -> usize {
    functions.iter().map(|f| function_tokens(encoder, f)).sum()
}

/// Function declaration costs remembered across refreshes.
///
/// Catalogs hand out fresh declarations on every read, so costs are matched
/// by value: a declaration that did not change is never re-encoded.
#[derive(Debug, Clone, Default)]
pub struct FunctionCostCache {
    entries: Vec<(FunctionDeclaration, usize)>,
}

impl FunctionCostCache {
    /// Total cost of `functions`, encoding only declarations not seen last time.
    pub fn tokens(
        &mut self,
        encoder: &dyn TokenEncoder,
        functions: &[FunctionDeclaration],
    ) -> usize {
        let entries: Vec<(FunctionDeclaration, usize)> = functions
            .iter()
            .map(|function| {
                let cost = self
                    .entries
                    .iter()
                    .find(|(cached, _)| cached == function)
                    .map_or_else(|| function_tokens(encoder, function), |(_, cost)| *cost);
                (function.clone(), cost)
            })
            .collect();
        let total = entries.iter().map(|(_, cost)| cost).sum();
        self.entries = entries;
        total
    }
}
