//! Budget allocation — turns store state into a bounded message list.
//!
//! # Algorithm
//!
//! 1. `available = max_tokens - minimum_reply_tokens`
//! 2. Mandatory tier: system prompt + context prompt + function declarations
//!    + reply priming. Always included. If it alone exceeds `available`, a
//!    warning is recorded and the lower tiers get a negative ceiling.
//! 3. History tier gets `available - mandatory`.
//! 4. Retrieved tier gets whatever history actually left unused.
//!
//! Output order: system prompt, older history, retrieved block, context
//! prompt, newest message. Empty entries are filtered out.
//!
//! # Determinism
//!
//! Identical inputs always produce identical outputs. No random or
//! time-dependent logic is used during allocation.

use super::history::HistorySelector;
use super::retrieved::RetrievedContentAssembler;
use super::token;
use chatwindow_config::MemoryConfig;
use chatwindow_core::{FunctionDeclaration, Message, TokenEncoder};
use serde::{Deserialize, Serialize};

// ── Types ─────────────────────────────────────────────────────────────────

/// All inputs required by the allocator for a single refresh.
#[derive(Debug, Clone, Copy)]
pub struct AllocationInput<'a> {
    /// System prompt message. Empty when there is no system prompt.
    pub system: &'a Message,
    /// Secondary prompt, pinned right before the newest message. May be empty.
    pub context: &'a Message,
    /// Retrieved snippets in priority order.
    pub retrieved: &'a [String],
    pub functions: &'a [FunctionDeclaration],
    /// Precomputed cost of `functions`. Computed on the spot when `None`.
    pub function_tokens: Option<usize>,
    /// Full conversation history, oldest first.
    pub history: &'a [Message],
}

/// The assembled prompt, ready for a completion client.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub messages: Vec<Message>,
    pub metadata: AssemblyMetadata,
}

/// Detailed metadata about one allocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// `max_tokens - minimum_reply_tokens`. Negative for ill-formed configurations.
    pub available: i64,
    pub mandatory_tokens: usize,
    pub history_tokens: usize,
    pub retrieved_tokens: usize,
    /// Tokens of the whole request: all tiers, functions and reply priming.
    pub total_tokens: usize,
    /// Per-tier statistics.
    pub tiers: Vec<TierStats>,
    /// Snippets that made it into the retrieved block.
    pub included_snippets: Vec<String>,
    pub warnings: Vec<BudgetWarning>,
}

/// Statistics for a single tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStats {
    /// Tier name.
    pub name: String,
    /// Tokens consumed by this tier.
    pub tokens: usize,
    /// Items included after budget trimming.
    pub items_included: usize,
    /// Items available before trimming.
    pub items_total: usize,
}

/// Non-fatal budget conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetWarning {
    /// The reply reservation leaves no room for the prompt.
    ReplyReservationTooLarge {
        max_tokens: usize,
        minimum_reply_tokens: usize,
    },
    /// Never-trimmed content alone exceeds the prompt budget; history and
    /// retrieved content are omitted entirely.
    MandatoryOverflow { mandatory_tokens: usize, available: i64 },
}

impl std::fmt::Display for BudgetWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReplyReservationTooLarge {
                max_tokens,
                minimum_reply_tokens,
            } => write!(
                f,
                "Reply reservation ({} tokens) leaves no prompt budget within max_tokens ({})",
                minimum_reply_tokens, max_tokens
            ),
            Self::MandatoryOverflow {
                mandatory_tokens,
                available,
            } => write!(
                f,
                "Mandatory content ({} tokens) exceeds the prompt budget ({} tokens)",
                mandatory_tokens, available
            ),
        }
    }
}

// ── Allocator ─────────────────────────────────────────────────────────────

/// The budget allocator. Stateless — create one and reuse it.
#[derive(Debug, Clone, Copy)]
pub struct BudgetAllocator {
    max_tokens: usize,
    minimum_reply_tokens: usize,
    max_history_messages: usize,
}

impl BudgetAllocator {
    /// Create an allocator with an unlimited history message count.
    pub fn new(max_tokens: usize, minimum_reply_tokens: usize) -> Self {
        Self {
            max_tokens,
            minimum_reply_tokens,
            max_history_messages: 0,
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(config.max_tokens, config.minimum_reply_tokens)
            .with_max_history_messages(config.max_history_messages)
    }

    /// Cap the number of history messages. `0` means unlimited.
    pub fn with_max_history_messages(mut self, max_history_messages: usize) -> Self {
        self.max_history_messages = max_history_messages;
        self
    }

    /// Tokens left for the prompt once the reply is reserved.
    ///
    /// Limits beyond `i64::MAX` saturate instead of wrapping.
    pub fn available(&self) -> i64 {
        saturating_i64(self.max_tokens) - saturating_i64(self.minimum_reply_tokens)
    }

    pub fn allocate(
        &self,
        input: &AllocationInput<'_>,
        encoder: &dyn TokenEncoder,
    ) -> AssembledPrompt {
        let available = self.available();
        let mut warnings = Vec::new();

        if self.minimum_reply_tokens >= self.max_tokens {
            warnings.push(BudgetWarning::ReplyReservationTooLarge {
                max_tokens: self.max_tokens,
                minimum_reply_tokens: self.minimum_reply_tokens,
            });
        }

        // ── Tier 1: mandatory (never trimmed) ──────────────────────────────
        // Costs are memoized on the caller's messages before they are cloned.
        let function_tokens = input
            .function_tokens
            .unwrap_or_else(|| token::functions_tokens(encoder, input.functions));
        let mandatory_tokens = token::sent_message_tokens(encoder, input.system)
            + token::sent_message_tokens(encoder, input.context)
            + function_tokens
            + token::REPLY_PRIMING;
        let system_message = input.system.clone();
        let context_message = input.context.clone();

        if saturating_i64(mandatory_tokens) > available {
            warnings.push(BudgetWarning::MandatoryOverflow {
                mandatory_tokens,
                available,
            });
        }

        // ── Tier 2: history ────────────────────────────────────────────────
        let history_ceiling = available.saturating_sub(saturating_i64(mandatory_tokens));
        let selection = HistorySelector::new(self.max_history_messages).select(
            input.history,
            history_ceiling,
            encoder,
        );

        // ── Tier 3: retrieved content (history leftovers) ──────────────────
        let retrieved =
            RetrievedContentAssembler.assemble(input.retrieved, selection.remaining, encoder);

        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        tracing::debug!(
            available,
            mandatory = mandatory_tokens,
            history = selection.consumed,
            retrieved = retrieved.consumed,
            "Prompt budget allocated"
        );

        let tiers = vec![
            TierStats {
                name: "mandatory".into(),
                tokens: mandatory_tokens,
                items_included: usize::from(!system_message.is_empty())
                    + usize::from(!context_message.is_empty())
                    + input.functions.len(),
                items_total: usize::from(!system_message.is_empty())
                    + usize::from(!context_message.is_empty())
                    + input.functions.len(),
            },
            TierStats {
                name: "history".into(),
                tokens: selection.consumed,
                items_included: selection.items_included(),
                items_total: selection.items_total,
            },
            TierStats {
                name: "retrieved".into(),
                tokens: retrieved.consumed,
                items_included: retrieved.included.len(),
                items_total: retrieved.items_total,
            },
        ];

        // ── Assemble in send order ─────────────────────────────────────────
        let messages: Vec<Message> = std::iter::once(system_message)
            .chain(selection.older)
            .chain([retrieved.message, context_message, selection.newest])
            .filter(|m| !m.is_empty())
            .collect();

        AssembledPrompt {
            messages,
            metadata: AssemblyMetadata {
                available,
                mandatory_tokens,
                history_tokens: selection.consumed,
                retrieved_tokens: retrieved.consumed,
                total_tokens: mandatory_tokens + selection.consumed + retrieved.consumed,
                tiers,
                included_snippets: retrieved.included,
                warnings,
            },
        }
    }
}

fn saturating_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────
