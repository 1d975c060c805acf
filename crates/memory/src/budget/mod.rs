//! Priority-tiered prompt budgeting.
//!
//! Splits `max_tokens - minimum_reply_tokens` across three tiers, each tier
//! receiving what the tiers above it actually left over.
//!
//! # Tiers (in priority order)
//!
//! | Tier | Source | Trim Strategy |
//! |------|--------|---------------|
//! | 1. Mandatory | System prompt, context prompt, functions | Never trimmed |
//! | 2. History | Conversation turns | Oldest dropped first |
//! | 3. Retrieved | Background snippets | Later snippets dropped |

pub mod allocator;
pub mod history;
pub mod retrieved;
pub mod token;

pub use allocator::{
    AllocationInput, AssembledPrompt, AssemblyMetadata, BudgetAllocator, BudgetWarning, TierStats,
};
pub use history::{HistorySelection, HistorySelector};
pub use retrieved::{RetrievedContent, RetrievedContentAssembler};
