//! Conversation memory for chat completions.
//!
//! Holds an unbounded conversation history plus auxiliary context (system
//! prompt, context prompt, retrieved snippets, function declarations) and
//! assembles, on demand, a message list that fits the model's context window
//! with room left for the reply.
//!
//! - [`budget`]: token accounting and the tiered allocation pipeline
//! - [`encoder`]: tokenizer implementations
//! - [`store`]: the stateful [`MemoryStore`] and its [`SharedMemoryStore`] handle
//! - [`observer`]: history-change notifications

pub mod budget;
pub mod encoder;
pub mod observer;
pub mod store;

pub use budget::{
    AllocationInput, AssembledPrompt, AssemblyMetadata, BudgetAllocator, BudgetWarning,
    HistorySelection, HistorySelector, RetrievedContent, RetrievedContentAssembler, TierStats,
};
pub use encoder::{
    ByteCountEncoder, HeuristicEncoder, TiktokenEncoder, build_encoder, try_build_encoder,
};
pub use observer::{HistoryCallback, HistoryChanged, HistoryObserver};
pub use store::{MemoryStore, SharedMemoryStore};
