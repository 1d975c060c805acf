//! # chatwindow Core
//!
//! Domain types, traits, and error definitions for the chatwindow
//! conversation-memory manager. This crate holds no budget logic — it
//! defines the model that the memory store and its collaborators share.
//!
//! ## Design Philosophy
//!
//! Every external capability (tokenizer, function catalog) is a trait here.
//! Implementations live in their respective crates, so the store can be
//! tested with deterministic stand-ins.

pub mod encoder;
pub mod error;
pub mod function;
pub mod message;

// Re-export key types at crate root for ergonomics
pub use encoder::TokenEncoder;
pub use error::{EncoderError, Error, Result};
pub use function::{FunctionCatalog, FunctionDeclaration, StaticFunctionCatalog};
pub use message::{FunctionCall, Message, Role};
