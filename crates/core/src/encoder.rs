//! TokenEncoder trait — the abstraction over model tokenizers.
//!
//! The memory store never looks inside a tokenizer. It only asks how many
//! tokens a piece of text costs, so any BPE table (or approximation) can be
//! swapped in.

/// Converts text into a token count.
///
/// Implementations must be deterministic and total: the same text always
/// yields the same count, and counting never fails. An encoder that cannot
/// tokenize some input must over-estimate rather than under-estimate, so
/// budget math stays on the safe side.
pub trait TokenEncoder: Send + Sync {
    /// Short identifier for logs (e.g. "cl100k_base").
    fn name(&self) -> &str;

    /// Number of tokens `text` costs.
    fn encode(&self, text: &str) -> usize;
}

impl<T: TokenEncoder + ?Sized> TokenEncoder for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn encode(&self, text: &str) -> usize {
        (**self).encode(text)
    }
}
