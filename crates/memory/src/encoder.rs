//! Token encoder implementations.
//!
//! - [`TiktokenEncoder`]: exact BPE counts for OpenAI-family models.
//! - [`HeuristicEncoder`]: ~4 characters per token, rounded up.
//! - [`ByteCountEncoder`]: one token per UTF-8 byte, never under-counts.
//!
//! A BPE token always spans at least one byte, so the byte count is an upper
//! bound for any byte-level BPE. That makes it the degrade target when a
//! table cannot be loaded.

use chatwindow_config::EncoderKind;
use chatwindow_core::{EncoderError, TokenEncoder};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Exact token counts backed by a tiktoken BPE table.
pub struct TiktokenEncoder {
    encoding: &'static str,
    bpe: CoreBPE,
}

impl TiktokenEncoder {
    /// The `cl100k_base` encoding (GPT-3.5 / GPT-4).
    pub fn cl100k_base() -> Result<Self, EncoderError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| EncoderError::LoadFailed {
            encoding: "cl100k_base".into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            encoding: "cl100k_base",
            bpe,
        })
    }

    /// The `o200k_base` encoding (GPT-4o family).
    pub fn o200k_base() -> Result<Self, EncoderError> {
        let bpe = tiktoken_rs::o200k_base().map_err(|e| EncoderError::LoadFailed {
            encoding: "o200k_base".into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            encoding: "o200k_base",
            bpe,
        })
    }
}

impl TokenEncoder for TiktokenEncoder {
    fn name(&self) -> &str {
        self.encoding
    }

    fn encode(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Character-based approximation: 1 token ≈ 4 bytes, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEncoder;

impl TokenEncoder for HeuristicEncoder {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn encode(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }
}

/// One token per UTF-8 byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCountEncoder;

impl TokenEncoder for ByteCountEncoder {
    fn name(&self) -> &str {
        "bytes"
    }

    fn encode(&self, text: &str) -> usize {
        text.len()
    }
}

/// Build the encoder for `kind`, propagating table load failures.
pub fn try_build_encoder(kind: EncoderKind) -> Result<Arc<dyn TokenEncoder>, EncoderError> {
    let encoder: Arc<dyn TokenEncoder> = match kind {
        EncoderKind::Cl100kBase => Arc::new(TiktokenEncoder::cl100k_base()?),
        EncoderKind::O200kBase => Arc::new(TiktokenEncoder::o200k_base()?),
        EncoderKind::Heuristic => Arc::new(HeuristicEncoder),
        EncoderKind::Bytes => Arc::new(ByteCountEncoder),
    };
    Ok(encoder)
}

/// Build the encoder for `kind`. If its table cannot be loaded, fall back
/// to [`ByteCountEncoder`] so budgets are over-estimated, never exceeded.
pub fn build_encoder(kind: EncoderKind) -> Arc<dyn TokenEncoder> {
    match try_build_encoder(kind) {
        Ok(encoder) => encoder,
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to byte-count token estimates");
            Arc::new(ByteCountEncoder)
        }
    }
}
