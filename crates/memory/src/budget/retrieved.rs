//! Retrieved-content assembly — the background-snippet tier.
//!
//! Packs snippets into one synthetic user message:
//!
//! ```text
//! <header>
//! snippet 1
//! ================================
//! snippet 2
//! ```
//!
//! Units (framing, header, separator, snippet) are appended greedily. The
//! first unit that would overflow the ceiling ends assembly; everything
//! appended before it stays. Snippets are never cut in half.

use super::token::MESSAGE_OVERHEAD;
use chatwindow_core::{Message, TokenEncoder};

/// Line placed between two snippets.
pub const SEPARATOR: &str = "================================";

/// A run of 32 `=` is a single token in the BPE tables we target.
pub const SEPARATOR_TOKENS: usize = 1;

/// Introduction emitted once, before the first snippet.
pub const HEADER: &str = "Here is the information you know about the system and the project, \
separated by ================================\n\n";

/// Result of assembling retrieved content for one refresh.
#[derive(Debug, Clone)]
pub struct RetrievedContent {
    /// The composed user message. Empty when not even the header fit.
    pub message: Message,
    /// Ceiling minus consumed tokens.
    pub remaining: i64,
    /// Tokens consumed, message framing included.
    pub consumed: usize,
    /// Snippets actually included, in order.
    pub included: Vec<String>,
    /// Non-empty snippets offered.
    pub items_total: usize,
}

/// Packs retrieved snippets into a token ceiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievedContentAssembler;

impl RetrievedContentAssembler {
    pub fn assemble(
        &self,
        snippets: &[String],
        ceiling: i64,
        encoder: &dyn TokenEncoder,
    ) -> RetrievedContent {
        let snippets: Vec<&str> = snippets
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        let items_total = snippets.len();

        let empty = || RetrievedContent {
            message: Message::placeholder(),
            remaining: ceiling,
            consumed: 0,
            included: Vec::new(),
            items_total,
        };

        if snippets.is_empty() {
            return empty();
        }

        let mut used = (MESSAGE_OVERHEAD + encoder.encode(HEADER)) as i64;
        if used > ceiling {
            return empty();
        }

        let mut text = String::from(HEADER);
        let mut included = Vec::new();

        for snippet in snippets {
            if !included.is_empty() {
                if used + SEPARATOR_TOKENS as i64 > ceiling {
                    break;
                }
                used += SEPARATOR_TOKENS as i64;
                text.push('\n');
                text.push_str(SEPARATOR);
                text.push('\n');
            }
            let cost = encoder.encode(snippet) as i64;
            if used + cost > ceiling {
                break;
            }
            used += cost;
            text.push_str(snippet);
            included.push(snippet.to_string());
        }

        RetrievedContent {
            message: Message::user(text),
            remaining: ceiling - used,
            consumed: used as usize,
            included,
            items_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::test_support::WordEncoder;

    fn header_tokens() -> i64 {
        (MESSAGE_OVERHEAD + WordEncoder.encode(HEADER)) as i64
    }

    fn snippets(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_mentions_separator() {
        assert!(HEADER.contains(SEPARATOR));
        assert_eq!(SEPARATOR.len(), 32);
    }

    #[test]
    fn no_snippets_is_empty() {
        let out = RetrievedContentAssembler.assemble(&[], 100, &WordEncoder);
        assert!(out.message.is_empty());
        assert_eq!(out.remaining, 100);
        assert_eq!(out.consumed, 0);
    }

    #[test]
    fn header_once_and_separators_between() {
        let input = snippets(&["alpha beta", "", "gamma", "", "delta epsilon zeta"]);
        let out = RetrievedContentAssembler.assemble(&input, 1_000, &WordEncoder);
        let text = out.message.content().unwrap();

        assert_eq!(text.matches("Here is the information").count(), 1);
        // one in the header, two between three snippets
        assert_eq!(text.matches(SEPARATOR).count(), 3);
        assert_eq!(out.included, snippets(&["alpha beta", "gamma", "delta epsilon zeta"]));
        assert_eq!(out.items_total, 3);
        assert_eq!(out.consumed as i64, header_tokens() + 6 + 2);
        assert_eq!(out.remaining, 1_000 - out.consumed as i64);
    }

    #[test]
    fn consumed_matches_message_cost() {
        let input = snippets(&["one two", "three"]);
        let out = RetrievedContentAssembler.assemble(&input, 1_000, &WordEncoder);
        assert_eq!(
            crate::budget::token::message_tokens(&WordEncoder, &out.message),
            out.consumed
        );
    }

    #[test]
    fn stops_before_overflowing_snippet() {
        let input = snippets(&["a b", "c d e f g h", "i"]);
        // header + "a b" + separator, but not the 6-word snippet
        let ceiling = header_tokens() + 2 + 1 + 5;
        let out = RetrievedContentAssembler.assemble(&input, ceiling, &WordEncoder);
        assert_eq!(out.included, snippets(&["a b"]));
        // the separator fit on its own, so it stays
        let text = out.message.content().unwrap();
        assert!(text.trim_end().ends_with(SEPARATOR));
        assert_eq!(out.consumed as i64, header_tokens() + 2 + 1);
        assert_eq!(
            crate::budget::token::message_tokens(&WordEncoder, &out.message),
            out.consumed
        );
    }

    #[test]
    fn separator_that_does_not_fit_ends_assembly() {
        let input = snippets(&["a b", "c"]);
        let ceiling = header_tokens() + 2;
        let out = RetrievedContentAssembler.assemble(&input, ceiling, &WordEncoder);
        assert_eq!(out.included, snippets(&["a b"]));
        assert!(out.message.content().unwrap().ends_with("a b"));
        assert_eq!(out.remaining, 0);
    }

    #[test]
    fn nothing_when_header_does_not_fit() {
        let input = snippets(&["a"]);
        let out = RetrievedContentAssembler.assemble(&input, header_tokens() - 1, &WordEncoder);
        assert!(out.message.is_empty());
        assert!(out.included.is_empty());
    }

    #[test]
    fn header_that_fits_is_kept_without_snippets() {
        let input = snippets(&["too many words here"]);
        let ceiling = header_tokens() + 1;
        let out = RetrievedContentAssembler.assemble(&input, ceiling, &WordEncoder);
        assert_eq!(out.message, Message::user(HEADER));
        assert!(out.included.is_empty());
        assert_eq!(out.consumed as i64, header_tokens());
        assert_eq!(out.remaining, 1);
        assert_eq!(out.items_total, 1);
    }

    #[test]
    fn negative_ceiling_admits_nothing() {
        let out = RetrievedContentAssembler.assemble(&snippets(&["x"]), -5, &WordEncoder);
        assert!(out.message.is_empty());
        assert_eq!(out.remaining, -5);
    }
}
