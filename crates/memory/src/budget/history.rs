//! History selection — the recent-turns tier.
//!
//! Walks the history from newest to oldest and admits messages while they fit
//! the ceiling. The walk stops at the first message that would overflow, so
//! the admitted messages always form a contiguous suffix of the non-empty
//! history. The newest admitted message is kept apart: the allocator pins it
//! to the end of the prompt.

use super::token;
use chatwindow_core::{Message, TokenEncoder};

/// Result of selecting history for one refresh.
#[derive(Debug, Clone)]
pub struct HistorySelection {
    /// Admitted messages other than the newest, oldest → newest.
    pub older: Vec<Message>,
    /// The newest admitted message, or an empty placeholder.
    pub newest: Message,
    /// Ceiling minus consumed tokens. Negative when the ceiling was.
    pub remaining: i64,
    /// Tokens consumed by `older` and `newest`.
    pub consumed: usize,
    /// Non-empty messages in the full history.
    pub items_total: usize,
}

impl HistorySelection {
    /// Number of messages admitted, the newest included.
    pub fn items_included(&self) -> usize {
        self.older.len() + usize::from(!self.newest.is_empty())
    }
}

/// Selects the most recent messages that fit a token ceiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistorySelector {
    /// Maximum number of messages to admit. `0` means unlimited.
    max_messages: usize,
}

impl HistorySelector {
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }

    /// Select from `history` within `ceiling` tokens.
    ///
    /// Empty messages are skipped and do not count against the message cap.
    /// A ceiling of zero or less admits nothing.
    pub fn select(
        &self,
        history: &[Message],
        ceiling: i64,
        encoder: &dyn TokenEncoder,
    ) -> HistorySelection {
        let mut remaining = ceiling;
        let mut consumed = 0usize;
        let mut admitted = 0usize;
        let mut newest: Option<Message> = None;
        let mut older = Vec::new();

        for message in history.iter().rev() {
            if message.is_empty() {
                continue;
            }
            if self.max_messages > 0 && admitted >= self.max_messages {
                break;
            }
            let cost = token::message_tokens(encoder, message);
            if cost as i64 > remaining {
                break;
            }
            remaining -= cost as i64;
            consumed += cost;
            admitted += 1;
            match newest {
                None => newest = Some(message.clone()),
                Some(_) => older.push(message.clone()),
            }
        }

        // Restore chronological order.
        older.reverse();

        HistorySelection {
            older,
            newest: newest.unwrap_or_else(Message::placeholder),
            remaining,
            consumed,
            items_total: history.iter().filter(|m| !m.is_empty()).count(),
        }
    }
}
