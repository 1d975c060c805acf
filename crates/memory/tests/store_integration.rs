//! End-to-end tests for the memory store.
//!
//! These drive the public API only: mutate the store, refresh, and inspect
//! the assembled messages and metadata.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chatwindow_config::MemoryConfig;
use chatwindow_core::{FunctionDeclaration, Message, Role, TokenEncoder};
use chatwindow_memory::budget::retrieved::{HEADER, SEPARATOR};
use chatwindow_memory::budget::token;
use chatwindow_memory::{MemoryStore, SharedMemoryStore};

// ── Deterministic encoder ────────────────────────────────────────────────

/// One token per whitespace-separated word, counting every call.
#[derive(Default)]
struct WordEncoder {
    calls: AtomicUsize,
}

impl TokenEncoder for WordEncoder {
    fn name(&self) -> &str {
        "words"
    }

    fn encode(&self, text: &str) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        text.split_whitespace().count()
    }
}

fn words(tag: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{tag}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn store(max_tokens: usize, minimum_reply_tokens: usize) -> (MemoryStore, Arc<WordEncoder>) {
    let encoder = Arc::new(WordEncoder::default());
    let config = MemoryConfig {
        max_tokens,
        minimum_reply_tokens,
        ..MemoryConfig::default()
    };
    (MemoryStore::new(config, encoder.clone()), encoder)
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[test]
fn fifty_token_window_drops_oldest_turn() {
    let (mut store, _) = store(50, 0);
    // 2 words + 3 framing + 3 reply priming = 8 mandatory tokens.
    store.set_system_prompt("be concise");
    let history: Vec<Message> = (0..5)
        .map(|i| {
            let text = words(&format!("t{i}_"), 7); // 7 + 3 framing = 10 tokens
            if i % 2 == 0 {
                Message::user(text)
            } else {
                Message::assistant(text)
            }
        })
        .collect();
    let expected_tail = history[1..].to_vec();
    store.mutate_history(|h| h.extend(history));

    store.refresh();

    let messages = store.messages();
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[0], Message::system("be concise"));
    assert_eq!(messages[1..], expected_tail[..]);
    assert_eq!(store.last_metadata().mandatory_tokens, 8);
    assert_eq!(store.last_metadata().history_tokens, 40);
}

#[test]
fn empty_inputs_yield_only_the_system_prompt() {
    let (mut store, _) = store(100, 10);
    store.set_system_prompt("Hi");
    store.refresh();

    assert_eq!(store.messages().len(), 1);
    assert_eq!(store.messages()[0].role(), Role::System);
    assert_eq!(store.messages()[0].content(), Some("Hi"));
    assert_eq!(store.remaining_tokens(), None);
}

#[test]
fn everything_empty_is_still_valid() {
    let (mut store, _) = store(100, 10);
    store.refresh();
    assert!(store.messages().is_empty());
}

// ── Properties ───────────────────────────────────────────────────────────

#[test]
fn assembled_messages_never_exceed_the_budget() {
    let functions = vec![FunctionDeclaration::new(
        "grep",
        "search files for a pattern",
        serde_json::json!({"type": "object", "required": ["pattern"]}),
    )];

    for max_tokens in [30, 64, 128, 256, 1024] {
        for reply in [0, 16, 48] {
            let (mut store, encoder) = store(max_tokens, reply);
            store.set_system_prompt("You are a careful reviewer");
            store.set_context_prompt("Reviewing src/lib.rs");
            store.set_function_catalog(Arc::new(functions.clone()));
            store.set_retrieved_content(
                (0..6).map(|i| words(&format!("s{i}_"), 3 + i * 4)).collect(),
            );
            for i in 0..25 {
                store.append_message(Message::user(words(&format!("u{i}_"), 1 + (i * 11) % 17)));
            }

            store.refresh();

            let available = max_tokens as i64 - reply as i64;
            let meta = store.last_metadata();
            if meta.mandatory_tokens as i64 <= available {
                let sent = token::messages_tokens(encoder.as_ref(), store.messages());
                assert!(sent as i64 <= available, "{sent} > {available}");
                assert!(meta.warnings.is_empty() || reply >= max_tokens);
            } else {
                assert!(!meta.warnings.is_empty());
            }
        }
    }
}

#[test]
fn selected_history_is_a_contiguous_suffix() {
    let (mut store, _) = store(90, 0);
    let history: Vec<Message> = (0..20)
        .map(|i| Message::user(words(&format!("h{i}_"), 1 + (i * 5) % 9)))
        .collect();
    store.mutate_history(|h| h.extend(history.iter().cloned()));

    store.refresh();

    let sent = store.messages();
    assert!(!sent.is_empty());
    assert_eq!(sent[..], history[history.len() - sent.len()..]);
}

#[test]
fn refresh_twice_is_identical() {
    let (mut store, _) = store(120, 20);
    store.set_system_prompt("system");
    store.set_retrieved_content(vec!["alpha".into(), "beta gamma".into()]);
    for i in 0..8 {
        store.append_message(Message::assistant(words(&format!("a{i}_"), 6)));
    }

    store.refresh();
    let first = store.messages().to_vec();
    let first_meta = store.last_metadata().clone();
    store.refresh();

    assert_eq!(store.messages(), &first[..]);
    assert_eq!(store.last_metadata().total_tokens, first_meta.total_tokens);
}

#[test]
fn history_is_encoded_once() {
    let (mut store, encoder) = store(1_000, 0);
    for i in 0..10 {
        store.append_message(Message::user(words(&format!("m{i}_"), 3)));
    }

    store.refresh();
    let calls = encoder.calls.load(Ordering::SeqCst);
    store.refresh();
    store.refresh();

    assert_eq!(encoder.calls.load(Ordering::SeqCst), calls);
}

#[test]
fn retrieved_block_uses_header_once_and_separators_between() {
    let (mut store, _) = store(1_000, 0);
    store.set_retrieved_content(vec![
        "first snippet".into(),
        String::new(),
        "second snippet".into(),
        String::new(),
        "third".into(),
        "fourth one".into(),
    ]);
    store.append_message(Message::user("question"));
    store.refresh();

    let block = store
        .messages()
        .iter()
        .find(|m| m.content().is_some_and(|c| c.starts_with(HEADER)))
        .expect("retrieved block present");
    let body = &block.content().unwrap()[HEADER.len()..];

    assert_eq!(body.matches(SEPARATOR).count(), 3);
    assert_eq!(store.last_metadata().included_snippets.len(), 4);
    assert_eq!(store.last_metadata().tiers[2].items_total, 4);
}

// ── Concurrency ──────────────────────────────────────────────────────────

#[tokio::test]
async fn listener_sees_every_history_mutation() {
    let (store, _) = store(200, 0);
    let shared = SharedMemoryStore::new(store);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    shared
        .observe_history_change(move |event| {
            let _ = tx.send(event.history_len);
        })
        .await;

    shared.set_system_prompt("no notification for this").await;
    shared.append_message(Message::user("one")).await;
    shared.append_message(Message::assistant("two")).await;
    shared.mutate_history(|h| h.clear()).await;

    let mut seen = vec![
        rx.recv().await.unwrap(),
        rx.recv().await.unwrap(),
        rx.recv().await.unwrap(),
    ];
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2]);
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mutations_are_serialized() {
    let (store, _) = store(10_000, 0);
    let shared = SharedMemoryStore::new(store);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let handle = shared.clone();
        tasks.push(tokio::spawn(async move {
            handle.append_message(Message::user(format!("message {i}"))).await;
            handle.refresh().await
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(shared.history().await.len(), 16);
    let messages = shared.refresh().await;
    assert_eq!(messages.len(), 16);
}
