//! `chatwindow count` — Token counting under the configured encoder.

use chatwindow_config::AppConfig;
use chatwindow_core::{Message, TokenEncoder};
use chatwindow_memory::budget::token;
use chatwindow_memory::build_encoder;

pub async fn run(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let encoder = build_encoder(config.memory.encoder);

    let raw = encoder.encode(text);
    let as_message = token::message_tokens(encoder.as_ref(), &Message::user(text));

    println!("Encoder:        {}", encoder.name());
    println!("Text tokens:    {raw}");
    println!("As a message:   {as_message}");
    Ok(())
}
