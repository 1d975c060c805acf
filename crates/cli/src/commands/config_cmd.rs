//! `chatwindow config` — Configuration management commands.

use chatwindow_config::AppConfig;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = config.memory.warnings();
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Max tokens:       {}", config.memory.max_tokens);
            println!("   Reply reserve:    {}", config.memory.minimum_reply_tokens);
            println!(
                "   History cap:      {}",
                match config.memory.max_history_messages {
                    0 => "unlimited".to_string(),
                    n => n.to_string(),
                }
            );
            println!("   Encoder:          {}", config.memory.encoder);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}
