use std::time::Duration;

use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() -> Result<()> {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>()?;

    assert_eq!(doc.get("listen").and_then(|e| return e.as_str()), Some("127.0.0.1:3000"));
    assert_eq!(doc.get("completion-timeout").and_then(|e| return e.as_integer()), Some(25000));
    assert_eq!(doc.get("voice").and_then(|e| return e.as_bool()), Some(false));
    assert!(doc.get("config-file").is_none());

    return Ok(());
}

#[test]
fn it_never_writes_tokens_into_the_default_file() {
    let res = Config::serialize_default(cli::build());

    assert!(res.contains("# groq-token = \"\""));
    assert!(res.contains("# elevenlabs-token = \"\""));
    assert!(res.contains("# Groq API key."));
}

#[test]
fn it_provides_defaults() {
    insta::assert_snapshot!(Config::default(ConfigKey::Model), @"llama-3.3-70b-versatile");
    insta::assert_snapshot!(Config::default(ConfigKey::GroqURL), @"https://api.groq.com/openai");
    insta::assert_snapshot!(Config::default(ConfigKey::VoiceID), @"onwK4e9ZLuTAKqWW03F9");
    assert!(Config::default(ConfigKey::ConfigFile).ends_with("mq-assistant/config.toml"));
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec![
        "mq-assistant",
        "-c",
        "./test/config.example.toml",
    ])?;
    Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(Config::get(ConfigKey::Listen), "0.0.0.0:4000");
    assert_eq!(
        Config::get_duration(ConfigKey::CompletionTimeout)?,
        Duration::from_millis(20000)
    );
    assert!(Config::get_bool(ConfigKey::Voice));

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec![
        "mq-assistant",
        "-c",
        "./test/bad-config.toml",
    ])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
