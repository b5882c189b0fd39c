#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::collections::HashMap;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ClientTimeout,
    CompletionTimeout,
    ConfigFile,
    ElevenlabsToken,
    ElevenlabsURL,
    GatewayURL,
    GroqToken,
    GroqURL,
    Listen,
    Model,
    Voice,
    VoiceID,
}

fn parse_millis(key: ConfigKey, val: &str) -> Result<Duration> {
    match val.parse::<u64>() {
        Ok(millis) => return Ok(Duration::from_millis(millis)),
        Err(_) => bail!(format!("Config key '{key}' must be milliseconds, got '{val}'")),
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    /// Millisecond values such as the completion and client timeouts.
    pub fn get_duration(key: ConfigKey) -> Result<Duration> {
        return parse_millis(key, &Config::get(key));
    }

    pub fn get_bool(key: ConfigKey) -> bool {
        return Config::get(key) == "true";
    }

    pub fn default(key: ConfigKey) -> String {
        let config_path = dirs::config_dir()
            .unwrap_or_default()
            .join("mq-assistant/config.toml");

        let res = match key {
            ConfigKey::ClientTimeout => "30000",
            ConfigKey::CompletionTimeout => "25000",
            ConfigKey::ElevenlabsToken => "",
            ConfigKey::ElevenlabsURL => "https://api.elevenlabs.io",
            ConfigKey::GatewayURL => "http://127.0.0.1:3000",
            ConfigKey::GroqToken => "",
            ConfigKey::GroqURL => "https://api.groq.com/openai",
            ConfigKey::Listen => "127.0.0.1:3000",
            ConfigKey::Model => "llama-3.3-70b-versatile",
            ConfigKey::Voice => "false",
            ConfigKey::VoiceID => "onwK4e9ZLuTAKqWW03F9",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    fn is_secret(key: ConfigKey) -> bool {
        return key == ConfigKey::GroqToken || key == ConfigKey::ElevenlabsToken;
    }

    /// Resolves every key from defaults, then the TOML file, then CLI flags and
    /// environment. Nothing is stored unless the whole chain is valid.
    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        let mut values: HashMap<ConfigKey, String> = ConfigKey::iter()
            .map(|key| return (key, Config::default(key)))
            .collect();

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    if let Some(val_int) = val.as_integer() {
                        values.insert(key, val_int.to_string());
                    } else if let Some(val_bool) = val.as_bool() {
                        values.insert(key, val_bool.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        values.insert(key, val_str.to_string());
                    } else {
                        bail!(format!("config.toml has an unsupported value for key '{key}'"));
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    values.insert(key, val.to_string());
                }
            }
        }

        for key in [ConfigKey::ClientTimeout, ConfigKey::CompletionTimeout] {
            parse_millis(key, values.get(&key).map_or("", |val| return val.as_str()))?;
        }

        for (key, val) in values {
            Config::set(key, &val);
        }

        tracing::debug!(
            listen = Config::get(ConfigKey::Listen),
            gateway_url = Config::get(ConfigKey::GatewayURL),
            model = Config::get(ConfigKey::Model),
            groq_configured = !Config::get(ConfigKey::GroqToken).is_empty(),
            elevenlabs_configured = !Config::get(ConfigKey::ElevenlabsToken).is_empty(),
            voice = Config::get(ConfigKey::Voice),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() || Config::is_secret(key) {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() || val.parse::<bool>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
