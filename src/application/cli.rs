#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::application::repl::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// What `main` should run once the command line has been handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    Serve,
    Chat,
}

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = std::env::var("MQ_ASSISTANT_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir().unwrap_or_default().join("mq-assistant");
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for MQ Assistant")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when chatting with environment variable RUST_LOG=mq_assistant")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_serve() -> Command {
    return Command::new("serve")
        .about("Run the chat and text-to-speech gateway.");
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start an interactive chat against a running gateway.");
}

fn arg_global(key: ConfigKey, env: &'static str, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .global(true);
}

fn with_default(help: &str, key: ConfigKey) -> String {
    return format!("{help} [default: {}]", Config::default(key));
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("mq-assistant")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_serve())
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(
            arg_global(
                ConfigKey::ConfigFile,
                "MQ_ASSISTANT_CONFIG_FILE",
                format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)),
            )
            .short('c'),
        )
        .arg(
            arg_global(
                ConfigKey::Listen,
                "MQ_ASSISTANT_LISTEN",
                with_default("Address the gateway binds to when serving.", ConfigKey::Listen),
            )
            .short('l'),
        )
        .arg(
            arg_global(
                ConfigKey::GatewayURL,
                "MQ_ASSISTANT_GATEWAY_URL",
                with_default("Base URL of the gateway the chat client talks to.", ConfigKey::GatewayURL),
            )
            .short('g'),
        )
        .arg(arg_global(
            ConfigKey::GroqToken,
            "GROQ_API_KEY",
            "Groq API key. The gateway reports itself as not configured without one.".to_string(),
        ))
        .arg(arg_global(
            ConfigKey::GroqURL,
            "MQ_ASSISTANT_GROQ_URL",
            with_default("Groq API URL. Can be swapped to any OpenAI compatible proxy.", ConfigKey::GroqURL),
        ))
        .arg(
            arg_global(
                ConfigKey::Model,
                "MQ_ASSISTANT_MODEL",
                with_default("Completion model requested from Groq.", ConfigKey::Model),
            )
            .short('m'),
        )
        .arg(arg_global(
            ConfigKey::CompletionTimeout,
            "MQ_ASSISTANT_COMPLETION_TIMEOUT",
            with_default("Time to wait in milliseconds for a completion before the gateway answers with a timeout.", ConfigKey::CompletionTimeout),
        ))
        .arg(arg_global(
            ConfigKey::ClientTimeout,
            "MQ_ASSISTANT_CLIENT_TIMEOUT",
            with_default("Time to wait in milliseconds for the gateway before the chat client aborts a request.", ConfigKey::ClientTimeout),
        ))
        .arg(arg_global(
            ConfigKey::ElevenlabsToken,
            "ELEVENLABS_API_KEY",
            "ElevenLabs API key. Speech requests fall back to the local synthesizer without one.".to_string(),
        ))
        .arg(arg_global(
            ConfigKey::ElevenlabsURL,
            "MQ_ASSISTANT_ELEVENLABS_URL",
            with_default("ElevenLabs API URL.", ConfigKey::ElevenlabsURL),
        ))
        .arg(arg_global(
            ConfigKey::VoiceID,
            "MQ_ASSISTANT_VOICE_ID",
            with_default("ElevenLabs voice used for narration.", ConfigKey::VoiceID),
        ))
        .arg(
            arg_global(
                ConfigKey::Voice,
                "MQ_ASSISTANT_VOICE",
                with_default("Read assistant replies aloud in the chat client.", ConfigKey::Voice),
            )
            .num_args(0..=1)
            .default_missing_value("true")
            .value_parser(PossibleValuesParser::new(["true", "false"])),
        );
}

async fn load_config(matches: &ArgMatches, subcmd_matches: &ArgMatches) -> Result<()> {
    return Config::load(build(), vec![matches, subcmd_matches]).await;
}

pub async fn parse() -> Result<Option<RunMode>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = log_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("serve", subcmd_matches)) => {
            load_config(&matches, subcmd_matches).await?;
            return Ok(Some(RunMode::Serve));
        }
        Some(("chat", subcmd_matches)) => {
            load_config(&matches, subcmd_matches).await?;
            return Ok(Some(RunMode::Chat));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(None);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(Some(RunMode::Chat));
}
