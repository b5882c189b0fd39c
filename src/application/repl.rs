#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Message;
use crate::domain::models::MessageStatus;
use crate::domain::models::MessageType;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::services::ChatController;
use crate::infrastructure::client::http_transport::HttpTransport;
use crate::infrastructure::client::narrator::HttpNarrator;

const LINE_WIDTH: usize = 80;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /retry (/r) - Resends the message behind the most recent failure.
- /voice (/v) [on|off] - Toggles reading assistant replies aloud.
- /quit /exit (/q) - Exit the chat.
- /help (/h) - Provides this help menu.
        "#;

    return text.trim().to_string();
}

/// Plain text lines for one transcript entry.
pub fn format_message(message: &Message, width: usize) -> Vec<String> {
    let mut label = message.role.label();
    if message.status == Some(MessageStatus::Failed) {
        label = format!("{label} (not delivered)");
    }

    let mut lines = vec![format!("{label}:")];
    for line in message.as_string_lines(width.saturating_sub(2)) {
        lines.push(format!("  {line}").trim_end().to_string());
    }

    if message.message_type() == MessageType::Error && message.retryable {
        lines.push("  Type /retry to try again.".to_string());
    }

    return lines;
}

pub struct Repl<W> {
    controller: ChatController,
    output: W,
    printed: HashSet<String>,
    color: bool,
}

impl<W: AsyncWrite + Unpin> Repl<W> {
    pub fn new(controller: ChatController, output: W, color: bool) -> Repl<W> {
        return Repl {
            controller,
            output,
            printed: HashSet::new(),
            color,
        };
    }

    fn paint(&self, message: &Message, line: String) -> String {
        if !self.color {
            return line;
        }

        let painted = match (message.message_type(), message.role) {
            (MessageType::Error, _) => Paint::red(line),
            (MessageType::Notice, _) => Paint::yellow(line),
            (MessageType::Normal, Role::User) => Paint::cyan(line),
            (MessageType::Normal, Role::Assistant) => Paint::green(line),
        };

        return painted.to_string();
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.output.write_all(format!("{line}\n").as_bytes()).await?;
        return Ok(());
    }

    /// Prints transcript entries that haven't been shown yet.
    async fn flush_transcript(&mut self) -> Result<()> {
        let messages = self.controller.transcript().messages();
        for message in messages {
            if self.printed.contains(&message.id) {
                continue;
            }

            let lines = format_message(&message, LINE_WIDTH)
                .into_iter()
                .map(|line| return self.paint(&message, line))
                .collect::<Vec<String>>();

            for line in lines {
                self.write_line(&line).await?;
            }
            self.write_line("").await?;
            self.printed.insert(message.id.to_string());
        }

        self.output.flush().await?;
        return Ok(());
    }

    async fn handle_command(&mut self, cmd: SlashCommand) -> Result<bool> {
        if cmd.is_quit() {
            return Ok(false);
        }

        if cmd.is_help() {
            self.write_line(&help_text()).await?;
            return Ok(true);
        }

        if cmd.is_voice() {
            let enabled = match cmd.args.first().map(|arg| return arg.as_str()) {
                Some("on") => true,
                Some("off") => false,
                _ => !self.controller.voice_enabled(),
            };
            self.controller.set_voice(enabled);
            let state = if enabled { "on" } else { "off" };
            self.write_line(&format!("Voice is {state}.")).await?;
            return Ok(true);
        }

        if cmd.is_retry() {
            match self.controller.last_retryable() {
                Some(failure) => {
                    self.controller.retry(&failure.id).await?;
                }
                None => {
                    self.write_line("Nothing to retry.").await?;
                }
            }
        }

        return Ok(true);
    }

    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        self.controller.open();
        self.flush_transcript().await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(cmd) = SlashCommand::parse(&line) {
                if !self.handle_command(cmd).await? {
                    break;
                }
            } else {
                let outcome = self.controller.submit(&line).await;
                tracing::debug!(outcome = ?outcome, "Turn finished");
            }

            self.flush_transcript().await?;
        }

        return Ok(());
    }
}

pub async fn start() -> Result<()> {
    let mut controller = ChatController::new(Arc::new(HttpTransport::default()))
        .with_client_timeout(Config::get_duration(ConfigKey::ClientTimeout)?)
        .with_narrator(Arc::new(HttpNarrator::default()));
    controller.set_voice(Config::get_bool(ConfigKey::Voice));

    println!(
        "{}",
        Paint::new(format!(
            "Connected to {}. Type /help for commands.",
            Config::get(ConfigKey::GatewayURL)
        ))
        .dimmed()
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut repl = Repl::new(controller, tokio::io::stdout(), true);
    repl.run(stdin).await?;

    return Ok(());
}
