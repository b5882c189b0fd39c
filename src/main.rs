#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

use crate::application::cli;
use crate::application::cli::RunMode;
use crate::application::repl;
use crate::application::server;
use crate::application::server::AppState;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! MQ Assistant has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

/// The gateway logs to stdout. The chat client keeps the terminal clean and
/// only writes a JSON debug log when asked to through `RUST_LOG`.
fn init_tracing(mode: RunMode) -> Option<WorkerGuard> {
    if mode == RunMode::Serve {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| return EnvFilter::new("mq_assistant=info,tower_http=info"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    if !env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("mq_assistant")
    {
        return None;
    }

    let file_appender = tracing_appender::rolling::never(cli::log_dir(), "debug.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .init();

    return Some(guard);
}

async fn run(mode: RunMode) -> Result<()> {
    match mode {
        RunMode::Serve => {
            let state = AppState::from_config()?;
            return server::serve(state).await;
        }
        RunMode::Chat => {
            return repl::start().await;
        }
    }
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let mode = match cli::parse().await {
        Ok(Some(mode)) => mode,
        Ok(None) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    let guard = init_tracing(mode);
    let res = run(mode).await;
    drop(guard);

    if let Err(err) = res {
        handle_error(err);
    }

    process::exit(0);
}
