use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing_subscriber::EnvFilter;

use supportchat_application::{RejectReason, SendOutcome, WidgetController};
use supportchat_core::{ConfigUpdate, WidgetConfig};
use supportchat_interaction::ReqwestWebhookClient;

mod command;
mod helper;
mod render;

use command::ReplCommand;
use helper::ReplHelper;
use render::pickable_options;

const DEFAULT_LOG_FILTER: &str =
    "warn,supportchat_core=info,supportchat_interaction=info,supportchat_application=info";

#[derive(Parser)]
#[command(name = "supportchat")]
#[command(about = "Terminal front-end for the support chat widget", long_about = None)]
struct Cli {
    /// TOML configuration file (default: ~/.config/supportchat/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Webhook URL, overrides the configuration
    #[arg(long)]
    webhook_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Start with this session id instead of a generated one
    #[arg(long)]
    session_id: Option<String>,

    /// Do not open the widget (and send the greeting) on startup
    #[arg(long)]
    no_greeting: bool,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn describe_rejection(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::InFlight => "Still waiting for the previous reply.",
        RejectReason::Debounced => "Slow down a little, then try again.",
        RejectReason::EmptyInput => "Nothing to send.",
        RejectReason::Destroyed => "The chat has been closed.",
    }
}

/// Runs a send in the background so the prompt stays responsive.
fn spawn_send<F>(send: F)
where
    F: std::future::Future<Output = SendOutcome> + Send + 'static,
{
    tokio::spawn(async move {
        match send.await {
            SendOutcome::Rejected(reason) => {
                println!("{}", describe_rejection(reason).yellow());
            }
            SendOutcome::Failed(err) => {
                tracing::debug!(error = %err, "send failed");
            }
            SendOutcome::Delivered | SendOutcome::Abandoned => {}
        }
    });
}

fn print_help() {
    println!("{}", "Type a message and press enter to send it.".bright_black());
    println!("{}", "Type a number to pick one of the suggested options.".bright_black());
    println!(
        "{}",
        "Commands: /open, /close, /session, /help, /quit".bright_black()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // ===== Configuration =====
    let mut config = WidgetConfig::load(cli.config.as_deref())
        .context("Failed to load widget configuration")?;
    config.webhook.apply(ConfigUpdate {
        url: cli.webhook_url,
        timeout_ms: cli.timeout_ms,
    });
    tracing::info!(url = %config.webhook.url, "using webhook");

    let controller = WidgetController::new(config, Arc::new(ReqwestWebhookClient::new()));
    if let Some(session_id) = cli.session_id {
        controller.store().set_session_id(session_id);
    }

    let renderer = tokio::spawn(render::run_renderer(controller.clone()));

    // ===== REPL Setup =====
    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ReplHelper::new(controller.store().clone())));

    println!("{}", "=== Support Chat ===".bright_magenta().bold());
    print_help();
    println!();

    if !cli.no_greeting {
        controller.open();
    }

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let options = pickable_options(controller.store().last_message().as_ref());

                match ReplCommand::parse(&line, options.len()) {
                    ReplCommand::Empty => continue,
                    ReplCommand::Quit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    ReplCommand::Open => controller.open(),
                    ReplCommand::Close => controller.close(),
                    ReplCommand::Session => {
                        println!("{}", controller.store().session_id().bright_black());
                    }
                    ReplCommand::Help => print_help(),
                    ReplCommand::Unknown(command) => {
                        println!("{}", format!("Unknown command: {}", command).bright_black());
                    }
                    ReplCommand::Pick(n) => {
                        let _ = rl.add_history_entry(line.as_str());
                        let option = options[n - 1].clone();
                        let controller = controller.clone();
                        spawn_send(async move { controller.pick_option(&option).await });
                    }
                    ReplCommand::Text(text) => {
                        let _ = rl.add_history_entry(line.as_str());
                        let controller = controller.clone();
                        spawn_send(async move { controller.submit(&text).await });
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    // Stops timers, in-flight requests and the renderer
    controller.destroy();
    let _ = renderer.await;

    Ok(())
}
