use anyhow::{Context, Result};
use bankdesk_api::{CustomerBook, LookupServer};
use bankdesk_core::intent::BALANCE_ENQUIRY_AGENT;
use bankdesk_core::{AgentRegistry, AgentReply, BankingAssistant};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::BankdeskConfig;

#[derive(Parser)]
#[command(name = "bankdesk")]
#[command(version)]
#[command(about = "bankdesk — a banking enquiry assistant")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the full assistant (router + specialist agents)
    Chat,

    /// Send a single message, optionally straight to one agent
    Ask {
        /// Agent to address, e.g. BalanceEnquiryAgent; routes normally if omitted
        #[arg(short, long)]
        agent: Option<String>,

        /// The message to send
        message: String,
    },

    /// Run the mock banking lookup service
    Serve,

    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Some(Commands::Chat) => cmd_chat(&cli.config).await,
        Some(Commands::Ask { agent, message }) => {
            cmd_ask(&cli.config, agent.as_deref(), &message).await
        }
        Some(Commands::Serve) => cmd_serve(&cli.config).await,
        Some(Commands::Init) => cmd_init().await,
        Some(Commands::Config) => cmd_config(&cli.config).await,
        None => cmd_interactive(&cli.config).await,
    }
}

/// Build the assistant from config: lookup client, loan table, router, agents
fn build_assistant(cfg: &BankdeskConfig) -> Result<BankingAssistant> {
    let api = Arc::new(cfg.banking_api()?);
    let table = Arc::new(cfg.loan_table()?);
    let router = cfg.intent_router()?;
    let registry = AgentRegistry::banking(api, table);
    info!(
        "Assistant ready: {} agents, {} router, lookup service at {}",
        registry.count(),
        router.backend(),
        cfg.lookup.base_url
    );
    Ok(BankingAssistant::new(registry, router))
}

/// Print `label` and read one trimmed line; `None` on end of input
fn read_prompt(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> Result<Option<String>> {
    write!(output, "{}", label)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_line(label: &str) -> Result<Option<String>> {
    read_prompt(&mut io::stdin().lock(), &mut io::stdout(), label)
}

async fn cmd_interactive(config_path: &Option<PathBuf>) -> Result<()> {
    let choice = prompt_line("Run full assistant? (y/n): ")?.unwrap_or_default();
    if choice.eq_ignore_ascii_case("y") {
        println!("Multi-Agent Banking Assistant");
        return cmd_chat(config_path).await;
    }

    println!("Direct Agent Test Mode ({})", BALANCE_ENQUIRY_AGENT);
    let Some(message) = prompt_line("Enter test message: ")? else {
        return Ok(());
    };
    cmd_ask(config_path, Some(BALANCE_ENQUIRY_AGENT), &message).await
}

async fn cmd_chat(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = BankdeskConfig::load(config_path)?;
    let assistant = build_assistant(&cfg)?;
    let conversation = assistant.contexts().create().await;

    println!("Ask about an account balance, a loan balance or a loan status. Type 'exit' to quit.");
    chat_loop(
        &assistant,
        &conversation,
        &mut io::stdin().lock(),
        &mut io::stdout(),
        cfg.chat.max_rounds,
    )
    .await?;

    println!("Goodbye.");
    Ok(())
}

/// Run up to `max_rounds` dispatched turns. Blank lines are not turns.
async fn chat_loop(
    assistant: &BankingAssistant,
    conversation: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
    max_rounds: usize,
) -> Result<usize> {
    let mut rounds = 0;
    while rounds < max_rounds {
        let Some(text) = read_prompt(input, output, "You: ")? else {
            break;
        };
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        let outcome = assistant.handle_turn(conversation, &text).await;
        rounds += 1;
        match outcome.agent {
            Some(agent) => writeln!(output, "[{}] {}", agent, outcome.reply)?,
            None => writeln!(output, "{}", outcome.reply)?,
        }
    }
    Ok(rounds)
}

async fn cmd_ask(config_path: &Option<PathBuf>, agent: Option<&str>, message: &str) -> Result<()> {
    let cfg = BankdeskConfig::load(config_path)?;
    let assistant = build_assistant(&cfg)?;
    let conversation = assistant.contexts().create().await;

    match agent {
        Some(name) => match assistant.handle_direct(&conversation, name, message).await? {
            AgentReply::Handled(text) => println!("{}", text),
            AgentReply::Declined => println!("{} did not recognize that request.", name),
        },
        None => {
            let outcome = assistant.handle_turn(&conversation, message).await;
            println!("{}", outcome.reply);
        }
    }
    Ok(())
}

async fn cmd_serve(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = BankdeskConfig::load(config_path)?;
    let bind = cfg.bind_addr()?;
    let data_file = shellexpand(&cfg.server.data_file);
    let book = CustomerBook::load(&data_file)
        .with_context(|| format!("Failed to load customer data for {}", bind))?;
    if book.is_empty() {
        warn!("{} has no customers; every lookup will be not found", data_file.display());
    }

    LookupServer::new(bind, book)
        .run(async {
            let _ = signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down");
        })
        .await
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        info!("Created default config at {}", config_path.display());
    }

    println!("bankdesk initialized at {}", config_dir.display());
    println!(
        "Edit {} to point at your lookup service.",
        config_path.display()
    );
    Ok(())
}

async fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = BankdeskConfig::load(config_path)?;
    println!("{}", cfg.render()?);
    Ok(())
}

fn shellexpand(s: &str) -> PathBuf {
    match s.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(s),
        },
        None => PathBuf::from(s),
    }
}
