//! FOTIVA assistant chat REPL
//!
//! Interactive terminal chat against a running FOTIVA backend.
//!
//! # Usage
//!
//! ```bash
//! # Rule-based FAQ answers, no model key needed
//! assistant_cli --interpreter rules
//!
//! # Full generative pipeline (needs GEMINI_API_KEY)
//! FOTIVA_API_URL=http://localhost:8000/api assistant_cli
//! ```

use clap::Parser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use fotiva_assistant::interpreter::rules::RuleTable;
use fotiva_assistant::{
    build_interpreter, AssistantConfig, ConversationSession, HttpBackend, InterpreterKind,
};

#[derive(Parser)]
#[command(name = "assistant_cli")]
#[command(version = "0.1.0")]
#[command(about = "Chat with the FOTIVA assistant from the terminal")]
struct Cli {
    /// Interpreter strategy: rules or gemini (overrides FOTIVA_INTERPRETER)
    #[arg(long, short)]
    interpreter: Option<InterpreterKind>,

    /// Backend base URL (overrides FOTIVA_API_URL)
    #[arg(long)]
    api_url: Option<url::Url>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Applied before from_env so its generative-key check sees the
    // chosen strategy.
    if let Some(kind) = cli.interpreter {
        let name = match kind {
            InterpreterKind::RuleBased => "rules",
            InterpreterKind::Generative => "gemini",
        };
        std::env::set_var("FOTIVA_INTERPRETER", name);
    }

    let mut config = AssistantConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let interpreter = build_interpreter(&config)?;
    let backend = HttpBackend::new(&config)?;
    let mut session = ConversationSession::new(interpreter, Box::new(backend));

    let welcome = RuleTable::builtin().welcome_message;
    session.greet(welcome.clone());
    println!("{} {}", "assistente>".cyan().bold(), welcome);
    println!("{}", "(digite 'sair' para encerrar)".dimmed());

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline(&format!("{} ", "você>".green().bold())) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line.to_lowercase().as_str(), "sair" | "exit" | "quit") {
                    break;
                }
                editor.add_history_entry(line)?;
                if let Some(reply) = session.submit(line).await {
                    println!("{} {}", "assistente>".cyan().bold(), reply);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", "Até logo! 👋".dimmed());
    Ok(())
}
