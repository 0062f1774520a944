//! Interactive driver for the scaffold agent.
//!
//! Usage:
//!   OPENAI_API_KEY=sk-... cargo run --example chat -- "Write a haiku about borrowing"
//!   OPENAI_API_KEY=sk-... GOOGLE_API_KEY=... GOOGLE_CSE_ID=... cargo run --example chat -- --model gpt-4 "Research tokio"
//!
//! Plain lines are sent as prompts. `!name arg1 | arg2` runs an action and
//! feeds its output back to the model. `?` lists the actions.
//! Ctrl-D or type "exit" / "quit" to leave.

use std::io::{self, BufRead, Write};

use clap::Parser;
use scaffold_agent::builtin::{standard_registry, GoogleSearch, PresentResult};
use scaffold_agent::{
    ActionError, Agent, AgentConfig, AgentError, AgentEvent, ContextManager, OpenAiProvider,
};

#[derive(Parser)]
#[command(name = "chat", about = "Drive a scaffold agent towards an objective")]
struct Cli {
    /// What the agent should accomplish
    objective: String,

    /// Model to use
    #[arg(long, default_value = "gpt-3.5-turbo")]
    model: String,

    /// Model whose token accounting bounds the history
    #[arg(long)]
    accounting_model: Option<String>,

    /// Token budget for the conversation history
    #[arg(long, default_value_t = 4097)]
    max_context_len: usize,

    /// Token budget for a single action's output
    #[arg(long, default_value_t = 2048)]
    max_token_length: usize,

    /// API base URL
    #[arg(long)]
    base_url: Option<String>,
}

fn require_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        eprintln!("error: {name} not set");
        std::process::exit(1);
    })
}

/// `name arg1 | arg2` -> ("name", ["arg1", "arg2"])
fn parse_action(line: &str) -> (String, Vec<String>) {
    let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
    let args = if rest.trim().is_empty() {
        Vec::new()
    } else {
        rest.split(" | ").map(|a| a.trim().to_string()).collect()
    };
    (name.to_string(), args)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut provider = OpenAiProvider::new(require_env("OPENAI_API_KEY"));
    if let Some(ref url) = cli.base_url {
        provider = provider.with_base_url(url);
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel::<AgentEvent>(64);
    let search = GoogleSearch::new(
        std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
        std::env::var("GOOGLE_CSE_ID").unwrap_or_default(),
    );
    let registry = standard_registry(search, PresentResult::channel(tx.clone()));

    let config = AgentConfig {
        model: cli.model.clone(),
        accounting_model: cli.accounting_model.clone(),
        max_context_len: cli.max_context_len,
        max_token_length: cli.max_token_length,
    };

    let mut agent = match Agent::from_config(provider, registry, &config) {
        Ok(agent) => agent.with_events(tx),
        Err(e) => {
            eprintln!("\x1b[1;31merror:\x1b[0m {e}");
            std::process::exit(1);
        }
    };

    // Print events as they arrive
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AgentEvent::RoleCreated { role, .. } => {
                    eprintln!("\x1b[35mrole>\x1b[0m {role}");
                }
                AgentEvent::Text { content } => {
                    eprint!("\x1b[1;32magent>\x1b[0m ");
                    println!("{content}");
                }
                AgentEvent::ActionCall { name, args } => {
                    eprintln!("\x1b[33m  [action: {name}]\x1b[0m {args:?}");
                }
                AgentEvent::ActionResult {
                    name,
                    output,
                    is_error,
                } => {
                    let tag = if is_error { "failed" } else { "result" };
                    let shown: String = output.chars().take(200).collect();
                    let ellipsis = if shown.len() < output.len() { "..." } else { "" };
                    eprintln!("\x1b[33m  [{tag}: {name}]\x1b[0m {shown}{ellipsis}");
                }
                AgentEvent::Presented { content } => {
                    println!("\x1b[1;34mresult>\x1b[0m {content}");
                }
            }
        }
    });

    eprintln!("scaffold-agent chat");
    eprintln!("model: {}", cli.model);
    eprintln!("objective: {}", cli.objective);
    eprintln!("---");

    if let Err(e) = agent.create(&cli.objective).await {
        eprintln!("\x1b[1;31merror:\x1b[0m {e}");
        std::process::exit(1);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        eprint!("\x1b[1;36myou>\x1b[0m ");
        io::stderr().flush().ok();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "exit" | "quit" | "/q") {
            break;
        }
        if trimmed == "?" {
            eprintln!("{}", agent.actions().registry().describe());
            continue;
        }

        let result = match trimmed.strip_prefix('!') {
            Some(action) => {
                let (name, args) = parse_action(action);
                agent.act(&name, &args).await
            }
            None => agent.prompt(trimmed).await,
        };

        match result {
            Ok(_) => {
                let ctx = agent.context();
                eprintln!(
                    "\x1b[2m  [{} messages / {} tokens in context]\x1b[0m",
                    ctx.len(),
                    ctx.token_count()
                );
            }
            Err(AgentError::Action(ActionError::OutputTooLarge { tokens, max })) => {
                eprintln!(
                    "\x1b[1;31moutput too large:\x1b[0m {tokens} tokens > {max}; narrow the request"
                );
            }
            Err(e) => eprintln!("\x1b[1;31merror:\x1b[0m {e}"),
        }
    }

    eprintln!("bye.");
}
