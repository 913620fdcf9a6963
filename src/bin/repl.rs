//! Minimal line-oriented chat REPL
//!
//! Drives the library end to end against a running backend. Configuration
//! comes from the environment:
//! - `EMBERCHAT_BASE_URL` (default `http://127.0.0.1:8000/api`)
//! - `EMBERCHAT_TIMEOUT_SECS` (default 120)

use emberchat::{ChatSession, GatewayConfig, HttpGateway};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emberchat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let base_url = std::env::var("EMBERCHAT_BASE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string());
    let timeout_secs: u64 = std::env::var("EMBERCHAT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(120);

    let config = GatewayConfig {
        base_url,
        request_timeout: Duration::from_secs(timeout_secs),
        stream_idle_timeout: Duration::from_secs(timeout_secs),
    };
    let backend = Arc::new(HttpGateway::new(config));
    let mut session = ChatSession::new(backend);

    if session.load_conversations().await.is_ok() {
        println!(
            "{} conversation(s) on the server.",
            session.state().conversations.len()
        );
    }
    println!("Type a message; /new starts a fresh conversation, /quit exits.");

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\n', '\r']);

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                session.start_new_conversation();
                println!("(new conversation)");
                continue;
            }
            _ => {}
        }

        match session.send(input).await {
            Ok(()) => {
                if let Some(reply) = session.state().messages.last() {
                    println!("{}", reply.content);
                }
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }

    Ok(())
}
