use std::io::Write;

use color_eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use charla::chat::{run_turn, ConversationLog, TurnUpdate};
use charla::client::ChatClient;
use charla::config::Config;
use charla::models::ChatRequest;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let client = ChatClient::from_config(&config);
    let thread_id = Uuid::new_v4().to_string();
    let mut log = ConversationLog::new();

    tracing::debug!(base_url = %config.base_url, %thread_id, "starting session");

    match client.health_check().await {
        Ok(true) => {}
        Ok(false) => eprintln!("Warning: backend at {} reported unhealthy.", config.base_url),
        Err(_) => eprintln!("Warning: could not reach backend at {}.", config.base_url),
    }

    println!("Connected to {}. Type a message, or 'exit' to quit.", config.base_url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "exit" || message == "quit" {
            break;
        }

        log.push_user(message);
        let request = ChatRequest::new(message, thread_id.clone());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                match update {
                    TurnUpdate::Token { delta, .. } => {
                        print!("{}", delta);
                        let _ = std::io::stdout().flush();
                    }
                    TurnUpdate::Sources { sources } => {
                        println!();
                        println!("Sources:");
                        for source in sources {
                            match source.title {
                                Some(title) => println!("  - {} ({})", title, source.url),
                                None => println!("  - {}", source.url),
                            }
                        }
                    }
                    TurnUpdate::Failed { message } => {
                        eprintln!("{}", message);
                    }
                    TurnUpdate::Completed => {
                        println!();
                    }
                }
            }
        });

        run_turn(&client, &request, &mut log, &tx).await;
        drop(tx);
        let _ = printer.await;
    }

    if let Err(error) = client.goodbye(&thread_id).await {
        tracing::warn!(%error, "goodbye failed");
    }
    println!("Goodbye.");

    Ok(())
}
