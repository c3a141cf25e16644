//! `simplo chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use simplo_agent::{ChatSession, ExchangeOrchestrator, ExchangeSettings};
use simplo_config::AppConfig;
use simplo_core::message::{DataUri, Message};
use simplo_core::render::normalize;
use simplo_providers::OpenAiCompatProvider;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::attach::load_image;

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Help,
    AttachImage(&'a Path),
    ClearImage,
    Text(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "exit" | "quit" | "/exit" | "/quit" => Input::Exit,
        "/help" => Input::Help,
        "/clear-image" => Input::ClearImage,
        _ => match line.strip_prefix("/image") {
            Some(rest) if rest.starts_with(char::is_whitespace) => {
                Input::AttachImage(Path::new(rest.trim()))
            }
            _ => Input::Text(line),
        },
    }
}

fn display_text(text: &str, raw: bool) -> String {
    if raw {
        text.to_string()
    } else {
        normalize(text)
    }
}

fn build_message(text: &str, image: Option<DataUri>) -> Message {
    match image {
        Some(image) => Message::user_with_image(text, image),
        None => Message::user(text),
    }
}

pub async fn run(
    message: Option<String>,
    image: Option<PathBuf>,
    raw: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Missing key: print setup help before failing
    let provider = match OpenAiCompatProvider::from_config(&config) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    SIMPLO_API_KEY=sk-or-v1-...      (generic)");
            eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...  (OpenRouter)");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err(e.into());
        }
    };

    let orchestrator = Arc::new(ExchangeOrchestrator::new(
        Arc::new(provider),
        ExchangeSettings::from_config(&config),
    ));
    let mut session = ChatSession::new(orchestrator);
    info!(
        single_shot = message.is_some(),
        has_image = image.is_some(),
        "Chat session started"
    );

    let mut pending_image = match image {
        Some(path) => Some(load_image(&path).await?),
        None => None,
    };

    if let Some(text) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = session.send(build_message(&text, pending_image.take())).await;
        eprint!("\r              \r");

        return match result {
            Ok(reply) => {
                println!("{}", display_text(reply.text(), raw));
                Ok(())
            }
            Err(e) => {
                if let Some(notice) = session.notices().last() {
                    eprintln!("{notice}");
                }
                Err(e.into())
            }
        };
    }

    // Interactive mode
    println!();
    println!("  Simplo — Interactive Chat");
    println!();
    println!("  Upstream:  {}", config.api_url);
    println!("  Text:      {}", config.models.text);
    println!("  Vision:    {}", config.models.vision);
    println!();
    println!("  Type your message and press Enter. '/help' lists commands.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();
    if pending_image.is_some() {
        println!("  📎 Image attached to your next message.");
    }

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => break,
            Input::Help => {
                println!("  /image <path>   attach an image to the next message");
                println!("  /clear-image    drop the attached image");
                println!("  exit | quit     leave");
            }
            Input::AttachImage(path) => match load_image(path).await {
                Ok(uri) => {
                    pending_image = Some(uri);
                    println!("  📎 Attached {}", path.display());
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Image attach failed");
                    eprintln!("  [Error] {e}");
                }
            },
            Input::ClearImage => {
                if pending_image.take().is_some() {
                    println!("  Image removed.");
                }
            }
            Input::Text(text) => {
                let notices_before = session.notices().len();
                eprint!("  ...");
                let result = session.send(build_message(text, pending_image.take())).await;
                eprint!("\r     \r");

                match result {
                    Ok(reply) => {
                        println!();
                        for line in display_text(reply.text(), raw).lines() {
                            println!("  Assistant > {line}");
                        }
                        println!();
                    }
                    Err(e) => match session.notices().get(notices_before) {
                        Some(notice) => {
                            for line in notice.to_string().lines() {
                                eprintln!("  {line}");
                            }
                            println!();
                        }
                        _ => eprintln!("  [Error] {e}"),
                    },
                }
            }
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}
