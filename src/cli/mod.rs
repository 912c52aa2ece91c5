//! Command-line interface parsing and handling.
//!
//! This module parses arguments and runs the one-shot `say` front end: one
//! message in, the streamed reply printed to stdout with tool notices
//! inline.

use std::error::Error;
use std::io::{self, Write};

use clap::{Parser, Subcommand};

use crate::core::config::Config;
use crate::core::retry::ChatClient;
use crate::core::tools::{IconCategory, ToolInvocation};
use crate::render::{banner_text, summary_caption, RenderSink};
use crate::utils::url::normalize_base_url;

#[derive(Parser)]
#[command(name = "studiochat")]
#[command(about = "Streaming chat client for the studio assistant backend")]
#[command(
    long_about = "Studiochat talks to the studio assistant backend and renders its \
streamed replies: narrative text interleaved with tool-activity notices, \
with leaked record payloads filtered out and failed requests retried with \
backoff.\n\n\
The backend base URL is read from the config file and can be overridden \
per invocation with --endpoint."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message and stream the reply to stdout
    Say {
        /// The message to send
        text: Vec<String>,
        /// Conversation thread to attach the message to
        #[arg(short, long, default_value = "default")]
        thread: String,
        /// Backend base URL, overriding the configured one
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// Persist the backend base URL in the config file
    Endpoint {
        /// Base URL, e.g. http://127.0.0.1:8000
        url: String,
    },
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        Commands::Say {
            text,
            thread,
            endpoint,
        } => say(text, thread, endpoint).await,
        Commands::Endpoint { url } => set_endpoint(url),
    }
}

async fn say(
    text: Vec<String>,
    thread: String,
    endpoint: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let text = text.join(" ");
    if text.is_empty() {
        eprintln!("Usage: studiochat say <message>");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let base_url = endpoint.unwrap_or_else(|| config.base_url().to_string());
    let client = ChatClient::new(&base_url).with_max_attempts(config.max_attempts());

    let mut sink = TerminalSink::default();
    match client.send_message(&thread, &text, &mut sink).await {
        Ok(_) => {
            println!();
            Ok(())
        }
        Err(failure) => {
            eprintln!();
            eprintln!("❌ {failure}");
            std::process::exit(1);
        }
    }
}

fn set_endpoint(url: String) -> Result<(), Box<dyn Error>> {
    let path = Config::config_path()?;
    let mut config = Config::load_from_path(&path)?;
    config.base_url = Some(normalize_base_url(&url));
    config.save_to_path(&path)?;
    println!("Backend endpoint set to: {}", config.base_url());
    Ok(())
}

/// Streams the filtered narrative to stdout as it grows, with tool notices
/// inline.
#[derive(Default)]
struct TerminalSink {
    rendered: String,
    banner: Option<String>,
}

impl RenderSink for TerminalSink {
    fn clear_placeholder(&mut self) {}

    fn replace_narrative(&mut self, text: &str) {
        // The filtered view usually grows in place; print only the
        // extension. When a render pass rewrote earlier text (a record was
        // filtered out after partially printing), reprint on a fresh line.
        if let Some(delta) = text.strip_prefix(self.rendered.as_str()) {
            print!("{delta}");
        } else {
            println!();
            print!("{text}");
        }
        let _ = io::stdout().flush();
        self.rendered = text.to_string();
    }

    fn show_tool_banner(&mut self, name: &str, icon: IconCategory) {
        let line = format!("⏳ {} [{}]", banner_text(name), icon.as_str());
        if self.banner.as_deref() == Some(line.as_str()) {
            return;
        }
        println!("\n{line}");
        self.banner = Some(line);
    }

    fn lock_tool_summary(&mut self, history: &[ToolInvocation]) {
        self.banner = None;
        println!("\n✅ {}", summary_caption(history.len()));
        for invocation in history {
            println!(
                "  {}. [{}] {}",
                invocation.ordinal,
                invocation.icon.as_str(),
                invocation.name
            );
        }
    }

    fn show_retry_status(&mut self, failed_attempts: u32, max_attempts: u32) {
        if failed_attempts == 1 {
            eprintln!("⚠️ 请求失败，正在重试… ({failed_attempts}/{max_attempts})");
        } else {
            eprintln!("⚠️ 仍然失败，继续重试… ({failed_attempts}/{max_attempts})");
        }
        // The next attempt restarts the stream from scratch.
        self.rendered.clear();
        self.banner = None;
    }

    fn show_terminal_error(&mut self, message: &str, original_text: &str) {
        eprintln!("⚠️ 技术问题，请稍后重试：{message}");
        eprintln!("原始消息已保留，可重新发送：{original_text}");
    }
}
