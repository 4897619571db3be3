mod cli;
mod repl;

use chat_client::{ChatSession, RelayClient, ResponseMode};
use cli::{CliError, CliOptions};
use shared::config::{ChatClientConfig, load_dotenv};
use tracing::info;

#[tokio::main]
async fn main() {
    let options = match CliOptions::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(CliError::HelpRequested) => {
            print_usage();
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(err) = load_dotenv() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "chat_client=warn".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match ChatClientConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let relay_url = options.relay_url.unwrap_or(config.relay_url);
    let mode = options
        .mode
        .unwrap_or(ResponseMode::from_stream_flag(config.stream));

    let transport = match RelayClient::new(relay_url, config.connect_timeout_ms) {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    info!(relay_url = %transport.relay_url(), mode = mode.as_str(), "chat client ready");

    if let Err(err) = repl::run(ChatSession::new(mode), &transport).await {
        eprintln!("terminal i/o failed: {err}");
        std::process::exit(1);
    }
}

fn print_usage() {
    eprintln!(
        "Usage: cargo run -p chat-client -- [--mode batch|stream] [--relay-url <url>]\n\
         \n\
         Options:\n\
         - --mode        batch waits for the whole reply; stream prints it as it arrives\n\
         \x20                (default from MATHERBOT_STREAM, true)\n\
         - --relay-url   relay chat endpoint (default from MATHERBOT_RELAY_URL)\n\
         - --help        Show this help text\n\
         \n\
         End a line with \\ to continue the message on the next line; /quit exits."
    );
}
