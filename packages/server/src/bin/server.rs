//! Anonymous peer-matching and chat relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kokoro-server
//! cargo run --bin kokoro-server -- --host 0.0.0.0 --port 3000
//! ```

use clap::Parser;
use kokoro_server::ui::run_server;
use kokoro_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kokoro-server")]
#[command(about = "Anonymous peer-matching and chat relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run_server(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
