//! Connect to a reader and print tag observations
//!
//! Usage: READER_ADDR=192.168.0.30 cargo run --example read_tags

use llrp::{DEFAULT_PORT, Reader, ReaderEvent};

#[tokio::main]
async fn main() -> llrp::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::var("READER_ADDR").unwrap_or_else(|_| "192.168.0.30".to_string());

    println!("Connecting to reader at {addr}:{DEFAULT_PORT}");
    let mut reader = Reader::new(addr, DEFAULT_PORT);

    reader
        .start_session(|event| match event {
            ReaderEvent::Connected => println!("Connected, waiting for tags..."),
            ReaderEvent::TagRead(tag) => println!("  {tag}"),
            ReaderEvent::ProtocolError { kind, detail } => {
                eprintln!("Protocol error ({kind}): {detail}")
            }
            ReaderEvent::Disconnected => println!("Reader disconnected"),
        })
        .await
}
