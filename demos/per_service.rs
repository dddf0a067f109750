use std::fs::OpenOptions;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use journal_log_sink::init::{init_tracing_with_config, LayerConfig};
use journal_log_sink::sink::WriterSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("auth-service.journal")?;

    let config = LayerConfig {
        static_fields: vec![
            ("service".to_string(), "auth".to_string()),
            ("host".to_string(), "node-1".to_string()),
        ],
        enable_stdout: true,
        ..Default::default()
    };
    let _dispatcher = init_tracing_with_config(WriterSink::new(file), config)?;

    info!("starting service");

    warn!(attempts = 3u64, "slow login");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );

    // Let the flush timer write the batch.
    sleep(Duration::from_secs(1)).await;
    Ok(())
}
