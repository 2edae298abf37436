use std::error::Error;

use loghose_sdk::consumer::{Consumer, TransportConfig};
use loghose_sdk::recent::sort_recent;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let endpoint = std::env::var("TRAFFIC_CONTROLLER_URL")
        .unwrap_or_else(|_| "ws://localhost:8080".to_string());
    let app_guid = std::env::var("APP_GUID").unwrap_or_else(|_| "my-app-guid".to_string());
    let auth_token = std::env::var("AUTH_TOKEN").unwrap_or_default();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let consumer = Consumer::new(endpoint, TransportConfig::default());
        let messages = consumer.recent_logs(&app_guid, &auth_token).await?;

        for message in sort_recent(messages) {
            println!(
                "[{}] {}",
                message.timestamp.unwrap_or_default(),
                String::from_utf8_lossy(message.message()),
            );
        }

        Ok(())
    })
}
