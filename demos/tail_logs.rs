use std::error::Error;

use loghose_sdk::consumer::{Consumer, TransportConfig};

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
        let mut consumer = Consumer::new(endpoint, TransportConfig::default());
        consumer.set_on_connect_callback(|| println!("connected"));

        let mut logs = consumer.tailing_logs(&app_guid, &auth_token).await?;
        while let Some(message) = logs.recv().await {
            println!("{}", String::from_utf8_lossy(message.message()));
        }

        Ok(())
    })
}
