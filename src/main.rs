//! Runner for the CoAP pub/sub client
//!
//! Subscribes to every topic listed in the configuration, logs each
//! delivered value, and unsubscribes on Ctrl-C.

use coap_pubsub::config::{ClientConfig, load_config};
use coap_pubsub::{PubsubClient, utils};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            utils::logging::init("info");
            error!("Failed to load configuration: {}", e);
            return;
        }
    };
    utils::logging::init(&settings.logging.level);

    if settings.topics.is_empty() {
        warn!("No topics configured; set `topics` in config/default or COAP_PUBSUB_TOPICS");
    }

    let client = PubsubClient::new(ClientConfig::from(settings.client));

    for topic in &settings.topics {
        match client.add_sub(topic).await {
            Ok(subscription) => {
                tokio::spawn(async move {
                    while let Some(value) = subscription.recv().await {
                        info!("{} <- {}", subscription.topic(), value);
                    }
                });
            }
            Err(e) => error!("Subscribe to {} failed: {}", topic, e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received. Exiting gracefully.");

    for topic in client.topics() {
        if let Err(e) = client.remove_sub(&topic).await {
            warn!("Unsubscribe from {} failed: {}", topic, e);
        }
    }
    client.shutdown().await;
}
