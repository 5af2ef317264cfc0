use std::time::Duration;

use tokio::task::JoinHandle;

/// Ping `url` every `interval` so free hosting tiers do not idle the process
pub fn spawn_keepalive_loop(url: String, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Failed to build keep-alive client: {}", e);
                return;
            }
        };

        let target = format!("{}/", url.trim_end_matches('/'));
        let mut ticker = tokio::time::interval(interval);
        // Skip the immediate tick; the server is not listening yet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match client.get(&target).send().await {
                Ok(resp) if resp.status().is_success() => tracing::debug!("Kept app alive with ping"),
                Ok(resp) => tracing::warn!("Keep-alive ping returned {}", resp.status()),
                Err(e) => tracing::warn!("Failed to ping {}: {}", target, e),
            }
        }
    })
}
