//! Client execution logic with reconnection support.

use std::time::Duration;

use super::error::ClientError;
use super::session::{ClientRuntime, SessionConfig, run_session};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the client with reconnection logic.
///
/// The runtime (peer links, roster, pending queue) survives reconnects; the
/// participant id stays the same, so the coordinator treats a quick
/// reconnect as the same participant and suppresses the join notification.
pub async fn run_client(
    config: SessionConfig,
    runtime: &mut ClientRuntime,
) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            config.url,
            config.participant_id,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_session(&config, runtime).await {
            Ok(_) => {
                tracing::info!("Client session ended normally");
                // If the session ended normally (user exit), don't reconnect
                break;
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    runtime.manager.shutdown();
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }

    Ok(())
}
