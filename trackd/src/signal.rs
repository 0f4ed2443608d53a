use tokio::{
    select,
    signal::unix::{signal, SignalKind},
};

/// Resolves on the first SIGINT or SIGTERM. Never resolves if the handlers could not be
/// installed.
pub async fn signal_received() {
    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("Could not install signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    select! {
        _ = sigint.recv() => {
            log::debug!("Received sigint");
        },
        _ = sigterm.recv() => {
            log::debug!("Received sigterm");
        }
    }
}
