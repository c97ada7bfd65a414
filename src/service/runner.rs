//! Background runner hosting the transcribe relay

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::relay::{ShutdownSignal, TranscribeRelay};

/// Owns the relay's worker thread and its stop flag
pub struct RelayRunner {
    signal: ShutdownSignal,
    handle: JoinHandle<()>,
}

impl RelayRunner {
    /// Start the relay on a dedicated blocking worker
    pub fn spawn(relay: TranscribeRelay) -> Self {
        let signal = ShutdownSignal::new();
        let loop_signal = signal.clone();
        let handle = tokio::task::spawn_blocking(move || relay.run(&loop_signal));
        Self { signal, handle }
    }

    /// Request a stop and wait until the relay has released its broker
    /// handles. The loop finishes its current job first.
    pub async fn shutdown(self) {
        info!("Stopping transcribe relay");
        self.signal.request();
        if let Err(e) = self.handle.await {
            error!("Relay worker did not shut down cleanly: {}", e);
        }
    }
}
