//! Process signals that stop the gateway.
//!
//! Calls hold no state between requests, so stopping only means leaving the
//! transport loop; in-flight connections are dropped with the runtime.

use std::fmt;
use tracing::{error, info};

/// The signal that asked the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP, sent when the launching client goes away
    Hangup,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopSignal::Interrupt => "SIGINT",
            StopSignal::Terminate => "SIGTERM",
            StopSignal::Hangup => "SIGHUP",
        })
    }
}

/// Wait until the process is asked to stop.
///
/// A signal whose handler cannot be installed is logged and never fires.
pub async fn wait_for_stop() -> StopSignal {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let signal = tokio::select! {
        _ = interrupt => StopSignal::Interrupt,
        _ = unix_signal(UnixKind::Terminate) => StopSignal::Terminate,
        _ = unix_signal(UnixKind::Hangup) => StopSignal::Hangup,
    };

    info!("Received {}, stopping", signal);
    signal
}

#[derive(Clone, Copy)]
enum UnixKind {
    Terminate,
    Hangup,
}

#[cfg(unix)]
async fn unix_signal(kind: UnixKind) {
    use tokio::signal::unix::{signal, SignalKind};

    let (signal_kind, name) = match kind {
        UnixKind::Terminate => (SignalKind::terminate(), "SIGTERM"),
        UnixKind::Hangup => (SignalKind::hangup(), "SIGHUP"),
    };

    match signal(signal_kind) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to install {} handler: {}", name, e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn unix_signal(_kind: UnixKind) {
    std::future::pending::<()>().await;
}
