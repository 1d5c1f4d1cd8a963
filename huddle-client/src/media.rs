use crate::config::MediaWait;
use tokio::sync::watch;
use tokio::time::{Instant, sleep};

/// Producer side of the "local media is available" flag.
pub struct MediaSignal {
    tx: watch::Sender<bool>,
}

impl MediaSignal {
    pub fn set_ready(&self, ready: bool) {
        self.tx.send_replace(ready);
    }
}

/// Consumer side, polled before an offer is created.
#[derive(Clone)]
pub struct MediaReadiness {
    rx: watch::Receiver<bool>,
}

pub fn media_readiness(initial: bool) -> (MediaSignal, MediaReadiness) {
    let (tx, rx) = watch::channel(initial);
    (MediaSignal { tx }, MediaReadiness { rx })
}

impl MediaReadiness {
    /// Readiness that never changes; used by receive-only participants.
    pub fn always_ready() -> Self {
        media_readiness(true).1
    }

    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Polls at `wait.poll_interval` until ready or `wait.timeout` elapses.
    pub async fn wait_until_ready(&self, wait: &MediaWait) -> bool {
        let deadline = Instant::now() + wait.timeout;
        loop {
            if self.is_ready() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(wait.poll_interval.min(deadline - now)).await;
        }
    }
}
