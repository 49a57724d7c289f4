use tokio::sync::oneshot;

use crate::outcome::Outcome;

/// Create a connected single-assignment pair.
pub fn resolution() -> (Resolver, Resolution) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx: Some(tx) }, Resolution { rx })
}

/// Write side: accepts at most one outcome, later writes are dropped.
#[derive(Debug)]
pub struct Resolver {
    tx: Option<oneshot::Sender<Outcome>>,
}

impl Resolver {
    /// Store `outcome` if nothing was stored yet.
    ///
    /// Returns `true` if this call performed the resolution and the reader was still waiting.
    pub fn resolve(&mut self, outcome: Outcome) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }
}

/// Read side, awaited by the timeout controller.
#[derive(Debug)]
pub struct Resolution {
    rx: oneshot::Receiver<Outcome>,
}

impl Resolution {
    /// Wait for the outcome. `None` if the resolver was dropped without resolving.
    pub async fn wait(self) -> Option<Outcome> {
        self.rx.await.ok()
    }
}
