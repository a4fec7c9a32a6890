//! Roster fan-out to live subscribers.

use std::sync::Arc;

use domain::models::Registration;
use futures::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Shared, immutable copy of the full registration list.
pub type Roster = Arc<Vec<Registration>>;

/// Publishes the latest roster to every subscriber.
///
/// Subscribers only ever see the most recent roster; intermediate versions
/// published while a subscriber was busy are skipped.
#[derive(Clone)]
pub struct RosterBroadcaster {
    tx: Arc<watch::Sender<Roster>>,
}

impl RosterBroadcaster {
    pub fn new(initial: Vec<Registration>) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the current roster and wakes subscribers.
    pub fn publish(&self, roster: Vec<Registration>) {
        self.tx.send_replace(Arc::new(roster));
    }

    pub fn subscribe(&self) -> RosterSubscription {
        RosterSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn current(&self) -> Roster {
        self.tx.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for RosterBroadcaster {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// A live listener over the whole registration collection.
pub struct RosterSubscription {
    rx: watch::Receiver<Roster>,
}

impl RosterSubscription {
    /// The roster as of the last delivered change.
    pub fn snapshot(&self) -> Roster {
        self.rx.borrow().clone()
    }

    /// Waits for the next change and returns the new roster.
    ///
    /// Returns `None` once the store has shut down.
    pub async fn changed(&mut self) -> Option<Roster> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Converts into a stream that yields the current roster first and then
    /// every subsequent change.
    pub fn into_stream(self) -> impl Stream<Item = Roster> + Send + Unpin {
        WatchStream::new(self.rx)
    }
}
