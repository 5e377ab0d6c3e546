//! Latest-value mailbox
//!
//! Single-slot handoff between the receive thread (producer) and the host's
//! tick (consumer), one slot per [`Eye`]. A publish replaces whatever is still
//! unread in that slot; nothing is queued and the producer never waits.
//! Freshness wins over completeness for a live feed.
//!
//! All slots sit behind one mutex, held only for the swap itself.

use crate::core::types::Eye;
use parking_lot::Mutex;

struct Slots<T> {
    values: [Option<T>; Eye::COUNT],
    overwritten: u64,
}

/// Overwrite-on-write, take-on-read buffer keyed by eye
pub struct Mailbox<T> {
    inner: Mutex<Slots<T>>,
}

/// Mailbox carrying compressed frame payloads
pub type FrameSlots = Mailbox<Vec<u8>>;

impl<T> Mailbox<T> {
    /// Create a mailbox with every slot empty
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Slots {
                values: [None, None, None],
                overwritten: 0,
            }),
        }
    }

    /// Store `value` as the newest for `eye`.
    ///
    /// Returns `true` if an unread value was discarded.
    pub fn publish(&self, eye: Eye, value: T) -> bool {
        let mut slots = self.inner.lock();
        let dropped = slots.values[eye.index()].replace(value).is_some();
        if dropped {
            slots.overwritten += 1;
        }
        dropped
    }

    /// Take the pending value for `eye`, leaving the slot empty
    pub fn take(&self, eye: Eye) -> Option<T> {
        self.inner.lock().values[eye.index()].take()
    }

    /// Take every pending value in one lock, in [`Eye::ALL`] order
    pub fn take_all(&self) -> Vec<(Eye, T)> {
        let mut slots = self.inner.lock();
        Eye::ALL
            .into_iter()
            .filter_map(|eye| slots.values[eye.index()].take().map(|v| (eye, v)))
            .collect()
    }

    /// True if `eye` has an unread value
    pub fn is_pending(&self, eye: Eye) -> bool {
        self.inner.lock().values[eye.index()].is_some()
    }

    /// Count of values discarded by overwrite since creation
    pub fn overwritten(&self) -> u64 {
        self.inner.lock().overwritten
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
