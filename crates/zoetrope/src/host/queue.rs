use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};

use super::RepaintScheduler;

/// Creates a connected scheduler/receiver pair around a single-slot queue.
///
/// For hosts without a native "post to UI thread" primitive: the scheduler
/// end satisfies [`RepaintScheduler`] and can be handed to the bridge, the
/// receiver end is drained by the host's loop. Capacity is one intent; a
/// request arriving while one is pending is absorbed, so a burst of
/// notifications wakes the loop once. Sending never blocks.
pub fn repaint_queue() -> (QueuedScheduler, RepaintReceiver) {
    let (tx, rx) = bounded(1);
    (QueuedScheduler { tx }, RepaintReceiver { rx })
}

/// Sending half of [`repaint_queue`].
#[derive(Clone)]
pub struct QueuedScheduler {
    tx: Sender<()>,
}

impl RepaintScheduler for QueuedScheduler {
    fn request_repaint(&self) {
        match self.tx.try_send(()) {
            Ok(()) => {}
            // A repaint is already pending; this request is covered by it.
            Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                log::debug!("repaint queue receiver gone; dropping request");
            }
        }
    }
}

/// Receiving half of [`repaint_queue`], drained by the host loop.
pub struct RepaintReceiver {
    rx: Receiver<()>,
}

impl RepaintReceiver {
    /// Takes the pending repaint intent, if one is queued.
    pub fn try_take(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Waits up to `timeout` for a repaint intent.
    ///
    /// Returns false on timeout or when every scheduler handle is gone.
    pub fn take_timeout(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}
