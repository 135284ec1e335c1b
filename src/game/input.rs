//! Player intents
//!
//! Input and UI collaborators send `Intent`s from any thread through a
//! crossbeam channel; the simulation drains them at the start of each tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::util::vec2::Vec2;

/// Intents drained per tick before spilling to the heap
pub type IntentBatch = SmallVec<[Intent; 8]>;

/// A command for the player ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Thrust direction; zero stops thrusting
    Move(Vec2),
    /// Angular velocity in radians per second
    Turn(f32),
    Boost(bool),
    Shoot,
    /// Dock at the nearest friendly station in range
    Dock,
    Undock,
}

/// Bounded intent queue
pub struct IntentChannel {
    sender: Sender<Intent>,
    receiver: Receiver<Intent>,
    capacity: usize,
}

impl IntentChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Clonable handle for a collaborator thread
    pub fn sender(&self) -> IntentSender {
        IntentSender {
            sender: self.sender.clone(),
        }
    }

    /// Returns false if the queue is full
    #[inline]
    pub fn try_submit(&self, intent: Intent) -> bool {
        self.sender.try_send(intent).is_ok()
    }

    /// Everything queued since the last drain, in submission order
    pub fn drain(&self) -> IntentBatch {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for IntentChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

#[derive(Clone)]
pub struct IntentSender {
    sender: Sender<Intent>,
}

impl IntentSender {
    #[inline]
    pub fn try_send(&self, intent: Intent) -> Result<(), IntentError> {
        self.sender.try_send(intent).map_err(|e| match e {
            TrySendError::Full(_) => IntentError::Full,
            TrySendError::Disconnected(_) => IntentError::Disconnected,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    #[error("intent queue is full")]
    Full,
    #[error("simulation stopped")]
    Disconnected,
}
