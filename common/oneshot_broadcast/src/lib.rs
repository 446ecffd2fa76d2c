//! Provides a single-sender, multiple receiver one-shot channel where any message sent will be
//! received by all receivers.
//!
//! This implementation may not be blazingly fast but it should be simple enough to be reliable.
//!
//! Receivers block the calling thread whilst waiting. They are intended for use from synchronous
//! code, such as a thread waiting on another thread to finish building a committee cache.
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    SenderDropped,
}

enum Future<T> {
    /// The future is ready and the item may be consumed.
    Ready(T),
    /// Future is not ready.
    NotReady,
    /// The sender has been dropped without sending a message.
    SenderDropped,
}

struct MutexCondvar<T> {
    mutex: Mutex<Future<T>>,
    condvar: Condvar,
}

/// The sending pair of the `oneshot` channel.
pub struct Sender<T>(Arc<MutexCondvar<T>>);

impl<T> Sender<T> {
    /// Send a message, consuming `self` and delivering the message to *all* receivers.
    pub fn send(self, item: T) {
        *self.0.mutex.lock() = Future::Ready(item);
        // `Drop` will notify the receivers.
    }
}

impl<T> Drop for Sender<T> {
    /// Flag the sender as dropped (unless it already sent) and notify all receivers.
    fn drop(&mut self) {
        let mut lock = self.0.mutex.lock();
        if matches!(*lock, Future::NotReady) {
            *lock = Future::SenderDropped;
        }
        drop(lock);
        self.0.condvar.notify_all();
    }
}

/// The receiving pair of the `oneshot` channel. Always receives the message sent by the `Sender`
/// (if any).
#[derive(Clone)]
pub struct Receiver<T: Clone>(Arc<MutexCondvar<T>>);

impl<T: Clone> Receiver<T> {
    /// Check to see if there is a message to be read *without* blocking/waiting.
    ///
    /// ## Note
    ///
    /// This method will harmlessly return `Ok(None)` if the sender was dropped *after* it sent a
    /// message.
    pub fn try_recv(&self) -> Result<Option<T>, Error> {
        match &*self.0.mutex.lock() {
            Future::Ready(item) => Ok(Some(item.clone())),
            Future::NotReady => Ok(None),
            Future::SenderDropped => Err(Error::SenderDropped),
        }
    }

    /// Check to see if there is a message to be read whilst blocking/waiting until a message is
    /// sent or the `Sender` is dropped.
    pub fn recv(self) -> Result<T, Error> {
        let mut lock = self.0.mutex.lock();
        loop {
            match &*lock {
                Future::Ready(item) => return Ok(item.clone()),
                Future::SenderDropped => return Err(Error::SenderDropped),
                Future::NotReady => self.0.condvar.wait(&mut lock),
            }
        }
    }
}

/// A single-sender, multiple-receiver broadcast channel.
///
/// The sender may send *only one* message. After the first message, all receivers will receive
/// that message.
pub fn oneshot<T: Clone>() -> (Sender<T>, Receiver<T>) {
    let inner = Arc::new(MutexCondvar {
        mutex: Mutex::new(Future::NotReady),
        condvar: Condvar::new(),
    });
    let receiver = Receiver(inner.clone());
    let sender = Sender(inner);
    (sender, receiver)
}
