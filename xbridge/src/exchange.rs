//! Single-consumer blocking handoff between the event loop and a consumer thread.
//!
//! The event loop holds the [`ExchangeSender`] and pushes values without ever
//! blocking. The consumer holds the [`ExchangeReceiver`] and suspends in
//! [`ExchangeReceiver::wait`] until the next value or the terminal error shows up.
//!
//! ```text
//!  event loop thread                      consumer thread
//!  ─────────────────                      ───────────────
//!  send(handle) ──┐
//!  send(chunk)  ──┼──▶ [ FIFO queue ] ──▶ wait() -> handle, chunk, ...
//!  send_error(e) ─┘                       wait() -> Err(e)   (once)
//!                                         wait() -> Err(Disconnected)
//! ```

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{Error, Result};

/// Creates a connected sender/receiver pair.
pub fn channel<T>() -> (ExchangeSender<T>, ExchangeReceiver<T>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        ExchangeSender { tx },
        ExchangeReceiver {
            rx,
            exhausted: false,
        },
    )
}

/// Producer half. Lives on the event loop thread.
#[derive(Debug)]
pub struct ExchangeSender<T> {
    tx: Sender<Result<T>>,
}

impl<T> ExchangeSender<T> {
    /// Enqueues a value. Never blocks.
    pub fn send(&self, value: T) {
        if self.tx.send(Ok(value)).is_err() {
            log::trace!("Exchange receiver dropped, discarding value");
        }
    }

    /// Enqueues the terminal error. Consumes the sender, so nothing can follow it.
    pub fn send_error(self, error: Error) {
        if let Err(rejected) = self.tx.send(Err(error)) {
            if let Err(error) = rejected.into_inner() {
                log::trace!("Exchange receiver dropped, discarding terminal error: {}", error);
            }
        }
    }
}

/// Consumer half. Owned by exactly one bridge.
#[derive(Debug)]
pub struct ExchangeReceiver<T> {
    rx: Receiver<Result<T>>,
    exhausted: bool,
}

impl<T> ExchangeReceiver<T> {
    /// Blocks until the next item is available.
    ///
    /// Values come back in send order. The terminal error is returned exactly
    /// once; every call after it reports [`Error::Disconnected`].
    pub fn wait(&mut self) -> Result<T> {
        if self.exhausted {
            return Err(Error::Disconnected);
        }
        match self.rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => {
                self.exhausted = true;
                Err(error)
            }
            Err(_) => {
                self.exhausted = true;
                Err(Error::Disconnected)
            }
        }
    }

    /// Non-blocking variant of [`wait`](Self::wait). `None` means nothing is queued yet.
    pub fn try_wait(&mut self) -> Option<Result<T>> {
        if self.exhausted {
            return Some(Err(Error::Disconnected));
        }
        match self.rx.try_recv() {
            Ok(Ok(value)) => Some(Ok(value)),
            Ok(Err(error)) => {
                self.exhausted = true;
                Some(Err(error))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.exhausted = true;
                Some(Err(Error::Disconnected))
            }
        }
    }

    /// True once the terminal item has been observed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of items queued and not yet waited for.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_values_in_send_order() {
        let (tx, mut rx) = channel();
        tx.send(1);
        tx.send(2);
        tx.send(3);
        assert_eq!(rx.pending(), 3);
        assert_eq!(rx.wait().unwrap(), 1);
        assert_eq!(rx.wait().unwrap(), 2);
        assert_eq!(rx.wait().unwrap(), 3);
    }

    #[test]
    fn test_error_surfaces_once() {
        let (tx, mut rx) = channel::<u8>();
        tx.send(7);
        tx.send_error(Error::ConnectionLost(io::Error::other("boom")));

        assert_eq!(rx.wait().unwrap(), 7);
        assert_eq!(rx.wait().unwrap_err().kind(), ErrorKind::ConnectionLost);
        assert!(rx.is_exhausted());
        assert_eq!(rx.wait().unwrap_err().kind(), ErrorKind::Disconnected);
    }

    #[test]
    fn test_dropped_sender_disconnects() {
        let (tx, mut rx) = channel::<u8>();
        assert!(rx.try_wait().is_none());
        drop(tx);
        assert_eq!(rx.wait().unwrap_err().kind(), ErrorKind::Disconnected);
    }

    #[test]
    fn test_wait_blocks_until_send() {
        let (tx, mut rx) = channel();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.send("late");
            tx.send_error(Error::ConnectionDone);
        });

        assert_eq!(rx.wait().unwrap(), "late");
        assert!(rx.wait().unwrap_err().is_clean_close());
        producer.join().unwrap();
    }
}
