//! Flow control between the event loop and the consumer thread.
//!
//! Inbound: [`FlowControl`] keeps a pause depth over the transport. The
//! transport is paused whenever the depth is positive, and a read resumes it
//! only for the span of one blocking wait through the [`Resumed`] guard.
//!
//! Outbound: [`WriteGate`] is the ready/blocked signal a writer waits on, and
//! [`GateProducer`] flips it from the transport's outbound-flow callbacks.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::transport::{PushProducer, Transport};

/// Pause-depth counter for a transport's inbound side.
#[derive(Debug, Default)]
pub struct FlowControl {
    depth: isize,
}

impl FlowControl {
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    pub fn depth(&self) -> isize {
        self.depth
    }

    pub fn is_paused(&self) -> bool {
        self.depth > 0
    }

    /// Puts a freshly acquired transport into the paused state.
    pub fn engage<T: Transport + ?Sized>(&mut self, transport: &T) {
        transport.pause_producing();
        self.depth = 1;
    }

    pub fn pause<T: Transport + ?Sized>(&mut self, transport: &T) {
        self.depth += 1;
        if self.depth == 1 {
            log::trace!("Pausing transport");
            transport.pause_producing();
        }
    }

    pub fn resume<T: Transport + ?Sized>(&mut self, transport: &T) {
        self.depth -= 1;
        if self.depth == 0 {
            log::trace!("Resuming transport");
            transport.resume_producing();
        }
    }

    /// Resumes now and pauses again when the guard drops, even on error paths.
    pub fn resumed<'a, T: Transport + ?Sized>(&'a mut self, transport: &'a T) -> Resumed<'a, T> {
        self.resume(transport);
        Resumed {
            flow: self,
            transport,
        }
    }
}

/// Scoped resume. Dropping it re-applies the pause.
pub struct Resumed<'a, T: Transport + ?Sized> {
    flow: &'a mut FlowControl,
    transport: &'a T,
}

impl<T: Transport + ?Sized> Drop for Resumed<'_, T> {
    fn drop(&mut self) {
        self.flow.pause(self.transport);
    }
}

/// Write synchronization token. Starts ready.
#[derive(Debug)]
pub struct WriteGate {
    ready: Mutex<bool>,
    cond: Condvar,
}

impl WriteGate {
    pub fn new() -> Self {
        Self {
            ready: Mutex::new(true),
            cond: Condvar::new(),
        }
    }

    pub fn set(&self) {
        let mut ready = self.ready.lock();
        *ready = true;
        self.cond.notify_all();
    }

    pub fn clear(&self) {
        *self.ready.lock() = false;
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.lock()
    }

    /// Blocks until the gate is ready. Returns immediately if it already is.
    pub fn wait(&self) {
        let mut ready = self.ready.lock();
        while !*ready {
            self.cond.wait(&mut ready);
        }
    }
}

impl Default for WriteGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbound-flow listener that drives a [`WriteGate`].
#[derive(Debug, Clone)]
pub struct GateProducer {
    gate: Arc<WriteGate>,
}

impl GateProducer {
    pub fn new(gate: Arc<WriteGate>) -> Self {
        Self { gate }
    }
}

impl PushProducer for GateProducer {
    fn pause_producing(&self) {
        self.gate.clear();
    }

    fn resume_producing(&self) {
        self.gate.set();
    }

    // A writer parked on a dead transport would never wake up otherwise.
    fn stop_producing(&self) {
        self.gate.set();
    }
}
