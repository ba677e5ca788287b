//! One-shot readiness gate.
//!
//! [`ReadinessGate`] defers any number of callers until a single value becomes available, then
//! delivers that value to each of them exactly once, in the order they asked. Callers may either
//! register a callback with [`when_ready`](ReadinessGate::when_ready) or await
//! [`ready`](ReadinessGate::ready).

use std::{collections::VecDeque, time::Duration};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::errors::GateError;

type Callback<T> = Box<dyn FnOnce(&T) + Send + 'static>;

enum GateState<T> {
    Pending,
    /// `open` was called and queued callbacks are being delivered.
    Draining,
    Open(T),
}

struct GateInner<T> {
    state: GateState<T>,
    queue: VecDeque<Callback<T>>,
}

/// Broadcasts a value to every waiter once, after the first [`open`](ReadinessGate::open).
///
/// Callbacks registered while the gate is draining join the current drain, so none is lost and
/// FIFO order holds across the whole drain. The gate reports open only after the queue is empty.
pub struct ReadinessGate<T> {
    inner: Mutex<GateInner<T>>,
    signal: watch::Sender<Option<T>>,
}

impl<T: Clone + Send + Sync + 'static> ReadinessGate<T> {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(None);
        ReadinessGate {
            inner: Mutex::new(GateInner {
                state: GateState::Pending,
                queue: VecDeque::new(),
            }),
            signal,
        }
    }

    /// Run `callback` with the ready value.
    ///
    /// If the gate is already open the callback runs immediately on the calling thread.
    /// Otherwise it is queued and runs during [`open`](ReadinessGate::open).
    pub fn when_ready<F>(&self, callback: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if let GateState::Open(value) = &inner.state {
            let value = value.clone();
            drop(inner);
            callback(&value);
            return;
        }
        inner.queue.push_back(Box::new(callback));
    }

    /// Open the gate with `value` and drain queued callbacks in insertion order.
    ///
    /// Returns `false` if the gate was already opened; the value is then discarded. If a callback
    /// panics, the gate still opens and the callbacks queued behind it are discarded.
    pub fn open(&self, value: T) -> bool {
        {
            let mut inner = self.inner.lock();
            if !matches!(inner.state, GateState::Pending) {
                return false;
            }
            inner.state = GateState::Draining;
        }

        let drain = Drain {
            gate: self,
            value,
            finished: false,
        };
        drain.run();
        true
    }

    /// The ready value, if the gate is open.
    pub fn value(&self) -> Option<T> {
        match &self.inner.lock().state {
            GateState::Open(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.inner.lock().state, GateState::Open(_))
    }

    /// Number of callbacks still waiting.
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Wait until the gate opens.
    pub async fn ready(&self) -> Result<T, GateError> {
        let mut rx = self.signal.subscribe();
        let value = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| GateError::Closed)?;
        value.clone().ok_or(GateError::Closed)
    }

    /// Wait until the gate opens, giving up after `limit`.
    pub async fn ready_within(&self, limit: Duration) -> Result<T, GateError> {
        tokio::time::timeout(limit, self.ready())
            .await
            .map_err(|_| GateError::TimedOut)?
    }
}

/// An in-progress drain. Completes the transition to open on drop if a callback unwinds.
struct Drain<'g, T: Clone + Send + Sync + 'static> {
    gate: &'g ReadinessGate<T>,
    value: T,
    finished: bool,
}

impl<T: Clone + Send + Sync + 'static> Drain<'_, T> {
    fn run(mut self) {
        loop {
            let next = {
                let mut inner = self.gate.inner.lock();
                let next = inner.queue.pop_front();
                if next.is_none() {
                    inner.state = GateState::Open(self.value.clone());
                }
                next
            };

            match next {
                Some(callback) => callback(&self.value),
                None => break,
            }
        }

        self.finished = true;
        self.gate.signal.send_replace(Some(self.value.clone()));
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let discarded = {
            let mut inner = self.gate.inner.lock();
            inner.state = GateState::Open(self.value.clone());
            std::mem::take(&mut inner.queue)
        };
        #[cfg(feature = "tracing")]
        tracing::error!(
            "Readiness callback panicked; opening gate and discarding {} queued callbacks",
            discarded.len()
        );
        self.gate.signal.send_replace(Some(self.value.clone()));
        // Dropped after the lock is released.
        drop(discarded);
    }
}

impl<T: Clone + Send + Sync + 'static> Default for ReadinessGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ReadinessGate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        let state = match inner.state {
            GateState::Pending => "pending",
            GateState::Draining => "draining",
            GateState::Open(_) => "open",
        };
        f.debug_struct("ReadinessGate")
            .field("state", &state)
            .field("pending", &inner.queue.len())
            .finish()
    }
}
