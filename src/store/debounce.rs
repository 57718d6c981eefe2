//! Trailing-edge debouncer with an explicit, cancellable timer.
//!
//! Each [`Debouncer::schedule`] replaces the pending value and restarts the
//! quiet window. The action only runs when the window elapses without another
//! schedule, or when the owner calls [`Debouncer::flush`]. Inside a tokio
//! runtime a timer task fires the action; hosts without a runtime poll
//! [`Debouncer::tick`] instead.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

type Action<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Pending<T> {
    value: T,
    deadline: Instant,
    generation: u64,
}

struct State<T> {
    pending: Option<Pending<T>>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Shared<T> {
    delay: Duration,
    action: Action<T>,
    state: Mutex<State<T>>,
    /// Held while the action runs and while a value is cancelled, so a
    /// cancel never returns with an older action still in flight. Reentrant
    /// because the action's own observers may flush or cancel.
    delivery: ReentrantMutex<()>,
}

impl<T: Send + 'static> Shared<T> {
    /// Timer callback: run the action only if no newer schedule superseded it.
    fn fire(&self, generation: u64) {
        let _delivery = self.delivery.lock();
        let value = {
            let mut state = self.state.lock();
            match state.pending.as_ref() {
                Some(pending) if pending.generation == generation => {
                    state.timer = None;
                    state.pending.take().map(|pending| pending.value)
                }
                _ => None,
            }
        };
        if let Some(value) = value {
            (self.action)(value);
        }
    }
}

/// Coalesces rapid values into one trailing call of `action`.
pub struct Debouncer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                delay,
                action: Arc::new(action),
                state: Mutex::new(State {
                    pending: None,
                    generation: 0,
                    timer: None,
                }),
                delivery: ReentrantMutex::new(()),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    /// Replace the pending value and restart the quiet window.
    pub fn schedule(&self, value: T) {
        let deadline = Instant::now() + self.shared.delay;
        let mut state = self.shared.state.lock();
        state.generation += 1;
        let generation = state.generation;
        state.pending = Some(Pending {
            value,
            deadline,
            generation,
        });
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        if let Ok(handle) = Handle::try_current() {
            let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
            state.timer = Some(handle.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                if let Some(shared) = weak.upgrade() {
                    shared.fire(generation);
                }
            }));
        }
    }

    /// Run the action now with the pending value, if any.
    pub fn flush(&self) -> bool {
        let _delivery = self.shared.delivery.lock();
        match self.take_pending() {
            Some(value) => {
                (self.shared.action)(value);
                true
            }
            None => false,
        }
    }

    /// Drop the pending value without running the action. Waits for an
    /// action already running on another thread to finish.
    pub fn cancel(&self) -> Option<T> {
        let _delivery = self.shared.delivery.lock();
        self.take_pending()
    }

    /// Run the action if the quiet window has elapsed.
    pub fn tick(&self) -> bool {
        let due = self
            .shared
            .state
            .lock()
            .pending
            .as_ref()
            .is_some_and(|pending| pending.deadline <= Instant::now());
        due && self.flush()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().pending.is_some()
    }

    fn take_pending(&self) -> Option<T> {
        let mut state = self.shared.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.pending.take().map(|pending| pending.value)
    }
}

impl<T: Clone + Send + 'static> Debouncer<T> {
    /// The value waiting for the quiet window to elapse.
    pub fn pending(&self) -> Option<T> {
        self.shared
            .state
            .lock()
            .pending
            .as_ref()
            .map(|pending| pending.value.clone())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.state.lock().timer.take() {
            timer.abort();
        }
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Debouncer")
            .field("delay", &self.shared.delay)
            .field("pending", &state.pending.is_some())
            .field("generation", &state.generation)
            .finish()
    }
}
