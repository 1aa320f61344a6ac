//! Observable loading/data/error state around a one-shot async producer.
//!
//! # Design
//! `ApiData` owns a producer closure and a dependency value. It runs the
//! producer on construction, again whenever `set_dependencies` receives a
//! different value, and on every `refetch`. Each run is a tokio task tagged
//! with a generation number; a finished run writes its result only if its
//! generation is still the newest, so a slow superseded request can never
//! overwrite a newer one. The task holds only a `Weak` to the shared state,
//! and dropping the `ApiData` also bumps the generation, so results arriving
//! after teardown are discarded.
//!
//! Errors are reduced to their display string. The container never retries.

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Shown when a producer fails without a usable message, or panics.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Snapshot of one container's state.
///
/// Reachable combinations:
/// - loading, no data, no error: first fetch or after a dependency change
/// - loading, previous data, no error: manual refetch from success
/// - not loading, data, no error: success
/// - not loading, no data, error: failure
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> FetchState<T> {
    pub fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        !self.loading && self.data.is_some()
    }

    pub fn is_failure(&self) -> bool {
        !self.loading && self.error.is_some()
    }

    /// The fetched data, or `fallback` once a fetch has failed. `None` while
    /// the first result is still pending.
    pub fn data_or_fallback<'a>(&'a self, fallback: &'a T) -> Option<&'a T> {
        match (&self.data, &self.error) {
            (Some(data), _) => Some(data),
            (None, Some(_)) => Some(fallback),
            (None, None) => None,
        }
    }

    fn begin(&mut self, keep_data: bool) {
        self.loading = true;
        self.error = None;
        if !keep_data {
            self.data = None;
        }
    }

    fn finish(&mut self, outcome: Result<T, String>) {
        self.loading = false;
        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(message) => {
                self.data = None;
                self.error = Some(message);
            }
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::loading()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Mount,
    Dependencies,
    Refetch,
}

type Producer<T, D> = Arc<dyn Fn(D) -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

struct Shared<T> {
    generation: AtomicU64,
    state: watch::Sender<FetchState<T>>,
}

impl<T> Shared<T> {
    /// Apply `outcome` if `generation` is still current. The check runs under
    /// the channel's write lock, so it cannot interleave with another settle.
    fn settle(&self, generation: u64, outcome: Result<T, String>) -> bool {
        self.state.send_if_modified(|state| {
            let current = self.generation.load(Ordering::SeqCst);
            if current != generation {
                debug!(generation, current, "discarding superseded fetch result");
                return false;
            }
            state.finish(outcome);
            true
        })
    }
}

/// A data-fetch state container for one consumer.
///
/// `D` is the dependency value handed to the producer; use `()` when the
/// fetch takes no input.
pub struct ApiData<T, D = ()> {
    shared: Arc<Shared<T>>,
    deps: D,
    producer: Producer<T, D>,
}

impl<T, D> ApiData<T, D>
where
    T: Send + Sync + 'static,
    D: Clone + PartialEq + Send + 'static,
{
    /// Create the container and start the first fetch.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn new<F, Fut, E>(deps: D, producer: F) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + 'static,
    {
        let producer: Producer<T, D> = Arc::new(move |deps: D| {
            let fut = producer(deps);
            async move { fut.await.map_err(|err| error_message(&err)) }.boxed()
        });
        let (state, _) = watch::channel(FetchState::loading());
        let this = Self {
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                state,
            }),
            deps,
            producer,
        };
        this.start(Trigger::Mount);
        this
    }

    /// Re-run the producer with the current dependencies. Data from a previous
    /// success stays visible until the new result arrives.
    pub fn refetch(&self) {
        self.start(Trigger::Refetch);
    }

    /// Replace the dependency value. A different value clears the data and
    /// starts a new fetch; an equal value changes nothing. Returns whether a
    /// fetch was started.
    pub fn set_dependencies(&mut self, deps: D) -> bool {
        if deps == self.deps {
            return false;
        }
        self.deps = deps;
        self.start(Trigger::Dependencies);
        true
    }

    fn start(&self, trigger: Trigger) {
        // Bump under the channel's write lock so a newer fetch can never settle
        // between this bump and `begin`.
        let mut generation = 0;
        self.shared.state.send_modify(|state| {
            generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.begin(trigger == Trigger::Refetch);
        });
        debug!(?trigger, generation, "starting fetch");

        let producer = Arc::clone(&self.producer);
        let deps = self.deps.clone();
        let shared: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            let run = async move { producer(deps).await };
            let outcome = match AssertUnwindSafe(run).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(generation, "fetch producer panicked");
                    Err(DEFAULT_ERROR_MESSAGE.to_string())
                }
            };
            if let Err(message) = &outcome {
                warn!(generation, error = %message, "fetch failed");
            }
            match shared.upgrade() {
                Some(shared) => {
                    shared.settle(generation, outcome);
                }
                None => debug!(generation, "owner dropped, discarding fetch result"),
            }
        });
    }
}

impl<T, D> ApiData<T, D> {
    pub fn dependencies(&self) -> &D {
        &self.deps
    }

    /// Generation of the most recently started fetch.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.shared.state.subscribe()
    }
}

impl<T: Clone, D> ApiData<T, D> {
    pub fn state(&self) -> FetchState<T> {
        self.shared.state.borrow().clone()
    }

    /// Wait until the current fetch has settled and return the state.
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.subscribe();
        if let Ok(state) = rx.wait_for(|state| !state.loading).await {
            return state.clone();
        }
        self.state()
    }
}

impl<T, D> Drop for ApiData<T, D> {
    fn drop(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
    }
}

fn error_message(err: &impl Display) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}
