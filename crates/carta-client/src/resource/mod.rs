//! Fetch state for one remote record, keyed by an identity.
//!
//! A [`RemoteResource`] moves through `Idle → Loading → Ready | Failed`.
//! Changing the identity cancels the retry timer and the in-flight fetch and
//! starts over; every fetch attempt is tagged with a generation so a late
//! answer for an old identity (or an abandoned attempt) is dropped instead of
//! overwriting newer state. Dropping the handle tears the resource down.
//!
//! Observers read [`ResourceState`] snapshots through a `tokio::sync::watch`
//! channel.

mod machine;

use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{ClientError, FailureKind, FetchFailure};
use crate::retry::RetryScheduler;
use machine::{Effect, Event, Machine, Phase};

/// Who is responsible for retrying a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// The resource polls on its own retry timer while failed.
    SelfManaged,
    /// The caller decides when to call [`RemoteResource::refetch`].
    CallerDriven,
    /// One attempt per identity; only an identity change fetches again.
    SingleAttempt,
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceOptions {
    pub policy: RetryPolicy,
    pub retry_interval: Duration,
    /// Upper bound on a single attempt; expiry counts as a failure.
    pub fetch_timeout: Duration,
}

impl ResourceOptions {
    #[must_use]
    pub fn from_config(config: &carta_core::AppConfig, policy: RetryPolicy) -> Self {
        Self {
            policy,
            retry_interval: config.retry_interval(),
            fetch_timeout: config.request_timeout(),
        }
    }
}

/// Snapshot of a resource as seen by a page.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(FetchFailure),
}

impl<T> ResourceState<T> {
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            ResourceState::Ready(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            ResourceState::Ready(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, ResourceState::Loading)
    }

    /// Boolean error flag for pages that only show a "retrying" state.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, ResourceState::Failed(_))
    }

    #[must_use]
    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            ResourceState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// One remote read, performed for an identity.
pub trait Fetch<I, T>: Send + Sync + 'static {
    fn fetch(&self, identity: I) -> BoxFuture<'static, Result<T, ClientError>>;
}

impl<I, T, F, Fut> Fetch<I, T> for F
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
{
    fn fetch(&self, identity: I) -> BoxFuture<'static, Result<T, ClientError>> {
        Box::pin(self(identity))
    }
}

struct Inner<I, T> {
    machine: Machine<I>,
    data: Option<T>,
    failure: Option<FetchFailure>,
    in_flight: Option<JoinHandle<()>>,
    retry: RetryScheduler,
}

struct Shared<I, T> {
    name: &'static str,
    fetcher: Box<dyn Fetch<I, T>>,
    options: ResourceOptions,
    inner: Mutex<Inner<I, T>>,
    state_tx: watch::Sender<ResourceState<T>>,
}

/// Owning handle to a remote resource.
///
/// Not `Clone`: the handle is the resource's lifetime. Background tasks only
/// hold weak references, so dropping the handle stops the retry timer and
/// makes any in-flight result ignorable.
pub struct RemoteResource<I, T>
where
    I: Clone + PartialEq + Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    shared: Arc<Shared<I, T>>,
}

impl<I, T> RemoteResource<I, T>
where
    I: Clone + PartialEq + Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an idle resource. Nothing is fetched until an identity is set.
    pub fn new(name: &'static str, fetcher: impl Fetch<I, T>, options: ResourceOptions) -> Self {
        let (state_tx, _) = watch::channel(ResourceState::Idle);
        Self {
            shared: Arc::new(Shared {
                name,
                fetcher: Box::new(fetcher),
                options,
                inner: Mutex::new(Inner {
                    machine: Machine::new(options.policy),
                    data: None,
                    failure: None,
                    in_flight: None,
                    retry: RetryScheduler::new(),
                }),
                state_tx,
            }),
        }
    }

    /// Re-keys the resource. `None` parks it in `Idle` without a request;
    /// setting the current identity again does nothing.
    ///
    /// # Panics
    ///
    /// Panics if a fetch must be started outside a Tokio runtime.
    pub fn observe(&self, identity: Option<I>) {
        self.shared.apply(Event::IdentityChanged(identity), None);
    }

    /// Performs one fetch attempt for the current identity.
    ///
    /// No-op while a fetch is already loading or when there is no identity.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn refetch(&self) {
        self.shared.apply(Event::Refetch, None);
    }

    #[must_use]
    pub fn snapshot(&self) -> ResourceState<T> {
        self.shared.state_tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.shared.state_tx.subscribe()
    }

    #[must_use]
    pub fn identity(&self) -> Option<I> {
        self.shared.lock().machine.identity().cloned()
    }

    /// Number of live retry timers (0 or 1).
    #[must_use]
    pub fn live_timers(&self) -> usize {
        usize::from(self.shared.lock().retry.is_armed())
    }

    /// Waits until the resource is no longer loading and returns that state.
    pub async fn wait_settled(&self) -> ResourceState<T> {
        self.wait_for(|state| !state.is_loading()).await
    }

    /// Waits until `predicate` holds for the current state.
    pub async fn wait_for<P>(&self, mut predicate: P) -> ResourceState<T>
    where
        P: FnMut(&ResourceState<T>) -> bool,
    {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|state| predicate(state)).await.map(|s| s.clone());
        // The sender lives as long as `self`, so the channel cannot close here.
        settled.unwrap_or_else(|_| self.snapshot())
    }
}

impl<I, T> Drop for RemoteResource<I, T>
where
    I: Clone + PartialEq + Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.shared.apply(Event::TearDown, None);
    }
}

impl<I, T> Shared<I, T>
where
    I: Clone + PartialEq + Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, Inner<I, T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feeds `event` to the machine and performs the resulting effects while
    /// holding the state lock, so transitions and their effects never
    /// interleave.
    fn apply(self: &Arc<Self>, event: Event<I>, mut outcome: Option<Result<T, FetchFailure>>) {
        let mut inner = self.lock();
        let effects = inner.machine.transition(event);

        for effect in effects {
            match effect {
                Effect::CancelTimer => {
                    inner.retry.cancel();
                }
                Effect::CancelInFlight => {
                    if let Some(task) = inner.in_flight.take() {
                        task.abort();
                    }
                }
                Effect::ClearData => {
                    inner.data = None;
                    inner.failure = None;
                }
                Effect::StartFetch {
                    generation,
                    identity,
                } => {
                    tracing::debug!(
                        resource = self.name,
                        identity = ?identity,
                        generation,
                        "fetch started"
                    );
                    inner.in_flight = Some(self.spawn_fetch(generation, identity));
                }
                Effect::StoreData => {
                    if let Some(Ok(data)) = outcome.take() {
                        inner.data = Some(data);
                        inner.failure = None;
                    }
                }
                Effect::StoreFailure => {
                    if let Some(Err(failure)) = outcome.take() {
                        tracing::warn!(
                            resource = self.name,
                            identity = ?inner.machine.identity(),
                            kind = ?failure.kind,
                            detail = failure.message.as_deref().unwrap_or(""),
                            "fetch failed"
                        );
                        inner.data = None;
                        inner.failure = Some(failure);
                    }
                }
                Effect::ArmRetry => {
                    let weak = Arc::downgrade(self);
                    inner
                        .retry
                        .arm(self.options.retry_interval, move || retry_tick(&weak));
                }
                Effect::Publish => {
                    let state = match inner.machine.phase() {
                        Phase::Idle => ResourceState::Idle,
                        Phase::Loading => ResourceState::Loading,
                        Phase::Ready => inner
                            .data
                            .clone()
                            .map_or(ResourceState::Loading, ResourceState::Ready),
                        Phase::Failed => ResourceState::Failed(
                            inner.failure.clone().unwrap_or_else(|| FetchFailure {
                                kind: FailureKind::Network,
                                message: None,
                            }),
                        ),
                    };
                    self.state_tx.send_replace(state);
                }
                Effect::Discard { generation } => {
                    tracing::debug!(
                        resource = self.name,
                        generation,
                        current = inner.machine.generation(),
                        "stale fetch result discarded"
                    );
                }
            }
        }
    }

    fn spawn_fetch(self: &Arc<Self>, generation: u64, identity: I) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let request = self.fetcher.fetch(identity);
        let timeout = self.options.fetch_timeout;

        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, request).await {
                Ok(Ok(data)) => Ok(data),
                Ok(Err(err)) => Err(FetchFailure::from(&err)),
                Err(_) => Err(FetchFailure::timed_out(timeout)),
            };
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let event = if outcome.is_ok() {
                Event::Succeeded { generation }
            } else {
                Event::Failed { generation }
            };
            shared.apply(event, Some(outcome));
        })
    }

    fn phase(&self) -> Phase {
        self.lock().machine.phase()
    }
}

/// One firing of the retry timer. Returns whether the timer should keep
/// running.
fn retry_tick<I, T>(weak: &Weak<Shared<I, T>>) -> bool
where
    I: Clone + PartialEq + Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    let Some(shared) = weak.upgrade() else {
        return false;
    };
    match shared.phase() {
        Phase::Failed => {
            shared.apply(Event::Refetch, None);
            true
        }
        // A refetch from this timer is still running; its completion decides.
        Phase::Loading => true,
        Phase::Idle | Phase::Ready => false,
    }
}

#[cfg(test)]
#[path = "resource_test.rs"]
mod tests;
