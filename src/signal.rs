//! Latest-value signals and debouncing.
//!
//! A [`Signal`] holds at most one value, the latest. Subscribers first see
//! the current value (if any) and are then woken on every change.
//! Intermediate values may be skipped: a slow subscriber only ever observes
//! the newest value, never a queue of old ones.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// A typed source of snapshots with latest-value semantics.
#[derive(Debug)]
pub struct Signal<T> {
    tx: Arc<watch::Sender<Option<Arc<T>>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    /// Creates a signal that has no value yet.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Creates a signal holding `value`.
    pub fn with_value(value: T) -> Self {
        let (tx, _rx) = watch::channel(Some(Arc::new(value)));
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the current value and wakes subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(Some(Arc::new(value)));
    }

    /// Replaces the current value with one computed from it, atomically.
    ///
    /// When `f` returns `None` the value is kept and subscribers are not
    /// woken. Returns whatever `f` returned alongside the new value.
    pub fn update<R>(&self, f: impl FnOnce(Option<&T>) -> Option<(T, R)>) -> Option<R> {
        let mut out = None;
        self.tx.send_if_modified(|current| match f(current.as_deref()) {
            Some((value, result)) => {
                *current = Some(Arc::new(value));
                out = Some(result);
                true
            }
            None => false,
        });
        out
    }

    /// Returns the current value, if one was ever set.
    pub fn get(&self) -> Option<Arc<T>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.tx.subscribe(),
            replayed: false,
        }
    }
}

/// A subscriber to a [`Signal`].
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<Option<Arc<T>>>,
    replayed: bool,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            replayed: self.replayed,
        }
    }
}

impl<T> Subscription<T> {
    /// Returns the current value and marks it as seen.
    pub fn current(&mut self) -> Option<Arc<T>> {
        self.replayed = true;
        self.rx.borrow_and_update().clone()
    }

    /// Waits for a value this subscriber has not seen yet.
    ///
    /// The first call returns the current value immediately if there is
    /// one. Returns `None` once the signal is dropped.
    pub async fn next(&mut self) -> Option<Arc<T>> {
        if !self.replayed {
            self.replayed = true;
            let current = self.rx.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }
        }
        loop {
            self.rx.changed().await.ok()?;
            if let Some(value) = self.rx.borrow_and_update().clone() {
                return Some(value);
            }
        }
    }

    /// Waits until the signal changes. Returns false once it is dropped.
    pub async fn changed(&mut self) -> bool {
        self.replayed = true;
        self.rx.changed().await.is_ok()
    }

    /// Waits for a value satisfying `predicate`, checking the current one first.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<Arc<T>> {
        self.replayed = true;
        let value = self
            .rx
            .wait_for(|v| v.as_deref().is_some_and(&mut predicate))
            .await
            .ok()?;
        value.clone()
    }
}

/// Waits for the next value, then for `quiet` to pass without another one.
///
/// Each new value restarts the quiet period; only the last value of a burst
/// is returned. If the signal is dropped during the quiet period, the last
/// value seen is returned. Returns `None` if the signal is dropped before
/// any value arrives.
pub async fn debounced<T>(subscription: &mut Subscription<T>, quiet: Duration) -> Option<Arc<T>> {
    let mut latest = subscription.next().await?;
    loop {
        match tokio::time::timeout(quiet, subscription.next()).await {
            Ok(Some(value)) => latest = value,
            Ok(None) | Err(_) => return Some(latest),
        }
    }
}
