//! Ordered fallback chains
//!
//! A chain is an ordered list of labelled providers; the first one that
//! yields a value wins and later providers are never evaluated. Async
//! providers are unpolled futures, so a skipped source issues no request.

use std::future::Future;
use std::pin::Pin;

/// A lazily evaluated, labelled provider
pub struct Provider<'a, L, T> {
    pub label: L,
    run: Box<dyn FnOnce() -> Option<T> + 'a>,
}

impl<'a, L, T> Provider<'a, L, T> {
    pub fn new(label: L, run: impl FnOnce() -> Option<T> + 'a) -> Self {
        Self {
            label,
            run: Box::new(run),
        }
    }
}

/// First present value together with the label of the provider that produced it
pub fn first_present<'a, L, T>(providers: Vec<Provider<'a, L, T>>) -> Option<(L, T)> {
    for provider in providers {
        if let Some(value) = (provider.run)() {
            return Some((provider.label, value));
        }
    }
    None
}

/// Unpolled future yielding an optional value
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Option<T>> + Send + 'a>>;

/// A labelled provider backed by a future
pub struct AsyncProvider<'a, L, T> {
    pub label: L,
    run: ProviderFuture<'a, T>,
}

impl<'a, L, T> AsyncProvider<'a, L, T> {
    pub fn new(label: L, run: impl Future<Output = Option<T>> + Send + 'a) -> Self {
        Self {
            label,
            run: Box::pin(run),
        }
    }
}

/// Await providers in order; the first present value wins
pub async fn first_present_async<'a, L, T>(
    providers: Vec<AsyncProvider<'a, L, T>>,
) -> Option<(L, T)> {
    for provider in providers {
        if let Some(value) = provider.run.await {
            return Some((provider.label, value));
        }
    }
    None
}

/// Accept only finite, strictly positive numbers
pub fn positive_finite(value: f64) -> Option<f64> {
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}
