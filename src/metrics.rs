//! Request counter for the static file server.
//!
//! Owned by the entry point and handed to the routers that need it.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared count of requests served under `/app/`.
#[derive(Clone, Default, Debug)]
pub struct HitCounter(Arc<AtomicU64>);

impl HitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

/// Middleware counting every request that reaches the wrapped routes.
pub async fn count_hits(State(hits): State<HitCounter>, request: Request, next: Next) -> Response {
    hits.increment();
    next.run(request).await
}
