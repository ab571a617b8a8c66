// Copyright (C) 2026 shiori developers
//
// This file is part of shiori.
//
// shiori is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// shiori is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with shiori.  If not,
// see <http://www.gnu.org/licenses/>.

//! # neighbor prefetch
//!
//! Prefetching is a speculative optimization, not a correctness requirement: after a chapter
//! loads, its neighbors are fetched in the background so that the likely next navigation
//! resolves from cache without a round trip. Two invariants keep this tidy:
//!
//! 1. an identifier that is already cached, or already being fetched, is never fetched again
//!    ([PrefetchCoordinator::try_begin] is the *single* check-and-mark critical section-- the
//!    check and the in-flight insertion happen under one lock, so two concurrent requests for
//!    the same neighbor can't both be told to go ahead);
//! 2. an identifier leaves the in-flight set exactly once, when its fetch settles
//!    ([PrefetchCoordinator::settle] is called on the success path *and* the failure path).
//!
//! Failures are contained here: a failed prefetch is logged at debug level, the identifier
//! becomes fetchable again, and nothing ever surfaces to the reader. There is no cancellation--
//! once initiated, a prefetch completes or fails on its own; if the user has navigated away by
//! the time it resolves, the cache write is still valid (chapter content is immutable) and
//! simply primes the cache for a later visit.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::{cache::ChapterCache, entities::ChapterId, gateway::ChapterStore};

/// Tracks in-flight fetches & runs the background prefetch tasks; see the [module docs](self)
#[derive(Clone)]
pub struct PrefetchCoordinator {
    store: Arc<dyn ChapterStore>,
    cache: ChapterCache,
    in_flight: Arc<Mutex<HashSet<ChapterId>>>,
    delay: Duration,
}

impl PrefetchCoordinator {
    /// `delay` is how long a scheduled prefetch waits before issuing its fetch-- a tunable
    /// policy knob (zero is fine), there to keep a burst of navigation from stampeding the
    /// gateway with speculative reads it may not need.
    pub fn new(
        store: Arc<dyn ChapterStore>,
        cache: ChapterCache,
        delay: Duration,
    ) -> PrefetchCoordinator {
        PrefetchCoordinator {
            store,
            cache,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            delay,
        }
    }
    /// Check-and-mark: returns true iff `id` is neither cached nor in flight, in which case
    /// `id` has been marked in-flight before this method returns. The caller owes a matching
    /// [settle](PrefetchCoordinator::settle) once its fetch resolves, either way.
    pub fn try_begin(&self, id: &ChapterId) -> bool {
        if self.cache.contains(id) {
            return false;
        }
        // The insertion doubles as the membership test; holding the lock for both closes the
        // window between "judged fetchable" and "marked in-flight".
        self.in_flight.lock().unwrap(/* known good */).insert(id.clone())
    }
    /// Unconditionally remove `id` from the in-flight set
    pub fn settle(&self, id: &ChapterId) {
        self.in_flight.lock().unwrap(/* known good */).remove(id);
    }
    pub fn is_in_flight(&self, id: &ChapterId) -> bool {
        self.in_flight.lock().unwrap(/* known good */).contains(id)
    }
    /// Kick off a background prefetch of `id`
    ///
    /// Non-blocking; the caller never awaits the returned handle (it's exposed for tests). The
    /// task holds clones of the session's cache & store, so it remains valid even if the
    /// session has since navigated elsewhere.
    pub fn schedule(&self, id: ChapterId) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run(id).await })
    }
    /// The body of a prefetch task
    pub async fn run(&self, id: ChapterId) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if !self.try_begin(&id) {
            debug!("skipping prefetch of chapter {id}: cached or already in flight");
            return;
        }
        match self.store.fetch_chapter(&id).await {
            Ok(chapter) => {
                self.cache.put(chapter);
                debug!("prefetched chapter {id}");
            }
            // Silent by design of the feature: the reader never hears about this, and the id is
            // simply fetchable again on a later attempt.
            Err(err) => debug!("prefetch of chapter {id} failed: {err}"),
        }
        self.settle(&id);
    }
}
