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

//! # the reading session
//!
//! [ReadingSession] is the navigation controller: the one stateful piece orchestrating the
//! cache, the prefetcher, the gateway & the bookmark sink. The site this replaces kept that
//! state as a handful of independent booleans (`loading`, `error`, ...) in module-level
//! globals; here it's an explicit tagged variant ([NavState]) owned by an explicitly
//! constructed session, so illegal combinations (loading *and* errored) are unrepresentable,
//! and two sessions-- two tabs-- can't bleed state into one another.
//!
//! The state machine:
//!
//! ```text
//!             open(id)                    fetch ok
//!   Idle --------------------> Loading ------------> Ready
//!                              ^  |  ^                 |
//!                     retry()  |  |  +--- next()/prev()+
//!                              |  v
//!                            Error(message)
//! ```
//!
//! The guard invariant: any navigation request-- `open`, `next`, `prev`, `retry`-- issued while
//! the session is `Loading` is ignored ([NavOutcome::Busy]). At most one navigation is in
//! flight at any time, which is what keeps rapid repeated key presses or swipes from racing the
//! reader against themselves. Requests past the first or last chapter are rejected
//! ([NavOutcome::Boundary]) rather than attempted; the view layer disables those affordances.
//!
//! On entry to `Ready` the session (a) writes the bookmark, fire-and-forget, and (b) schedules
//! prefetch of the next then the previous neighbor-- next first, reflecting the likelihood that
//! a reader continues forward. Neither side effect is awaited; neither can fail the navigation.

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    bookmarks::BookmarkSink,
    cache::ChapterCache,
    entities::{ChapterId, ChapterWithNeighbors, Direction, NovelId},
    gateway::ChapterStore,
    prefetch::PrefetchCoordinator,
};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         session state                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Where the session is in its lifecycle
#[derive(Clone, Debug)]
pub enum NavState {
    /// Created, but no chapter requested yet
    Idle,
    /// A fetch for `target` is resolving; all navigation requests are ignored until it settles
    Loading { target: ChapterId },
    /// `chapter` is on screen
    Ready { chapter: Arc<ChapterWithNeighbors> },
    /// The last navigation failed; `message` is shown to the reader verbatim, with a retry
    /// affordance re-entering `Loading` for the same target
    Error { target: ChapterId, message: String },
}

impl NavState {
    pub fn is_loading(&self) -> bool {
        matches!(self, NavState::Loading { .. })
    }
}

/// What became of a navigation request
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NavOutcome {
    /// The requested chapter is now the current chapter
    Arrived,
    /// The fetch failed; the session is in [NavState::Error]
    Failed,
    /// Another navigation was already in flight; this request was dropped
    Busy,
    /// Nothing to navigate to: no neighbor in that direction, or nothing to retry
    Boundary,
}

/// Session tunables
///
/// The prefetch delay deserves a note: the original system paused for a fixed interval before
/// issuing each neighbor prefetch. Whether that was deliberate pacing or an incidental
/// workaround is lost to history, so it's a policy knob here rather than a hard-coded constant;
/// zero disables the pause entirely.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(rename = "prefetch-delay")]
    pub prefetch_delay: Duration,
    #[serde(rename = "default-font-size")]
    pub default_font_size: u32,
    #[serde(rename = "min-font-size")]
    pub min_font_size: u32,
    #[serde(rename = "max-font-size")]
    pub max_font_size: u32,
    #[serde(rename = "font-size-step")]
    pub font_size_step: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prefetch_delay: Duration::from_millis(250),
            default_font_size: 18,
            min_font_size: 12,
            max_font_size: 28,
            font_size_step: 2,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         ReadingSession                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The navigation controller; see the [module docs](self)
///
/// Cheap to clone; clones share the session. The cache & prefetcher are constructed here and
/// scoped to the session's lifetime.
#[derive(Clone)]
pub struct ReadingSession {
    store: Arc<dyn ChapterStore>,
    bookmarks: Arc<dyn BookmarkSink>,
    cache: ChapterCache,
    prefetch: PrefetchCoordinator,
    state: Arc<Mutex<NavState>>,
    font_size: Arc<AtomicU32>,
    config: SessionConfig,
}

impl ReadingSession {
    pub fn new(
        store: Arc<dyn ChapterStore>,
        bookmarks: Arc<dyn BookmarkSink>,
        config: SessionConfig,
    ) -> ReadingSession {
        let cache = ChapterCache::new();
        let prefetch =
            PrefetchCoordinator::new(store.clone(), cache.clone(), config.prefetch_delay);
        ReadingSession {
            store,
            bookmarks,
            cache,
            prefetch,
            state: Arc::new(Mutex::new(NavState::Idle)),
            font_size: Arc::new(AtomicU32::new(config.default_font_size)),
            config,
        }
    }
    /// Snapshot of the current state
    pub fn state(&self) -> NavState {
        self.state.lock().unwrap(/* known good */).clone()
    }
    /// The chapter on screen, if any
    pub fn current(&self) -> Option<Arc<ChapterWithNeighbors>> {
        match &*self.state.lock().unwrap(/* known good */) {
            NavState::Ready { chapter } => Some(chapter.clone()),
            _ => None,
        }
    }
    /// The session's chapter cache (shared with the prefetcher)
    pub fn cache(&self) -> &ChapterCache {
        &self.cache
    }
    /// Navigate to an explicit chapter-- the initial mount, or a link activation
    pub async fn open(&self, target: ChapterId) -> NavOutcome {
        {
            let mut state = self.state.lock().unwrap(/* known good */);
            if state.is_loading() {
                debug!("open({target}) ignored: a navigation is already in flight");
                return NavOutcome::Busy;
            }
            *state = NavState::Loading {
                target: target.clone(),
            };
        }
        self.load(target).await
    }
    /// Navigate to the current chapter's neighbor in `direction`
    pub async fn navigate(&self, direction: Direction) -> NavOutcome {
        let target = {
            let mut state = self.state.lock().unwrap(/* known good */);
            match &*state {
                NavState::Loading { .. } => {
                    debug!("{direction}-chapter request ignored: a navigation is already in flight");
                    return NavOutcome::Busy;
                }
                NavState::Ready { chapter } => match chapter.neighbor(direction) {
                    Some(id) => {
                        let target = id.clone();
                        *state = NavState::Loading {
                            target: target.clone(),
                        };
                        target
                    }
                    None => {
                        debug!(
                            "no {direction} chapter from {}; request rejected",
                            chapter.id()
                        );
                        return NavOutcome::Boundary;
                    }
                },
                // With no chapter on screen there is no neighbor to move to.
                NavState::Idle | NavState::Error { .. } => return NavOutcome::Boundary,
            }
        };
        self.load(target).await
    }
    /// Arrow-key / swipe-forward affordance
    pub async fn next(&self) -> NavOutcome {
        self.navigate(Direction::Next).await
    }
    /// Arrow-key / swipe-back affordance
    pub async fn prev(&self) -> NavOutcome {
        self.navigate(Direction::Prev).await
    }
    /// Re-issue the fetch that put the session into [NavState::Error]; a no-op from any other
    /// state
    pub async fn retry(&self) -> NavOutcome {
        let target = {
            let mut state = self.state.lock().unwrap(/* known good */);
            match &*state {
                NavState::Loading { .. } => return NavOutcome::Busy,
                NavState::Error { target, .. } => {
                    let target = target.clone();
                    *state = NavState::Loading {
                        target: target.clone(),
                    };
                    target
                }
                NavState::Idle | NavState::Ready { .. } => return NavOutcome::Boundary,
            }
        };
        self.load(target).await
    }
    /// "Continue reading": open the bookmarked chapter for `novel`, if there is one
    pub async fn resume(&self, novel: &NovelId) -> Option<NavOutcome> {
        match self.bookmarks.load(novel).await {
            Ok(Some(bookmark)) => Some(self.open(bookmark.chapter_id).await),
            Ok(None) => None,
            Err(err) => {
                warn!("failed to load the bookmark for novel {novel}: {err}");
                None
            }
        }
    }
    /// Resolve `target`-- cache first, gateway on a miss-- and settle the `Loading` state the
    /// caller just entered
    async fn load(&self, target: ChapterId) -> NavOutcome {
        let resolved = match self.cache.get(&target) {
            Some(chapter) => {
                debug!("chapter {target} resolved from cache");
                Ok(chapter)
            }
            // The cache is populated before the transition to `Ready`, and only on full
            // success-- a failed fetch caches nothing.
            None => self
                .store
                .fetch_chapter(&target)
                .await
                .map(|fetched| self.cache.put(fetched)),
        };
        match resolved {
            Ok(chapter) => {
                self.enter_ready(chapter);
                NavOutcome::Arrived
            }
            Err(err) => {
                let message = err.to_string();
                debug!("navigation to chapter {target} failed: {message}");
                *self.state.lock().unwrap(/* known good */) =
                    NavState::Error { target, message };
                NavOutcome::Failed
            }
        }
    }
    fn enter_ready(&self, chapter: Arc<ChapterWithNeighbors>) {
        *self.state.lock().unwrap(/* known good */) = NavState::Ready {
            chapter: chapter.clone(),
        };
        // Auto-bookmark, off the hot path; a failure here is logged & swallowed.
        let sink = self.bookmarks.clone();
        let novel = chapter.chapter.novel_id.clone();
        let id = chapter.chapter.chapter_id.clone();
        let title = chapter.chapter.title.clone();
        tokio::spawn(async move {
            if let Err(err) = sink.save(&novel, &id, &title).await {
                warn!("failed to save the bookmark for novel {novel}: {err}");
            }
        });
        // Next before prev: readers mostly keep going forward. Neither is awaited.
        if let Some(next) = &chapter.next_chapter_id {
            self.prefetch.schedule(next.clone());
        }
        if let Some(prev) = &chapter.prev_chapter_id {
            self.prefetch.schedule(prev.clone());
        }
    }
    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Font size: a display-only preference, clamped & stepped. Lives on the session so that the
    // view layer has one place to ask.
    ////////////////////////////////////////////////////////////////////////////////////////////////
    pub fn font_size(&self) -> u32 {
        self.font_size.load(Ordering::Relaxed)
    }
    pub fn increase_font_size(&self) -> u32 {
        let next = (self.font_size.load(Ordering::Relaxed) + self.config.font_size_step)
            .min(self.config.max_font_size);
        self.font_size.store(next, Ordering::Relaxed);
        next
    }
    pub fn decrease_font_size(&self) -> u32 {
        let next = self
            .font_size
            .load(Ordering::Relaxed)
            .saturating_sub(self.config.font_size_step)
            .max(self.config.min_font_size);
        self.font_size.store(next, Ordering::Relaxed);
        next
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{
        bookmarks::MemoryBookmarks,
        entities::ChapterRecord,
        gateway::InMemoryChapterStore,
    };

    fn store_with_three_chapters() -> Arc<InMemoryChapterStore> {
        let store = InMemoryChapterStore::new();
        for (id, title, order) in [(1, "First", 1), (2, "Second", 2), (3, "Third", 3)] {
            store.add_chapter(ChapterRecord::new(
                ChapterId::from(id),
                NovelId::new("n1").unwrap(),
                title,
                "body",
                order,
            ));
        }
        Arc::new(store)
    }

    fn quiet_config() -> SessionConfig {
        SessionConfig {
            prefetch_delay: Duration::ZERO,
            ..SessionConfig::default()
        }
    }

    fn session() -> ReadingSession {
        ReadingSession::new(
            store_with_three_chapters(),
            Arc::new(MemoryBookmarks::new()),
            quiet_config(),
        )
    }

    #[tokio::test]
    async fn open_reaches_ready() {
        let session = session();
        assert!(matches!(session.state(), NavState::Idle));
        assert_eq!(session.open(ChapterId::from(2)).await, NavOutcome::Arrived);
        let current = session.current().unwrap();
        assert_eq!(current.chapter.title, "Second");
        assert_eq!(current.prev_chapter_id, Some(ChapterId::from(1)));
        assert_eq!(current.next_chapter_id, Some(ChapterId::from(3)));
    }

    #[tokio::test]
    async fn boundaries_are_rejected() {
        let session = session();
        session.open(ChapterId::from(1)).await;
        assert_eq!(session.prev().await, NavOutcome::Boundary);
        // The rejected request must not have disturbed the current chapter.
        assert_eq!(session.current().unwrap().id(), &ChapterId::from(1));

        session.open(ChapterId::from(3)).await;
        assert_eq!(session.next().await, NavOutcome::Boundary);
        assert_eq!(session.current().unwrap().id(), &ChapterId::from(3));
    }

    #[tokio::test]
    async fn navigation_from_idle_or_error_is_rejected() {
        let session = session();
        assert_eq!(session.next().await, NavOutcome::Boundary);
        assert_eq!(session.retry().await, NavOutcome::Boundary);

        assert_eq!(session.open(ChapterId::from(99)).await, NavOutcome::Failed);
        assert_eq!(session.next().await, NavOutcome::Boundary);
    }

    #[tokio::test]
    async fn not_found_enters_error_and_retry_reissues() {
        let session = session();
        assert_eq!(session.open(ChapterId::from(99)).await, NavOutcome::Failed);
        match session.state() {
            NavState::Error { target, message } => {
                assert_eq!(target, ChapterId::from(99));
                assert_eq!(message, "Chapter not found");
            }
            state => panic!("expected Error, got {state:?}"),
        }
        // Retry re-enters Loading with the *same* target-- and fails the same way here.
        assert_eq!(session.retry().await, NavOutcome::Failed);
        assert!(matches!(session.state(), NavState::Error { .. }));
    }

    #[tokio::test]
    async fn font_size_is_clamped_and_stepped() {
        let session = session();
        assert_eq!(session.font_size(), 18);
        assert_eq!(session.increase_font_size(), 20);
        for _ in 0..10 {
            session.increase_font_size();
        }
        assert_eq!(session.font_size(), 28);
        for _ in 0..20 {
            session.decrease_font_size();
        }
        assert_eq!(session.font_size(), 12);
    }

    #[tokio::test]
    async fn resume_opens_the_bookmarked_chapter() {
        let bookmarks = Arc::new(MemoryBookmarks::new());
        let session = ReadingSession::new(store_with_three_chapters(), bookmarks, quiet_config());
        let novel = NovelId::new("n1").unwrap();

        assert!(session.resume(&novel).await.is_none());

        session.open(ChapterId::from(2)).await;
        // The bookmark write is fire-and-forget; give it a beat.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let fresh = ReadingSession::new(
                store_with_three_chapters(),
                session.bookmarks.clone(),
                quiet_config(),
            );
            if let Some(outcome) = fresh.resume(&novel).await {
                assert_eq!(outcome, NavOutcome::Arrived);
                assert_eq!(fresh.current().unwrap().id(), &ChapterId::from(2));
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "bookmark never landed");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
