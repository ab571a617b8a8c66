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

//! # chapter cache
//!
//! A session-scoped, in-memory mapping from [ChapterId] to previously fetched chapter. There is
//! deliberately no eviction: a reading session touches a small, bounded set of chapters, and the
//! cache is dropped with the session. Entries are immutable once written-- chapter content never
//! changes out from under a session, so fetch results are idempotent for a given identifier and
//! the first write wins.
//!
//! The handle is cheap to clone; clones share the underlying map. Note that this is *not* a
//! process-wide singleton: each [ReadingSession] constructs its own, so two sessions (two tabs,
//! say) never bleed state into one another.
//!
//! [ReadingSession]: crate::session::ReadingSession

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::debug;

use crate::entities::{ChapterId, ChapterWithNeighbors};

/// Session-scoped chapter cache; see the [module docs](self)
#[derive(Clone, Debug, Default)]
pub struct ChapterCache {
    entries: Arc<Mutex<HashMap<ChapterId, Arc<ChapterWithNeighbors>>>>,
}

impl ChapterCache {
    pub fn new() -> ChapterCache {
        ChapterCache::default()
    }
    /// Pure lookup; no side effects
    pub fn get(&self, id: &ChapterId) -> Option<Arc<ChapterWithNeighbors>> {
        self.entries.lock().unwrap(/* known good */).get(id).cloned()
    }
    /// First-write-wins insert
    ///
    /// Returns the cached entry-- the one just written, or the pre-existing one if the chapter
    /// was already present (in which case `chapter` is discarded). Never fails, never evicts.
    pub fn put(&self, chapter: ChapterWithNeighbors) -> Arc<ChapterWithNeighbors> {
        let id = chapter.id().clone();
        let mut entries = self.entries.lock().unwrap(/* known good */);
        if entries.contains_key(&id) {
            debug!("chapter {id} is already cached; keeping the original");
        }
        entries
            .entry(id)
            .or_insert_with(|| Arc::new(chapter))
            .clone()
    }
    pub fn contains(&self, id: &ChapterId) -> bool {
        self.entries.lock().unwrap(/* known good */).contains_key(id)
    }
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap(/* known good */).len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
