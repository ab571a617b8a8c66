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

//! # shiori
//!
//! 栞-- a bookmark. The client-side core of a web-novel reading site: chapter navigation with a
//! session-scoped cache, speculative prefetch of neighboring chapters, and a persisted "last
//! read" bookmark per novel.
//!
//! Most of such a site is CRUD glue; the part that actually has invariants worth encoding is
//! the navigation/prefetch machinery, and that's what lives here:
//!
//! - [cache]: chapters fetched once are never fetched again (first-write-wins, no eviction,
//!   session lifetime);
//! - [prefetch]: neighbors are fetched in the background with in-flight deduplication, and
//!   prefetch failures never reach the reader;
//! - [session]: an explicit `Idle | Loading | Ready | Error` state machine that serializes
//!   user navigation-- at most one in flight-- and refuses to walk off either end of a novel;
//! - [gateway] & [bookmarks]: the external collaborators (the chapter store behind the site's
//!   API, and the "last read" key-value store) behind traits, with working implementations of
//!   each;
//! - [view]: the presentational projection a UI renders from.
//!
//! A [ReadingSession] owns all of its mutable state-- there are no process-wide singletons, so
//! two sessions (two tabs) are fully isolated, and tests get a fresh world each.
//!
//! [ReadingSession]: crate::session::ReadingSession
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use shiori::{
//!     bookmarks::JsonFileBookmarks,
//!     entities::ChapterId,
//!     gateway::HttpChapterStore,
//!     session::{ReadingSession, SessionConfig},
//! };
//!
//! let store = HttpChapterStore::new(url::Url::parse("https://novels.example.com/")?)?;
//! let bookmarks = JsonFileBookmarks::new("bookmarks.json");
//! let session = ReadingSession::new(Arc::new(store), Arc::new(bookmarks), SessionConfig::default());
//!
//! session.open(ChapterId::new("1")?).await;
//! session.next().await; // resolves from cache if the prefetch beat us here
//! # Ok(())
//! # }
//! ```

pub mod bookmarks;
pub mod cache;
pub mod entities;
pub mod gateway;
pub mod prefetch;
pub mod session;
pub mod view;
