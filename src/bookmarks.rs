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

//! # bookmark persistence
//!
//! A bookmark is a simple key-value write: `(novel) -> (chapter, title, timestamp)`, at most one
//! per novel, queried for display ("continue reading") only. The reading session writes one on
//! every successful chapter load, best-effort & fire-and-forget-- a failed save is logged and
//! never surfaced to the reader.
//!
//! Two implementations: [MemoryBookmarks] for tests & throwaway sessions, and
//! [JsonFileBookmarks], which keeps the whole collection in a single JSON document on disk--
//! the closest native analog to the browser storage the site itself uses.

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::Utc;
use snafu::{prelude::*, Backtrace};
use tap::Pipe;

use crate::entities::{Bookmark, ChapterId, NovelId};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to read bookmarks from {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Failed to write bookmarks to {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Failed to parse bookmarks in {}: {source}", path.display()))]
    De {
        path: PathBuf,
        source: serde_json::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Failed to serialize bookmarks: {source}"))]
    Ser {
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       the BookmarkSink trait                                   //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Persistent "last read" store, keyed by novel
#[async_trait]
pub trait BookmarkSink: Send + Sync {
    /// Record `chapter` as the last chapter read for `novel`, replacing any prior bookmark.
    /// Saving the same arguments twice leaves the bookmark unchanged except for its timestamp.
    async fn save(&self, novel: &NovelId, chapter: &ChapterId, title: &str) -> Result<()>;
    /// The last chapter read for `novel`, if any
    async fn load(&self, novel: &NovelId) -> Result<Option<Bookmark>>;
    /// Forget the bookmark for `novel` (a no-op if there is none)
    async fn remove(&self, novel: &NovelId) -> Result<()>;
    /// All bookmarks, most recently read first
    async fn all(&self) -> Result<Vec<Bookmark>>;
}

fn make_bookmark(novel: &NovelId, chapter: &ChapterId, title: &str) -> Bookmark {
    Bookmark {
        novel_id: novel.clone(),
        chapter_id: chapter.clone(),
        chapter_title: title.to_owned(),
        timestamp: Utc::now(),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         MemoryBookmarks                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// [BookmarkSink] that forgets everything when dropped
#[derive(Debug, Default)]
pub struct MemoryBookmarks {
    bookmarks: Mutex<HashMap<NovelId, Bookmark>>,
}

impl MemoryBookmarks {
    pub fn new() -> MemoryBookmarks {
        MemoryBookmarks::default()
    }
}

#[async_trait]
impl BookmarkSink for MemoryBookmarks {
    async fn save(&self, novel: &NovelId, chapter: &ChapterId, title: &str) -> Result<()> {
        self.bookmarks
            .lock()
            .unwrap(/* known good */)
            .insert(novel.clone(), make_bookmark(novel, chapter, title));
        Ok(())
    }
    async fn load(&self, novel: &NovelId) -> Result<Option<Bookmark>> {
        Ok(self.bookmarks.lock().unwrap(/* known good */).get(novel).cloned())
    }
    async fn remove(&self, novel: &NovelId) -> Result<()> {
        self.bookmarks.lock().unwrap(/* known good */).remove(novel);
        Ok(())
    }
    async fn all(&self) -> Result<Vec<Bookmark>> {
        let mut all: Vec<Bookmark> = self
            .bookmarks
            .lock()
            .unwrap(/* known good */)
            .values()
            .cloned()
            .collect();
        all.sort_by(|lhs, rhs| rhs.timestamp.cmp(&lhs.timestamp));
        Ok(all)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        JsonFileBookmarks                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// [BookmarkSink] backed by a single JSON document on disk
///
/// The document is the entire collection (a map from novel id to [Bookmark]); each mutation
/// reads, updates & rewrites it. That read-modify-write is serialized by an internal lock, so
/// a flurry of saves from one session can't interleave. A missing file reads as an empty
/// collection.
#[derive(Debug)]
pub struct JsonFileBookmarks {
    path: PathBuf,
    guard: tokio::sync::Mutex<()>,
}

impl JsonFileBookmarks {
    pub fn new(path: impl AsRef<Path>) -> JsonFileBookmarks {
        JsonFileBookmarks {
            path: path.as_ref().to_owned(),
            guard: tokio::sync::Mutex::new(()),
        }
    }
    async fn read_all(&self) -> Result<HashMap<NovelId, Bookmark>> {
        match tokio::fs::read(&self.path).await {
            Ok(buf) => serde_json::from_slice(&buf).context(DeSnafu {
                path: self.path.clone(),
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err).context(ReadSnafu {
                path: self.path.clone(),
            }),
        }
    }
    async fn write_all(&self, bookmarks: &HashMap<NovelId, Bookmark>) -> Result<()> {
        let buf = serde_json::to_vec_pretty(bookmarks).context(SerSnafu)?;
        tokio::fs::write(&self.path, buf).await.context(WriteSnafu {
            path: self.path.clone(),
        })
    }
}

#[async_trait]
impl BookmarkSink for JsonFileBookmarks {
    async fn save(&self, novel: &NovelId, chapter: &ChapterId, title: &str) -> Result<()> {
        let _guard = self.guard.lock().await;
        let mut bookmarks = self.read_all().await?;
        bookmarks.insert(novel.clone(), make_bookmark(novel, chapter, title));
        self.write_all(&bookmarks).await
    }
    async fn load(&self, novel: &NovelId) -> Result<Option<Bookmark>> {
        let _guard = self.guard.lock().await;
        Ok(self.read_all().await?.get(novel).cloned())
    }
    async fn remove(&self, novel: &NovelId) -> Result<()> {
        let _guard = self.guard.lock().await;
        let mut bookmarks = self.read_all().await?;
        if bookmarks.remove(novel).is_some() {
            self.write_all(&bookmarks).await?;
        }
        Ok(())
    }
    async fn all(&self) -> Result<Vec<Bookmark>> {
        let _guard = self.guard.lock().await;
        let mut all = self
            .read_all()
            .await?
            .into_values()
            .collect::<Vec<Bookmark>>();
        all.sort_by(|lhs, rhs| rhs.timestamp.cmp(&lhs.timestamp));
        all.pipe(Ok)
    }
}
