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

//! # chapter store gateway
//!
//! Abstractions for the read-only chapter store behind the site's API, plus the two
//! implementations shiori ships: [HttpChapterStore], which consumes the site's JSON envelope
//! over HTTP, and [InMemoryChapterStore], a self-contained backend for tests & demos.
//!
//! The one contract that matters here: `fetch_chapter` resolves the previous & next chapter
//! identifiers strictly by the `order` field within the same novel-- not by identifier magnitude
//! or insertion order-- projecting only the neighbor identifier, not its content. Sparse or
//! non-sequential chapter identifiers therefore still navigate correctly.
//!
//! No timeout or retry policy is defined at this layer's *callers*; an implementation governs
//! its own (e.g. by handing [HttpChapterStore] a suitably-configured [reqwest::Client]) and
//! surfaces only success or failure.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use snafu::{prelude::*, Backtrace};
use tracing::debug;
use url::Url;

use crate::entities::{
    ChapterId, ChapterListItem, ChapterRecord, ChapterWithNeighbors, NovelId, NovelRecord,
};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Gateway errors
///
/// The navigation layer cannot distinguish recoverability without a retry, so it treats all of
/// these identically: the rendered message goes to the reader verbatim, along with a retry
/// affordance. The `Display` text therefore *is* the user-facing copy.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Chapter not found"))]
    ChapterNotFound { id: ChapterId, backtrace: Backtrace },
    #[snafu(display("Novel not found"))]
    NovelNotFound { id: NovelId, backtrace: Backtrace },
    #[snafu(display("{message}"))]
    Server { message: String, backtrace: Backtrace },
    #[snafu(display("Network error occurred: {source}"))]
    Transport {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Malformed response from the chapter API: {source}"))]
    Envelope {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("{url} cannot serve as an API base URL"))]
    BadBase { url: Url, backtrace: Backtrace },
}

impl Error {
    /// True just in case the requested record simply doesn't exist (as opposed to a transient
    /// transport or server failure)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ChapterNotFound { .. } | Error::NovelNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        the ChapterStore trait                                  //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Read-only lookups against the chapter store
///
/// All operations are stateless lookups; implementations must be safe to share across tasks
/// (prefetches run concurrently with the active navigation fetch against the same store).
#[async_trait]
pub trait ChapterStore: Send + Sync {
    /// Fetch a chapter together with its neighbor identifiers, resolved by `order` within the
    /// owning novel
    async fn fetch_chapter(&self, id: &ChapterId) -> Result<ChapterWithNeighbors>;
    /// All novels on the site
    async fn list_novels(&self) -> Result<Vec<NovelRecord>>;
    /// A single novel's detail record
    async fn fetch_novel(&self, id: &NovelId) -> Result<NovelRecord>;
    /// A novel's chapter list (identifier/title/order projection), sorted by `order`
    async fn list_chapters(&self, id: &NovelId) -> Result<Vec<ChapterListItem>>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        HttpChapterStore                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The JSON envelope every API route wraps its payload in
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

/// [ChapterStore] over the site's HTTP API
///
/// Routes consumed: `/api/novels`, `/api/novel/{id}`, `/api/novel/{id}/chapters` and
/// `/api/chapter/{id}`. Each returns `{ success, data?, error? }`; a missing record comes back
/// as a 404 with `success: false`.
#[derive(Clone, Debug)]
pub struct HttpChapterStore {
    base: Url,
    client: reqwest::Client,
}

impl HttpChapterStore {
    /// Construct a store from the site's base URL (scheme & authority; any path is kept as a
    /// prefix)
    pub fn new(base: Url) -> Result<HttpChapterStore> {
        HttpChapterStore::with_client(base, reqwest::Client::new())
    }
    /// As [HttpChapterStore::new], but with a caller-configured [reqwest::Client]-- this is
    /// where timeout & retry policy for the gateway lives
    pub fn with_client(base: Url, client: reqwest::Client) -> Result<HttpChapterStore> {
        ensure!(!base.cannot_be_a_base(), BadBaseSnafu { url: base });
        Ok(HttpChapterStore { base, client })
    }
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .unwrap(/* known good; checked in with_client */)
            .pop_if_empty()
            .extend(segments);
        url
    }
    /// Issue a GET & unwrap the JSON envelope; `on_404` supplies the not-found error for this
    /// route
    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        on_404: impl FnOnce() -> Error,
    ) -> Result<T> {
        debug!("GET {url}");
        let rsp = self
            .client
            .get(url)
            .send()
            .await
            .context(TransportSnafu)?;
        if rsp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(on_404());
        }
        let envelope: ApiResponse<T> = rsp.json().await.context(EnvelopeSnafu)?;
        match envelope {
            ApiResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            ApiResponse { error, .. } => ServerSnafu {
                message: error.unwrap_or_else(|| "Failed to fetch".to_owned()),
            }
            .fail(),
        }
    }
}

#[async_trait]
impl ChapterStore for HttpChapterStore {
    async fn fetch_chapter(&self, id: &ChapterId) -> Result<ChapterWithNeighbors> {
        let url = self.api_url(&["api", "chapter", id.as_ref()]);
        self.get(url, || {
            ChapterNotFoundSnafu { id: id.clone() }.build()
        })
        .await
    }
    async fn list_novels(&self) -> Result<Vec<NovelRecord>> {
        let url = self.api_url(&["api", "novels"]);
        self.get(url, || ServerSnafu { message: "Failed to fetch novels".to_owned() }.build())
            .await
    }
    async fn fetch_novel(&self, id: &NovelId) -> Result<NovelRecord> {
        let url = self.api_url(&["api", "novel", id.as_ref()]);
        self.get(url, || NovelNotFoundSnafu { id: id.clone() }.build())
            .await
    }
    async fn list_chapters(&self, id: &NovelId) -> Result<Vec<ChapterListItem>> {
        let url = self.api_url(&["api", "novel", id.as_ref(), "chapters"]);
        self.get(url, || NovelNotFoundSnafu { id: id.clone() }.build())
            .await
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       InMemoryChapterStore                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Default)]
struct Shelves {
    novels: HashMap<NovelId, NovelRecord>,
    chapters: HashMap<ChapterId, ChapterRecord>,
}

/// A [ChapterStore] holding its records in memory
///
/// Implements the same neighbor-by-`order` resolution as the real API, which makes it the
/// reference backend for exercising the navigation layer (and for demos) without a server. An
/// optional per-request latency can be injected to hold fetches in flight.
#[derive(Debug, Default)]
pub struct InMemoryChapterStore {
    shelves: Mutex<Shelves>,
    latency: Option<Duration>,
}

impl InMemoryChapterStore {
    pub fn new() -> InMemoryChapterStore {
        InMemoryChapterStore::default()
    }
    /// Every request will sleep for `latency` before touching the shelves
    pub fn with_latency(latency: Duration) -> InMemoryChapterStore {
        InMemoryChapterStore {
            shelves: Mutex::new(Shelves::default()),
            latency: Some(latency),
        }
    }
    pub fn add_novel(&self, novel: NovelRecord) {
        self.shelves.lock().unwrap(/* known good */).novels.insert(novel.novel_id.clone(), novel);
    }
    pub fn add_chapter(&self, chapter: ChapterRecord) {
        self.shelves
            .lock()
            .unwrap(/* known good */)
            .chapters
            .insert(chapter.chapter_id.clone(), chapter);
    }
    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
    /// Neighbor resolution: previous is the greatest `order` strictly less than the current
    /// chapter's, next the least strictly greater, both scoped to the same novel.
    fn neighbors(
        shelves: &Shelves,
        current: &ChapterRecord,
    ) -> (Option<ChapterId>, Option<ChapterId>) {
        let siblings = || {
            shelves
                .chapters
                .values()
                .filter(|ch| ch.novel_id == current.novel_id)
        };
        let prev = siblings()
            .filter(|ch| ch.order < current.order)
            .max_by_key(|ch| ch.order)
            .map(|ch| ch.chapter_id.clone());
        let next = siblings()
            .filter(|ch| ch.order > current.order)
            .min_by_key(|ch| ch.order)
            .map(|ch| ch.chapter_id.clone());
        (prev, next)
    }
}

#[async_trait]
impl ChapterStore for InMemoryChapterStore {
    async fn fetch_chapter(&self, id: &ChapterId) -> Result<ChapterWithNeighbors> {
        self.delay().await;
        let shelves = self.shelves.lock().unwrap(/* known good */);
        let chapter = shelves
            .chapters
            .get(id)
            .cloned()
            .context(ChapterNotFoundSnafu { id: id.clone() })?;
        let (prev_chapter_id, next_chapter_id) = InMemoryChapterStore::neighbors(&shelves, &chapter);
        Ok(ChapterWithNeighbors {
            chapter,
            prev_chapter_id,
            next_chapter_id,
        })
    }
    async fn list_novels(&self) -> Result<Vec<NovelRecord>> {
        self.delay().await;
        let mut novels: Vec<NovelRecord> = self
            .shelves
            .lock()
            .unwrap(/* known good */)
            .novels
            .values()
            .cloned()
            .collect();
        novels.sort_by(|lhs, rhs| lhs.title.cmp(&rhs.title));
        Ok(novels)
    }
    async fn fetch_novel(&self, id: &NovelId) -> Result<NovelRecord> {
        self.delay().await;
        self.shelves
            .lock()
            .unwrap(/* known good */)
            .novels
            .get(id)
            .cloned()
            .context(NovelNotFoundSnafu { id: id.clone() })
    }
    async fn list_chapters(&self, id: &NovelId) -> Result<Vec<ChapterListItem>> {
        self.delay().await;
        let mut items: Vec<ChapterListItem> = self
            .shelves
            .lock()
            .unwrap(/* known good */)
            .chapters
            .values()
            .filter(|ch| &ch.novel_id == id)
            .map(|ch| ChapterListItem {
                chapter_id: ch.chapter_id.clone(),
                title: ch.title.clone(),
                order: ch.order,
            })
            .collect();
        items.sort_by_key(|item| item.order);
        Ok(items)
    }
}
