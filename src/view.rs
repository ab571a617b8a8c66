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

//! # the reader view
//!
//! A purely presentational projection of the session state, for whatever UI sits on top
//! (terminal, WASM frontend, ...). The contract worth stating: when a neighbor doesn't exist,
//! the corresponding affordance is *disabled*-- `can_go_prev`/`can_go_next` false-- not merely
//! inert, and the error screen always offers retry. Rendering & styling are someone else's
//! problem.

use std::sync::Arc;

use crate::{
    entities::{ChapterId, ChapterWithNeighbors},
    session::{NavState, ReadingSession},
};

/// What the reader should be shown right now
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReaderView {
    /// Nothing requested yet
    Empty,
    /// A spinner, with the chapter being fetched
    Loading { target: ChapterId },
    /// The reading surface proper
    Reading {
        chapter: Arc<ChapterWithNeighbors>,
        can_go_prev: bool,
        can_go_next: bool,
        font_size: u32,
    },
    /// The failure screen; retry is always offered here
    Error { message: String },
}

impl ReaderView {
    /// Project a [NavState] (plus the display preferences) into a view
    pub fn project(state: &NavState, font_size: u32) -> ReaderView {
        match state {
            NavState::Idle => ReaderView::Empty,
            NavState::Loading { target } => ReaderView::Loading {
                target: target.clone(),
            },
            NavState::Ready { chapter } => ReaderView::Reading {
                can_go_prev: chapter.prev_chapter_id.is_some(),
                can_go_next: chapter.next_chapter_id.is_some(),
                chapter: chapter.clone(),
                font_size,
            },
            NavState::Error { message, .. } => ReaderView::Error {
                message: message.clone(),
            },
        }
    }
    pub fn can_retry(&self) -> bool {
        matches!(self, ReaderView::Error { .. })
    }
}

impl ReadingSession {
    /// The view for the session's current state
    pub fn view(&self) -> ReaderView {
        ReaderView::project(&self.state(), self.font_size())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::entities::{ChapterRecord, NovelId};

    fn chapter(prev: Option<u64>, next: Option<u64>) -> Arc<ChapterWithNeighbors> {
        Arc::new(ChapterWithNeighbors {
            chapter: ChapterRecord::new(
                ChapterId::from(2),
                NovelId::new("n1").unwrap(),
                "Second",
                "body",
                2,
            ),
            prev_chapter_id: prev.map(ChapterId::from),
            next_chapter_id: next.map(ChapterId::from),
        })
    }

    #[test]
    fn affordances_follow_the_neighbors() {
        match ReaderView::project(
            &NavState::Ready {
                chapter: chapter(Some(1), Some(3)),
            },
            18,
        ) {
            ReaderView::Reading {
                can_go_prev,
                can_go_next,
                font_size,
                ..
            } => {
                assert!(can_go_prev);
                assert!(can_go_next);
                assert_eq!(font_size, 18);
            }
            view => panic!("expected Reading, got {view:?}"),
        }

        // First chapter: back is disabled, not merely inert.
        match ReaderView::project(
            &NavState::Ready {
                chapter: chapter(None, Some(3)),
            },
            18,
        ) {
            ReaderView::Reading {
                can_go_prev,
                can_go_next,
                ..
            } => {
                assert!(!can_go_prev);
                assert!(can_go_next);
            }
            view => panic!("expected Reading, got {view:?}"),
        }
    }

    #[test]
    fn error_always_offers_retry() {
        let view = ReaderView::project(
            &NavState::Error {
                target: ChapterId::from(99),
                message: "Chapter not found".to_owned(),
            },
            18,
        );
        assert!(view.can_retry());
        assert_eq!(
            view,
            ReaderView::Error {
                message: "Chapter not found".to_owned()
            }
        );
    }

    #[test]
    fn idle_and_loading() {
        assert_eq!(ReaderView::project(&NavState::Idle, 18), ReaderView::Empty);
        assert_eq!(
            ReaderView::project(
                &NavState::Loading {
                    target: ChapterId::from(2)
                },
                18
            ),
            ReaderView::Loading {
                target: ChapterId::from(2)
            }
        );
    }
}
