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

//! # shiori models
//!
//! A grab-bag module of domain types is never my first choice, but every other module in the
//! crate traffics in these, so one home for them beats a circular tangle of imports.
//!
//! A word on identifiers: the site's document store keeps chapter & novel identifiers sometimes
//! as strings, sometimes as numbers, depending on who seeded the collection. Mixing the two is a
//! reliable source of key-mismatch bugs (a cache keyed by `"12"` will miss a lookup for `12`), so
//! [ChapterId] and [NovelId] below normalize to a single canonical string form, exactly once, at
//! construction/deserialization. Everything downstream-- the cache, the in-flight set, the
//! bookmark store-- keys off the canonical form.

use std::{fmt::Display, ops::Deref, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use snafu::{prelude::*, Backtrace};
use unicode_segmentation::UnicodeSegmentation;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{text:?} is not a valid chapter identifier"))]
    BadChapterId { text: String, backtrace: Backtrace },
    #[snafu(display("{text:?} is not a valid novel identifier"))]
    BadNovelId { text: String, backtrace: Backtrace },
}

type Result<T> = std::result::Result<T, Error>;

type StdResult<T, E> = std::result::Result<T, E>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          Identifiers                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// identifier!
///
/// Declare a refined newtype over [String] intended to be used as an opaque, canonical
/// identifier for some other sort of entity.
///
/// The canonical form is the trimmed textual representation; the empty string is rejected.
/// `Deserialize` is implemented by hand so that a JSON integer and a JSON string denoting the
/// same identifier deserialize to *equal* values-- this is where the string-versus-number
/// normalization happens, and it happens exactly once.
// Writing refined types in Rust involves a *lot* of boilerplate; the macro at least keeps me from
// writing it twice.
macro_rules! define_id {
    ($type_name:ident, $selector:ident, $expecting:literal) => {
        #[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $type_name(String);

        impl $type_name {
            /// Construct an identifier from its textual representation; leading & trailing
            /// whitespace is dropped, and the empty string is rejected.
            pub fn new(text: &str) -> Result<$type_name> {
                let text = text.trim();
                if text.is_empty() {
                    $selector {
                        text: text.to_owned(),
                    }
                    .fail()
                } else {
                    Ok($type_name(text.to_owned()))
                }
            }
        }

        impl AsRef<str> for $type_name {
            fn as_ref(&self) -> &str {
                self.deref()
            }
        }

        impl Deref for $type_name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $type_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $type_name {
            fn from(n: u64) -> Self {
                $type_name(n.to_string())
            }
        }

        impl FromStr for $type_name {
            type Err = Error;

            fn from_str(s: &str) -> StdResult<Self, Self::Err> {
                $type_name::new(s)
            }
        }

        impl TryFrom<String> for $type_name {
            type Error = Error;

            fn try_from(text: String) -> StdResult<Self, Self::Error> {
                $type_name::new(&text)
            }
        }

        // Implemented by hand to accept *either* a JSON string or a JSON integer; the document
        // store has both in the wild.
        impl<'de> Deserialize<'de> for $type_name {
            fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                struct IdVisitor;

                impl serde::de::Visitor<'_> for IdVisitor {
                    type Value = $type_name;

                    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                        write!(f, $expecting)
                    }

                    fn visit_str<E: serde::de::Error>(self, v: &str) -> StdResult<Self::Value, E> {
                        $type_name::new(v).map_err(|err| E::custom(format!("{err}")))
                    }

                    fn visit_u64<E: serde::de::Error>(self, v: u64) -> StdResult<Self::Value, E> {
                        Ok($type_name::from(v))
                    }

                    fn visit_i64<E: serde::de::Error>(self, v: i64) -> StdResult<Self::Value, E> {
                        Ok($type_name(v.to_string()))
                    }
                }

                deserializer.deserialize_any(IdVisitor)
            }
        }
    };
}

define_id!(ChapterId, BadChapterIdSnafu, "a chapter identifier (string or integer)");
define_id!(NovelId, BadNovelIdSnafu, "a novel identifier (string or integer)");

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            Chapters                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A single ordered unit of novel content, belonging to exactly one novel
///
/// `order` establishes reading order within the novel: strictly increasing & unique per novel.
/// It is the *only* field authoritative for neighbor computation-- never identifier magnitude.
/// The word & character counts are derived, informational-only fields. A [ChapterRecord] is
/// immutable once fetched for the lifetime of a reading session.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChapterRecord {
    pub chapter_id: ChapterId,
    pub novel_id: NovelId,
    pub title: String,
    pub content: String,
    pub order: i64,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub character_count: u64,
}

impl ChapterRecord {
    /// Build a record, deriving the word & character counts from the body text
    pub fn new(
        chapter_id: ChapterId,
        novel_id: NovelId,
        title: &str,
        content: &str,
        order: i64,
    ) -> ChapterRecord {
        ChapterRecord {
            chapter_id,
            novel_id,
            title: title.to_owned(),
            word_count: content.unicode_words().count() as u64,
            character_count: content.chars().count() as u64,
            content: content.to_owned(),
            order,
        }
    }
}

/// Direction of a sequential navigation request
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Prev,
    Next,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Prev => write!(f, "previous"),
            Direction::Next => write!(f, "next"),
        }
    }
}

/// A [ChapterRecord] together with the identifiers of its immediate neighbors
///
/// The neighbor identifiers are derived by the chapter store from the `order` field within the
/// same novel, projecting only the identifier (not full content). `None` marks the two
/// boundaries: the first chapter has no `prev_chapter_id`, the last no `next_chapter_id`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChapterWithNeighbors {
    #[serde(flatten)]
    pub chapter: ChapterRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_chapter_id: Option<ChapterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_chapter_id: Option<ChapterId>,
}

impl ChapterWithNeighbors {
    pub fn id(&self) -> &ChapterId {
        &self.chapter.chapter_id
    }
    pub fn neighbor(&self, direction: Direction) -> Option<&ChapterId> {
        match direction {
            Direction::Prev => self.prev_chapter_id.as_ref(),
            Direction::Next => self.next_chapter_id.as_ref(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                             Novels                                             //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Publication status of a novel
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NovelStatus {
    Ongoing,
    Completed,
    Dropped,
    Hiatus,
}

/// A novel as presented on the site's landing & detail pages
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NovelRecord {
    pub novel_id: NovelId,
    pub title: String,
    pub author: String,
    pub status: NovelStatus,
    pub total_chapters: u32,
    pub description: String,
}

/// One row of a novel's chapter list: identifier, title & order-- no body text
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChapterListItem {
    pub chapter_id: ChapterId,
    pub title: String,
    pub order: i64,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            Bookmarks                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The persisted record of the last chapter read for a given novel
///
/// Used to offer "continue reading". At most one per novel; saving again simply replaces it (the
/// timestamp is taken at save time).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bookmark {
    pub novel_id: NovelId,
    pub chapter_id: ChapterId,
    pub chapter_title: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn chapter_id_normalization() {
        // A JSON integer & a JSON string denoting the same identifier must compare equal once
        // deserialized.
        let from_num: ChapterId = serde_json::from_str("12").unwrap();
        let from_str: ChapterId = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(from_num, from_str);

        assert_eq!(ChapterId::new(" 12 ").unwrap(), ChapterId::from(12u64));
        assert!(ChapterId::new("").is_err());
        assert!(ChapterId::new("   ").is_err());
        assert!("7".parse::<ChapterId>().is_ok());
    }

    #[test]
    fn derived_counts() {
        let rec = ChapterRecord::new(
            ChapterId::new("1").unwrap(),
            NovelId::new("n").unwrap(),
            "First",
            "It was a dark and stormy night.",
            1,
        );
        assert_eq!(rec.word_count, 7);
        assert_eq!(rec.character_count, 31);
    }

    #[test]
    fn neighbors_deserialize_from_the_wire_shape() {
        // The API flattens the record & tacks-on the neighbor ids; boundaries simply omit them.
        let json = r#"{
            "chapter_id": 2,
            "novel_id": "n1",
            "title": "Second",
            "content": "...",
            "order": 2,
            "word_count": 1,
            "character_count": 3,
            "prev_chapter_id": "1",
            "next_chapter_id": 3
        }"#;
        let ch: ChapterWithNeighbors = serde_json::from_str(json).unwrap();
        assert_eq!(ch.id(), &ChapterId::from(2));
        assert_eq!(ch.neighbor(Direction::Prev), Some(&ChapterId::from(1)));
        assert_eq!(ch.neighbor(Direction::Next), Some(&ChapterId::from(3)));

        let json = r#"{ "chapter_id": 1, "novel_id": "n1", "title": "First", "content": "...",
                        "order": 1, "next_chapter_id": 2 }"#;
        let ch: ChapterWithNeighbors = serde_json::from_str(json).unwrap();
        assert_eq!(ch.neighbor(Direction::Prev), None);
        assert_eq!(ch.neighbor(Direction::Next), Some(&ChapterId::from(2)));
    }
}
