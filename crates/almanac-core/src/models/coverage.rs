//! Coverage model and the genre wire-format boundary.
//!
//! The backend stores a coverage's genre as a list holding a single entry,
//! while everything in this crate works with the scalar. The two functions
//! [`genre_from_wire`] and [`genre_to_wire`] are the only place the two
//! forms meet, and they are only invoked from serde.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::QCode;

/// Genre of a planned piece of content (e.g. "Article", "Sidebar").
pub type Genre = QCode;

/// One planned piece of content production, owned by a planning item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Coverage {
    /// Absent until the backend has persisted the coverage
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Back-reference to the owning planning item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_item: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_coverage_status: Option<QCode>,

    #[serde(default)]
    pub planning: CoveragePlanning,

    /// Fields this crate does not model, kept so that a read-edit-save
    /// cycle writes them back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scheduling details of a coverage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoveragePlanning {
    /// When the content is due. Parsed into an instant so that two
    /// encodings of the same moment compare equal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<Timestamp>,

    #[serde(
        default,
        with = "genre_wire",
        skip_serializing_if = "Option::is_none"
    )]
    pub genre: Option<Genre>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slugline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ednote: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g2_content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Coverage {
    /// Convenience constructor for an unsaved coverage.
    pub fn scheduled_at(scheduled: Timestamp) -> Self {
        Self {
            planning: CoveragePlanning {
                scheduled: Some(scheduled),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// Reads the wire list form of a genre, keeping the first entry.
pub fn genre_from_wire(genres: Vec<Genre>) -> Option<Genre> {
    genres.into_iter().next()
}

/// Produces the wire list form of a genre.
pub fn genre_to_wire(genre: Option<&Genre>) -> Vec<Genre> {
    genre.cloned().into_iter().collect()
}

mod genre_wire {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Genre, genre_from_wire, genre_to_wire};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireGenre {
        List(Vec<Genre>),
        Single(Genre),
    }

    pub fn serialize<S>(genre: &Option<Genre>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        genre_to_wire(genre.as_ref()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Genre>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<WireGenre>::deserialize(deserializer)? {
            Some(WireGenre::List(list)) => genre_from_wire(list),
            Some(WireGenre::Single(genre)) => Some(genre),
            None => None,
        })
    }
}
