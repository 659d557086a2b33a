//! Domain models for the lyrics catalog
//!
//! This module contains the song record as decoded from the remote endpoint,
//! with the derived values the presentation layer needs.

use serde::{Deserialize, Deserializer, Serialize};

/// Default number of lyric characters shown in list previews.
pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

// =============================================================================
// Song
// =============================================================================

/// A song with its lyrics, as served by the catalog endpoint.
///
/// Immutable once constructed: fields are private and only readable through
/// accessors. `views` is kept as the text the server sent and parsed on
/// demand by [`Song::view_count`].
///
/// Wire and cache format (snake_case keys):
///
/// ```json
/// {"id":"1","title":"A","artist":"X","lyrics":"...","category":"Pop",
///  "views":"5000","created_at":"2024-01-01","updated_at":"2024-01-02"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(deserialize_with = "lenient_text")]
    id: String,
    title: String,
    artist: String,
    #[serde(default)]
    lyrics: String,
    #[serde(default, deserialize_with = "lenient_text")]
    category: String,
    #[serde(default, deserialize_with = "lenient_text")]
    views: String,
    #[serde(default, deserialize_with = "lenient_text")]
    created_at: String,
    #[serde(default, deserialize_with = "lenient_text")]
    updated_at: String,
}

impl Song {
    /// Create a song with empty lyrics, category, views and timestamps
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            lyrics: String::new(),
            category: String::new(),
            views: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.lyrics = lyrics.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_views(mut self, views: impl Into<String>) -> Self {
        self.views = views.into();
        self
    }

    pub fn with_timestamps(
        mut self,
        created_at: impl Into<String>,
        updated_at: impl Into<String>,
    ) -> Self {
        self.created_at = created_at.into();
        self.updated_at = updated_at.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn lyrics(&self) -> &str {
        &self.lyrics
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Raw view count text as sent by the server
    pub fn views(&self) -> &str {
        &self.views
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    /// Numeric view count; non-numeric or absent text counts as 0.
    pub fn view_count(&self) -> i64 {
        self.views.parse().unwrap_or(0)
    }

    /// Compact view count for badges: `999`, `5K`, `12.3K`, `1.3M`.
    ///
    /// Negative counts render as `0`.
    pub fn formatted_views(&self) -> String {
        let views = self.view_count().max(0);

        if views < 1_000 {
            return views.to_string();
        }

        let thousands = round_one_decimal(views as f64 / 1_000.0);
        if thousands < 1_000.0 {
            return compact(thousands, "K");
        }

        compact(round_one_decimal(views as f64 / 1_000_000.0), "M")
    }

    /// First `max_chars` characters of the lyrics followed by `...`.
    pub fn preview_text(&self, max_chars: usize) -> String {
        let preview: String = self.lyrics.chars().take(max_chars).collect();
        format!("{}...", preview)
    }

    /// Text handed to a share sheet.
    pub fn share_text(&self) -> String {
        format!("{} by {}\n\n{}", self.title, self.artist, self.lyrics)
    }

    /// Text placed on the clipboard by "copy lyrics".
    pub fn clipboard_text(&self) -> String {
        format!("{}\nby {}\n\n{}", self.title, self.artist, self.lyrics)
    }

    /// Free-text query used to look the song up on streaming services.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.title, self.artist)
    }

    /// Case-insensitive substring match on title or artist.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.artist.to_lowercase().contains(needle)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn compact(value: f64, suffix: &str) -> String {
    if value.fract() == 0.0 {
        format!("{}{}", value as i64, suffix)
    } else {
        format!("{:.1}{}", value, suffix)
    }
}

/// Accept a JSON string, integer, float or null and keep it as text.
///
/// Endpoints generated from SQL rows are inconsistent about quoting numeric
/// columns; `null` becomes the empty string.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(
        match Option::<TextOrNumber>::deserialize(deserializer)? {
            Some(TextOrNumber::Text(text)) => text,
            Some(TextOrNumber::Integer(n)) => n.to_string(),
            Some(TextOrNumber::Float(n)) => n.to_string(),
            None => String::new(),
        },
    )
}

// =============================================================================
// Tests
// =============================================================================
