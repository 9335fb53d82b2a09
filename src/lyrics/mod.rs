//! Lyrics module for turning raw transcripts into player-ready timed lines
//!
//! This module provides:
//! - LRC normalizer shared by every caller
//! - Query-variant lookup over any lyrics source
//! - Output shaping for storage and display

pub mod parser;
pub mod search;
pub mod session;

pub use parser::{TimedLyricLine, is_already_normalized, normalize};
pub use search::{LocalLibrary, LyricsSearch, find_lyrics};
pub use session::Session;

use serde::Serialize;

/// Which fields each line carries when written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputShape {
    /// `{time, timestamp, lyrics}`, `timestamp` only for tagged lines
    #[default]
    Full,
    /// `{time, lyrics}`
    Simple,
}

#[derive(Serialize)]
struct SimpleLine<'a> {
    time: &'a str,
    lyrics: &'a str,
}

/// Serialize lines to JSON in the requested shape
pub fn render(lines: &[TimedLyricLine], shape: OutputShape, pretty: bool) -> anyhow::Result<String> {
    let out = match shape {
        OutputShape::Full => encode(lines, pretty)?,
        OutputShape::Simple => {
            let simple: Vec<SimpleLine<'_>> = lines
                .iter()
                .map(|l| SimpleLine {
                    time: &l.time,
                    lyrics: &l.lyrics,
                })
                .collect();
            encode(&simple, pretty)?
        }
    };
    Ok(out)
}

fn encode<T: Serialize + ?Sized>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Lyrics as the player expects them, from whatever was stored for a song.
///
/// Stored text that already looks normalized is returned untouched.
pub fn formatted_lyrics(stored: Option<&str>, shape: OutputShape) -> anyhow::Result<String> {
    let Some(stored) = stored.filter(|s| !s.is_empty()) else {
        return Ok("[]".to_string());
    };

    if is_already_normalized(stored) {
        return Ok(stored.to_string());
    }

    render(&normalize(stored), shape, false)
}

/// Look up lyrics for a song and normalize them, recording the outcome.
pub fn fetch_lyrics<S: LyricsSearch + ?Sized>(
    source: &S,
    artist: &str,
    title: &str,
    min_length: usize,
    session: &mut Session,
) -> Option<Vec<TimedLyricLine>> {
    let Some(found) = find_lyrics(source, artist, title, min_length) else {
        session.record_failure(artist, title, "No synced lyrics found");
        return None;
    };

    tracing::debug!(chars = found.raw.len(), synced = found.synced, "raw lyrics");

    let lines = normalize(&found.raw);
    if lines.is_empty() {
        session.record_failure(artist, title, "No usable lines after conversion");
        return None;
    }

    session.record_success(artist, title, &found.query, &lines);
    Some(lines)
}
