//! LRC normalizer
//!
//! Converts LRC transcripts into a sorted, deduplicated list of timed lines:
//! [mm:ss.xx] Lyrics line here
//! [mm:ss:xxx] Lyrics line here
//! [mm:ss] Lyrics line here
//!
//! Text without a single timestamp tag is spaced out evenly instead.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Seconds between consecutive lines of untimed text
pub const FALLBACK_STEP_SECS: u64 = 3;

/// Track metadata such as [ar:Artist] or [offset:+250]
static METADATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\[[a-z]{2,6}:.*\]$").expect("metadata regex"));

/// Most specific first: dotted fraction, colon fraction, whole seconds.
static TIMESTAMP_RES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        r"^\[(?P<min>[0-9]+):(?P<sec>[0-9]+)\.(?P<frac>[0-9]{2,3})\]\s*(?P<text>.+)$",
        r"^\[(?P<min>[0-9]+):(?P<sec>[0-9]+):(?P<frac>[0-9]{2,3})\]\s*(?P<text>.+)$",
        r"^\[(?P<min>[0-9]+):(?P<sec>[0-9]+)\]\s*(?P<text>.+)$",
    ]
    .map(|pattern| Regex::new(pattern).expect("timestamp regex"))
});

/// A single lyric line ready for the player
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "StoredLine")]
pub struct TimedLyricLine {
    /// Display time, "M:SS"
    pub time: String,
    /// Seconds from track start, rounded to 2 decimals
    pub timestamp: f64,
    /// The lyrics text
    pub lyrics: String,
    /// Whether the time came from a real LRC tag rather than even spacing
    pub synced: bool,
}

impl TimedLyricLine {
    fn tagged(stamp: Stamp, lyrics: &str) -> Self {
        Self {
            time: display_time(stamp.minutes, stamp.seconds),
            timestamp: stamp.secs,
            lyrics: lyrics.to_string(),
            synced: true,
        }
    }

    fn spaced(offset_secs: u64, lyrics: &str) -> Self {
        Self {
            time: display_time(offset_secs / 60, offset_secs % 60),
            timestamp: offset_secs as f64,
            lyrics: lyrics.to_string(),
            synced: false,
        }
    }
}

// `timestamp` is only written for lines timed by a real tag.
impl Serialize for TimedLyricLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.synced { 3 } else { 2 };
        let mut state = serializer.serialize_struct("TimedLyricLine", len)?;
        state.serialize_field("time", &self.time)?;
        if self.synced {
            state.serialize_field("timestamp", &self.timestamp)?;
        } else {
            state.skip_field("timestamp")?;
        }
        state.serialize_field("lyrics", &self.lyrics)?;
        state.end()
    }
}

/// Either stored shape: `{time, timestamp, lyrics}` or `{time, lyrics}`
#[derive(Debug, Deserialize)]
struct StoredLine {
    time: String,
    #[serde(default)]
    timestamp: Option<f64>,
    lyrics: String,
}

impl From<StoredLine> for TimedLyricLine {
    fn from(line: StoredLine) -> Self {
        match line.timestamp {
            Some(ts) => Self {
                time: line.time,
                timestamp: round2(ts),
                lyrics: line.lyrics,
                synced: true,
            },
            None => Self {
                timestamp: seconds_from_display(&line.time).unwrap_or(0) as f64,
                time: line.time,
                lyrics: line.lyrics,
                synced: false,
            },
        }
    }
}

/// Parsed contents of one timestamp tag
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stamp {
    minutes: u64,
    seconds: u64,
    /// Already rounded to hundredths
    secs: f64,
}

/// Convert raw lyric text into timed lines, sorted and deduplicated.
///
/// Never fails: unrecognised lines are dropped. When no line carries a
/// timestamp tag, every plain line is placed `FALLBACK_STEP_SECS` apart
/// starting at zero.
pub fn normalize(raw: &str) -> Vec<TimedLyricLine> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut timed = Vec::new();
    let mut plain = Vec::new();
    let mut tags_seen = 0usize;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || is_metadata(line) {
            continue;
        }

        match parse_timed_line(line) {
            Some((stamp, text)) => {
                tags_seen += 1;
                if is_lyric(text) {
                    timed.push(TimedLyricLine::tagged(stamp, text));
                }
            }
            None => plain.push(line),
        }
    }

    let mut lines = if tags_seen > 0 {
        timed
    } else {
        space_evenly(&plain)
    };

    // Stable, so the earliest source line wins among equal timestamps.
    lines.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    lines.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);

    tracing::debug!(
        tags = tags_seen,
        plain = plain.len(),
        kept = lines.len(),
        "converted lyrics"
    );

    lines
}

/// Cheap probe for text that is already a normalized JSON array.
///
/// Only the first element is inspected; this is not a schema check.
pub fn is_already_normalized(raw: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| {
            v.as_array()?
                .first()?
                .as_object()
                .map(|first| first.contains_key("time"))
        })
        .unwrap_or(false)
}

fn is_metadata(line: &str) -> bool {
    METADATA_RE.is_match(line)
}

/// Match a line against the timestamp tags, most specific first
fn parse_timed_line(line: &str) -> Option<(Stamp, &str)> {
    let caps = TIMESTAMP_RES.iter().find_map(|re| re.captures(line))?;

    let minutes: u64 = caps["min"].parse().ok()?;
    let seconds: u64 = caps["sec"].parse().ok()?;
    let fraction = match caps.name("frac").map(|m| m.as_str()) {
        Some(frac) if frac.len() == 2 => frac.parse::<u64>().ok()? as f64 / 100.0,
        Some(frac) => frac.parse::<u64>().ok()? as f64 / 1000.0,
        None => 0.0,
    };

    let whole = minutes.checked_mul(60)?.checked_add(seconds)?;
    let secs = round2(whole as f64 + fraction);

    let text = caps.name("text").map_or("", |m| m.as_str()).trim();
    Some((
        Stamp {
            minutes,
            seconds,
            secs,
        },
        text,
    ))
}

fn space_evenly(plain: &[&str]) -> Vec<TimedLyricLine> {
    plain
        .iter()
        .filter(|line| is_lyric(line))
        .enumerate()
        .map(|(i, line)| TimedLyricLine::spaced(i as u64 * FALLBACK_STEP_SECS, line))
        .collect()
}

fn is_lyric(text: &str) -> bool {
    !text.is_empty() && !text.starts_with('[') && !is_filler(text)
}

/// Placeholders that exporters put where there is nothing to sing
fn is_filler(text: &str) -> bool {
    let lower = text.to_lowercase();
    matches!(lower.as_str(), "..." | "…" | "instrumental")
        || text
            .chars()
            .all(|c| matches!(c, '♪' | '♫' | '♬' | '♩') || c.is_whitespace())
}

/// Nearest hundredth of the exact binary value, ties to even
fn round2(secs: f64) -> f64 {
    format!("{secs:.2}").parse().unwrap_or(secs)
}

fn display_time(minutes: u64, seconds: u64) -> String {
    format!("{}:{:02}", minutes, seconds)
}

fn seconds_from_display(time: &str) -> Option<u64> {
    let (min, sec) = time.split_once(':')?;
    let min: u64 = min.trim().parse().ok()?;
    let sec: u64 = sec.trim().parse().ok()?;
    min.checked_mul(60)?.checked_add(sec)
}
