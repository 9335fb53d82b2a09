//! Per-run lookup statistics

use super::TimedLyricLine;
use std::fmt;

/// Outcome of one song lookup
#[derive(Debug, Clone, PartialEq)]
pub struct SongRecord {
    pub artist: String,
    pub title: String,
    pub success: bool,
    pub lines: Option<usize>,
    pub query: Option<String>,
    /// First and last display time, e.g. "0:12 → 3:41"
    pub span: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub total_searched: usize,
    pub successful: usize,
    pub failed: usize,
    pub songs: Vec<SongRecord>,
}

impl Session {
    pub fn record_success(&mut self, artist: &str, title: &str, query: &str, lines: &[TimedLyricLine]) {
        self.total_searched += 1;
        self.successful += 1;
        self.songs.push(SongRecord {
            artist: artist.to_string(),
            title: title.to_string(),
            success: true,
            lines: Some(lines.len()),
            query: Some(query.to_string()),
            span: span(lines),
            reason: None,
        });
    }

    pub fn record_failure(&mut self, artist: &str, title: &str, reason: &str) {
        self.total_searched += 1;
        self.failed += 1;
        self.songs.push(SongRecord {
            artist: artist.to_string(),
            title: title.to_string(),
            success: false,
            lines: None,
            query: None,
            span: None,
            reason: Some(reason.to_string()),
        });
    }

    /// Percentage of searches that produced lyrics, `None` before any search
    pub fn success_rate(&self) -> Option<f64> {
        (self.total_searched > 0)
            .then(|| self.successful as f64 / self.total_searched as f64 * 100.0)
    }
}

/// "first → last" display times of a non-empty sequence
pub fn span(lines: &[TimedLyricLine]) -> Option<String> {
    let first = lines.first()?;
    let last = lines.last()?;
    Some(format!("{} → {}", first.time, last.time))
}

/// Parse `Artist - Title` lines, skipping blanks.
///
/// Malformed lines are reported and left out.
pub fn parse_song_list(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.split_once(" - ") {
            Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
                Some((artist.trim().to_string(), title.trim().to_string()))
            }
            _ => {
                tracing::warn!(%line, "invalid song line, expected `Artist - Title`");
                None
            }
        })
        .collect()
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session statistics")?;
        writeln!(f, "Total searches: {}", self.total_searched)?;
        writeln!(f, "Successful: {}", self.successful)?;
        writeln!(f, "Failed: {}", self.failed)?;
        if let Some(rate) = self.success_rate() {
            writeln!(f, "Success rate: {rate:.1}%")?;
        }

        for song in &self.songs {
            let mark = if song.success { "ok" } else { "failed" };
            writeln!(f, "  [{mark}] {} - {}", song.artist, song.title)?;
            match (&song.lines, &song.span, &song.reason) {
                (Some(n), Some(span), _) => writeln!(f, "     Lines: {n} ({span})")?,
                (_, _, Some(reason)) => writeln!(f, "     {reason}")?,
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::normalize;

    #[test]
    fn test_success_rate() {
        let mut session = Session::default();
        assert_eq!(session.success_rate(), None);

        let lines = normalize("[00:12.00]a\n[03:41.00]b");
        session.record_success("A", "One", "A One", &lines);
        session.record_failure("B", "Two", "No synced lyrics found");
        session.record_success("C", "Three", "Three", &lines);
        session.record_failure("D", "Four", "No synced lyrics found");

        assert_eq!(session.total_searched, 4);
        assert_eq!(session.success_rate(), Some(50.0));
        assert_eq!(session.songs[0].span.as_deref(), Some("0:12 → 3:41"));
    }

    #[test]
    fn test_display_summary() {
        let mut session = Session::default();
        session.record_success("A", "One", "A One", &normalize("[00:01.00]x"));
        session.record_failure("B", "Two", "No synced lyrics found");

        let text = session.to_string();
        assert!(text.contains("Total searches: 2"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("[ok] A - One"));
        assert!(text.contains("Lines: 1 (0:01 → 0:01)"));
        assert!(text.contains("[failed] B - Two"));
    }

    #[test]
    fn test_parse_song_list() {
        let songs = parse_song_list(
            "The Weeknd - Blinding Lights\n\nno separator\n - missing artist\nAC/DC - T.N.T. - Live\n",
        );
        assert_eq!(
            songs,
            vec![
                ("The Weeknd".to_string(), "Blinding Lights".to_string()),
                ("AC/DC".to_string(), "T.N.T. - Live".to_string()),
            ]
        );
    }

    #[test]
    fn test_span_empty() {
        assert_eq!(span(&[]), None);
    }
}
