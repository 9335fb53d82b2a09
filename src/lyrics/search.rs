//! Lyrics lookup
//!
//! Sources are queried with several phrasings of artist and title, since
//! providers index songs inconsistently. The first substantial, timestamped
//! hit wins.

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static TIMESTAMP_PROBE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[0-9]+:[0-9]+[.:][0-9]+\]").expect("timestamp probe regex"));

/// Anything that can turn a free-text query into raw lyric text
pub trait LyricsSearch {
    /// `Ok(None)` means the source has nothing for this query
    fn search(&self, query: &str) -> anyhow::Result<Option<String>>;
}

/// A lookup hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    /// The query variant that produced the hit
    pub query: String,
    /// Raw text as returned by the source
    pub raw: String,
    /// Whether the text carries timestamp tags
    pub synced: bool,
}

/// Query variants, tried in order
pub fn search_queries(artist: &str, title: &str) -> Vec<String> {
    vec![
        format!("{artist} {title}"),
        format!("{title} {artist}"),
        format!("{artist} - {title}"),
        format!("\"{artist}\" \"{title}\""),
        title.to_string(),
        format!("{title} lyrics"),
    ]
}

/// Try each query variant until one yields substantial synced lyrics.
///
/// If no variant does, the first non-empty hit is returned so plain text
/// can still be spaced out by the normalizer.
pub fn find_lyrics<S: LyricsSearch + ?Sized>(
    source: &S,
    artist: &str,
    title: &str,
    min_length: usize,
) -> Option<Found> {
    let mut fallback: Option<Found> = None;

    for (i, query) in search_queries(artist, title).into_iter().enumerate() {
        tracing::debug!(attempt = i + 1, %query, "searching lyrics");

        let raw = match source.search(&query) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(%query, "lyrics query failed: {e:#}");
                continue;
            }
        };

        let synced = TIMESTAMP_PROBE.is_match(&raw);
        if synced && raw.trim().chars().count() > min_length {
            tracing::info!(%query, "found synced lyrics");
            return Some(Found { query, raw, synced });
        }

        if !synced {
            tracing::debug!(%query, "found text without timestamps");
        }
        if fallback.is_none() {
            fallback = Some(Found { query, raw, synced });
        }
    }

    fallback
}

/// A directory of `.lrc` / `.txt` files named after their songs,
/// e.g. `Daft Punk - One More Time.lrc`
#[derive(Debug, Clone)]
pub struct LocalLibrary {
    root: PathBuf,
}

impl LocalLibrary {
    const EXTENSIONS: [&'static str; 2] = ["lrc", "txt"];

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_lyrics_file(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| Self::EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
    }
}

impl LyricsSearch for LocalLibrary {
    fn search(&self, query: &str) -> anyhow::Result<Option<String>> {
        let wanted = match_key(query);
        if wanted.is_empty() {
            return Ok(None);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.root)
            .with_context(|| format!("read dir {}", self.root.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| Self::is_lyrics_file(p))
            .collect();
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if match_key(stem) == wanted {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?;
                return Ok(Some(raw));
            }
        }

        Ok(None)
    }
}

/// Lowercased, quotes and underscores dropped, whitespace collapsed
fn match_key(s: &str) -> String {
    s.to_lowercase()
        .replace(['"', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Replays a fixed answer per attempt and remembers the queries it saw
    struct Scripted {
        answers: Vec<anyhow::Result<Option<String>>>,
        seen: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(answers: Vec<anyhow::Result<Option<String>>>) -> Self {
            Self {
                answers,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl LyricsSearch for Scripted {
        fn search(&self, query: &str) -> anyhow::Result<Option<String>> {
            let mut seen = self.seen.borrow_mut();
            let i = seen.len();
            seen.push(query.to_string());
            match self.answers.get(i) {
                Some(Ok(answer)) => Ok(answer.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{e}")),
                None => Ok(None),
            }
        }
    }

    const SYNCED: &str = "[00:01.00]Is this the real life?\n[00:05.00]Is this just fantasy?";

    #[test]
    fn test_query_variants() {
        assert_eq!(
            search_queries("Queen", "Bohemian Rhapsody"),
            vec![
                "Queen Bohemian Rhapsody",
                "Bohemian Rhapsody Queen",
                "Queen - Bohemian Rhapsody",
                "\"Queen\" \"Bohemian Rhapsody\"",
                "Bohemian Rhapsody",
                "Bohemian Rhapsody lyrics",
            ]
        );
    }

    #[test]
    fn test_errors_and_misses_fall_through() {
        let source = Scripted::new(vec![
            Err(anyhow::anyhow!("provider down")),
            Ok(None),
            Ok(Some("   ".to_string())),
            Ok(Some(SYNCED.to_string())),
        ]);

        let found = find_lyrics(&source, "Queen", "Bohemian Rhapsody", 20).unwrap();
        assert_eq!(found.query, "\"Queen\" \"Bohemian Rhapsody\"");
        assert!(found.synced);
        assert_eq!(source.seen.borrow().len(), 4);
    }

    #[test]
    fn test_short_or_untimed_hits_keep_searching() {
        let source = Scripted::new(vec![
            Ok(Some("plain words only, no timing here at all".to_string())),
            Ok(Some("[00:01.00]short".to_string())),
            Ok(Some(SYNCED.to_string())),
        ]);

        let found = find_lyrics(&source, "Queen", "Bohemian Rhapsody", 20).unwrap();
        assert_eq!(found.query, "Queen - Bohemian Rhapsody");
        assert_eq!(found.raw, SYNCED);
    }

    #[test]
    fn test_first_non_empty_hit_is_fallback() {
        let source = Scripted::new(vec![
            Ok(None),
            Ok(Some("plain words only".to_string())),
            Ok(Some("other plain words".to_string())),
        ]);

        let found = find_lyrics(&source, "Queen", "Bohemian Rhapsody", 20).unwrap();
        assert_eq!(found.query, "Bohemian Rhapsody Queen");
        assert!(!found.synced);
        assert_eq!(source.seen.borrow().len(), 6);
    }

    #[test]
    fn test_nothing_found() {
        let source = Scripted::new(Vec::new());
        assert!(find_lyrics(&source, "a", "b", 0).is_none());
    }

    #[test]
    fn test_local_library_matches_normalized_stems() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Queen - Bohemian Rhapsody.lrc"), SYNCED).unwrap();
        fs::write(dir.path().join("Daft_Punk_Around_the_World.TXT"), "around the world").unwrap();
        fs::write(dir.path().join("notes.md"), "not lyrics").unwrap();

        let library = LocalLibrary::new(dir.path());
        assert_eq!(
            library.search("queen  -  bohemian rhapsody").unwrap().as_deref(),
            Some(SYNCED)
        );
        assert_eq!(
            library.search("\"Daft Punk\" \"Around the World\"").unwrap().as_deref(),
            Some("around the world")
        );
        assert!(library.search("notes").unwrap().is_none());
        assert!(library.search("  ").unwrap().is_none());
    }

    #[test]
    fn test_local_library_through_variants() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Bohemian Rhapsody.lrc"), SYNCED).unwrap();

        let found = find_lyrics(&LocalLibrary::new(dir.path()), "Queen", "Bohemian Rhapsody", 20).unwrap();
        assert_eq!(found.query, "Bohemian Rhapsody");
    }

    #[test]
    fn test_local_library_missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        let library = LocalLibrary::new(dir.path().join("absent"));
        assert_eq!(library.root(), dir.path().join("absent"));
        assert!(!library.root().is_dir());
        assert!(library.search("anything").is_err());
    }
}
