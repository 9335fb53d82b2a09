//! Converts LRC lyric transcripts into timed JSON lines for a media player.

pub mod config;
pub mod lyrics;
