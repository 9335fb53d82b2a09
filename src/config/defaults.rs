use super::Config;
use std::path::PathBuf;

pub const MIN_LENGTH: usize = 50;
pub const PREVIEW_LINES: usize = 3;

pub fn defaults() -> Config {
    Config::default()
}

pub fn library_dir() -> PathBuf {
    super::project_dirs()
        .map(|p| p.data_dir().join("lyrics"))
        .unwrap_or_else(|| std::env::temp_dir().join("melophile").join("lyrics"))
}
