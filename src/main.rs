use anyhow::Context;
use clap::{Parser, Subcommand};
use melophile::config::{self, Config};
use melophile::lyrics::{self, LocalLibrary, OutputShape, Session, TimedLyricLine};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "melophile",
    version,
    about = "Convert LRC lyric transcripts into timed JSON for the player"
)]
struct Cli {
    /// Override config file path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    /// Leave out the `timestamp` field (`{time, lyrics}` only).
    #[arg(long, global = true)]
    simple: bool,

    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert LRC or plain text (file or stdin) to JSON.
    Convert { file: Option<PathBuf> },
    /// Report whether the input is already normalized JSON.
    Check { file: Option<PathBuf> },
    /// Pass normalized JSON through unchanged, convert anything else.
    Format { file: Option<PathBuf> },
    /// Look up one song in the lyrics library.
    Find {
        #[arg(long)]
        artist: String,
        #[arg(long)]
        title: String,
        /// Library directory (defaults to the configured one).
        #[arg(long)]
        library: Option<PathBuf>,
    },
    /// Look up every `Artist - Title` line of the input.
    Batch {
        file: Option<PathBuf>,
        #[arg(long)]
        library: Option<PathBuf>,
    },
    /// Set the lyrics library directory in the config.
    Library { dir: PathBuf },
}

struct Output {
    shape: OutputShape,
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .init();

    // Pure conversions must work even where the config dir is read-only.
    let cfg = match cli.command {
        Command::Convert { .. } | Command::Check { .. } | Command::Format { .. } => {
            config::load_or_default(cli.config.as_deref()).context("read config")?
        }
        _ => config::load(cli.config.as_deref()).context("load config")?,
    };
    let out = Output {
        shape: if cli.simple || !cfg.output.include_timestamp {
            OutputShape::Simple
        } else {
            OutputShape::Full
        },
        pretty: cli.pretty || cfg.output.pretty,
    };

    match cli.command {
        Command::Convert { file } => {
            let raw = read_input(file.as_deref())?;
            let lines = lyrics::normalize(&raw);
            if lines.is_empty() {
                tracing::warn!("no usable lyric lines found");
            }
            println!("{}", lyrics::render(&lines, out.shape, out.pretty)?);
        }
        Command::Check { file } => {
            let raw = read_input(file.as_deref())?;
            println!("{}", lyrics::is_already_normalized(&raw));
        }
        Command::Format { file } => {
            let raw = read_input(file.as_deref())?;
            println!("{}", lyrics::formatted_lyrics(Some(&raw), out.shape)?);
        }
        Command::Find {
            artist,
            title,
            library,
        } => {
            let library = open_library(library, &cfg)?;
            let mut session = Session::default();
            match lyrics::fetch_lyrics(&library, &artist, &title, cfg.search.min_length, &mut session) {
                Some(lines) => {
                    print_preview(&lines, cfg.search.preview_lines);
                    println!("{}", lyrics::render(&lines, out.shape, out.pretty)?);
                }
                None => println!(
                    "No synced lyrics found for {artist} - {title}. Check the spelling or try a different song."
                ),
            }
        }
        Command::Batch { file, library } => {
            let library = open_library(library, &cfg)?;
            let songs = lyrics::session::parse_song_list(&read_input(file.as_deref())?);
            let mut session = Session::default();

            for (i, (artist, title)) in songs.iter().enumerate() {
                tracing::info!("[{}/{}] {artist} - {title}", i + 1, songs.len());
                if let Some(lines) =
                    lyrics::fetch_lyrics(&library, artist, title, cfg.search.min_length, &mut session)
                {
                    println!("--- {artist} - {title} ---");
                    println!("{}", lyrics::render(&lines, out.shape, out.pretty)?);
                }
            }

            print!("{session}");
        }
        Command::Library { dir } => {
            let mut cfg = cfg;
            cfg.paths.library_dir = dir;
            config::save(&cfg, cli.config.as_deref()).context("save config")?;
            println!("Updated lyrics library directory in config.");
        }
    }

    Ok(())
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("read {}", p.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("read stdin")?;
            Ok(raw)
        }
    }
}

fn open_library(dir: Option<PathBuf>, cfg: &Config) -> anyhow::Result<LocalLibrary> {
    let library = LocalLibrary::new(dir.unwrap_or_else(|| cfg.paths.library_dir.clone()));
    anyhow::ensure!(
        library.root().is_dir(),
        "lyrics library {} does not exist (set it with `melophile library <DIR>`)",
        library.root().display()
    );
    Ok(library)
}

fn print_preview(lines: &[TimedLyricLine], count: usize) {
    if let Some(span) = lyrics::session::span(lines) {
        println!("{} lyric lines, {span}", lines.len());
    }
    for line in lines.iter().take(count) {
        println!("   [{}] {}", line.time, line.lyrics);
    }
    if lines.len() > count {
        println!("   ... and {} more lines", lines.len() - count);
    }
}
