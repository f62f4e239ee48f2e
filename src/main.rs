use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use maestro::config::Settings;
use maestro::integrity;
use maestro::library::{FsLibrarySource, LibrarySource};

/// Scan the music directory and verify every file in it, printing one line
/// per corrupt file. Exits non-zero when anything failed verification.
fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load()?;
    settings.validate()?;

    let music_dir = match env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => settings
            .library
            .resolve_music_dir()
            .ok_or("no music directory given and $HOME is unset")?,
    };

    let source = FsLibrarySource::new(music_dir.clone(), settings.library.clone());
    let library = source.load()?;
    tracing::info!(
        dir = %music_dir.display(),
        albums = library.albums.len(),
        "scanned library"
    );

    let mut checked = 0usize;
    let mut corrupt = 0usize;
    for album in &library.albums {
        for song in &album.songs {
            checked += 1;
            if let Err(err) = integrity::check_file(&music_dir.join(&song.uri)) {
                corrupt += 1;
                println!("{}: {err}", song.uri);
            }
        }
    }
    println!("{checked} files checked, {corrupt} corrupt");

    Ok(if corrupt == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
