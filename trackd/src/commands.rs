use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use mpvipc::{Client, MpvTracks, Property};
use selector::{read_tracks, select_tracks_on_load, SavedSelection, TrackHost, TrackKind};
use serde_json::Value;

use crate::{config, store};

async fn connect(socket: &Path) -> anyhow::Result<Client> {
    // NOTE: events are not needed here, dropping them lets the ipc task discard them
    let (client, _) = mpvipc::connect(socket)
        .await
        .with_context(|| format!("connecting to mpv at {:?}", socket))?;
    Ok(client)
}

async fn current_path(client: &Client) -> anyhow::Result<String> {
    match client
        .get_property(&Property::Path)
        .await
        .context("asking mpv for the current file")?
    {
        Value::String(path) => Ok(path),
        v => anyhow::bail!("mpv has a weird path: {}", v),
    }
}

/// Runs the automatic selection once on what mpv is playing now.
pub async fn select(socket: &Path, path: Option<String>) -> anyhow::Result<()> {
    let client = connect(socket).await?;
    let path = match path {
        Some(p) => p,
        None => current_path(&client).await?,
    };

    let store_file = config::store_file()?;
    let saved = store::read_store(&store_file)
        .with_context(|| format!("reading the saved selections at {:?}", store_file))?
        .get(&path);

    let mut host = MpvTracks::new(client);
    let report = select_tracks_on_load(
        &mut host,
        saved,
        config::preferences(),
        &config::wait_policy(),
    )
    .await;

    println!("{}", path.as_str().bold());
    println!("{report}");
    if report.audio.is_none() || report.subtitle.is_none() {
        anyhow::bail!("some tracks could not be selected, see the log");
    }
    Ok(())
}

/// Prints the track list, marking the active tracks.
pub async fn tracks(socket: &Path) -> anyhow::Result<()> {
    let client = connect(socket).await?;
    let mut host = MpvTracks::new(client);

    let tracks = read_tracks(&mut host).await.context("reading the track list")?;
    let audio = host.active(TrackKind::Audio).await.context("reading aid")?;
    let subtitle = host.active(TrackKind::Subtitle).await.context("reading sid")?;

    for kind in [TrackKind::Audio, TrackKind::Subtitle] {
        println!("{}", kind.name().bold());
        let active = match kind {
            TrackKind::Audio => audio,
            _ => subtitle,
        };
        let mut any = false;
        for track in tracks.iter().filter(|t| t.kind == kind) {
            any = true;
            if Some(track.id) == active {
                println!("  {} {}", "*".green(), track.to_string().as_str().green());
            } else {
                println!("    {track}");
            }
        }
        if !any {
            println!("    {}", "none".dimmed());
        }
    }
    Ok(())
}

pub fn saved_list() -> anyhow::Result<()> {
    let store_file = config::store_file()?;
    let store = store::read_store(&store_file)
        .with_context(|| format!("reading the saved selections at {:?}", store_file))?;
    for (path, selection) in store.iter() {
        println!("{} {}", selection.to_string().as_str().cyan(), path);
    }
    Ok(())
}

pub fn saved_forget(path: &str) -> anyhow::Result<()> {
    let store_file = config::store_file()?;
    let mut store = store::read_store(&store_file)
        .with_context(|| format!("reading the saved selections at {:?}", store_file))?;
    match store.forget(path) {
        Some(old) => log::info!("Forgot {} for {}", old, path),
        None => {
            log::warn!("Nothing is saved for {}", path);
            return Ok(());
        }
    }
    store::write_store(&store_file, &store).context("writing the saved selections")?;
    Ok(())
}

pub fn saved_set(path: &str, selection: SavedSelection) -> anyhow::Result<()> {
    if selection.audio_id < 0 || selection.subtitle_id < 0 {
        anyhow::bail!("track ids can not be negative");
    }
    let store_file = config::store_file()?;
    let mut store = store::read_store(&store_file)
        .with_context(|| format!("reading the saved selections at {:?}", store_file))?;
    if store.record(path, selection) {
        store::write_store(&store_file, &store).context("writing the saved selections")?;
        log::info!("Saved {} for {}", selection, path);
    }
    Ok(())
}
