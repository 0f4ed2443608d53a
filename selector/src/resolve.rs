use std::fmt;

use crate::{
    read_track_entries, track::of_kind, wait_for_tracks, PreferredLangs, Preferences,
    SavedSelection, Track, TrackHost, TrackKind, WaitPolicy,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioChoice {
    Saved(i64),
    Preferred { id: i64, lang: String },
    Default(i64),
    First(i64),
    NoTracks,
}

impl AudioChoice {
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Saved(id) | Self::Default(id) | Self::First(id) => Some(*id),
            Self::Preferred { id, .. } => Some(*id),
            Self::NoTracks => None,
        }
    }
}

impl fmt::Display for AudioChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(id) => write!(f, "saved track {id}"),
            Self::Preferred { id, lang } => write!(f, "track {id} (prefers {lang})"),
            Self::Default(id) => write!(f, "default track {id}"),
            Self::First(id) => write!(f, "first track {id}"),
            Self::NoTracks => write!(f, "nothing, there are no audio tracks"),
        }
    }
}

/// Why subtitles ended up off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disabled {
    /// The saved selection says they were turned off.
    ByUser,
    /// The saved track is not in this file.
    StaleSaved(i64),
    /// Languages are preferred, but none of the tracks have them.
    NoLanguageMatch,
    /// No languages are preferred and no track is flagged default.
    NoDefault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleChoice {
    Saved(i64),
    Preferred { id: i64, lang: String },
    Default(i64),
    Disabled(Disabled),
}

impl SubtitleChoice {
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Saved(id) | Self::Default(id) => Some(*id),
            Self::Preferred { id, .. } => Some(*id),
            Self::Disabled(_) => None,
        }
    }
}

impl fmt::Display for SubtitleChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(id) => write!(f, "saved track {id}"),
            Self::Preferred { id, lang } => write!(f, "track {id} (prefers {lang})"),
            Self::Default(id) => write!(f, "default track {id}"),
            Self::Disabled(Disabled::ByUser) => write!(f, "off, as saved"),
            Self::Disabled(Disabled::StaleSaved(id)) => {
                write!(f, "off, saved track {id} is missing")
            }
            Self::Disabled(Disabled::NoLanguageMatch) => {
                write!(f, "off, no track has a preferred language")
            }
            Self::Disabled(Disabled::NoDefault) => write!(f, "off, no default track"),
        }
    }
}

/// What happened to each kind of track. `None` means that resolution failed, the
/// error has already been logged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionReport {
    pub audio: Option<AudioChoice>,
    pub subtitle: Option<SubtitleChoice>,
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.audio {
            Some(c) => writeln!(f, "audio: {c}")?,
            None => writeln!(f, "audio: failed")?,
        }
        match &self.subtitle {
            Some(c) => write!(f, "subtitle: {c}"),
            None => write!(f, "subtitle: failed"),
        }
    }
}

/// Picks the audio and subtitle tracks for a file that just started loading. Waits for
/// the track list first, reads it once, then resolves audio and subtitles one after
/// the other from that snapshot. A failure in one does not stop the other.
pub async fn select_tracks_on_load<H>(
    host: &mut H,
    saved: Option<SavedSelection>,
    prefs: &Preferences,
    wait: &WaitPolicy,
) -> SelectionReport
where
    H: TrackHost + ?Sized,
{
    log::info!("Performing automatic track selection");
    match &saved {
        Some(s) => log::info!("Saved selection: {s}"),
        None => log::info!("No saved selection"),
    }

    let count = wait_for_tracks(host, wait).await;
    let tracks = match read_track_entries(host, count).await {
        Ok(tracks) => tracks,
        Err(e) => {
            log::error!("Failed to read the track list: {e}");
            return SelectionReport::default();
        }
    };

    let audio = match resolve_audio(host, &tracks, saved.as_ref(), &prefs.audio).await {
        Ok(choice) => {
            log::info!("Audio: {choice}");
            Some(choice)
        }
        Err(e) => {
            log::error!("Failed to select the audio track: {e}");
            None
        }
    };

    let subtitle = match resolve_subtitle(host, &tracks, saved.as_ref(), &prefs.subtitle).await {
        Ok(choice) => {
            log::info!("Subtitle: {choice}");
            Some(choice)
        }
        Err(e) => {
            log::error!("Failed to select the subtitle track: {e}");
            None
        }
    };

    SelectionReport { audio, subtitle }
}

pub async fn resolve_audio<H>(
    host: &mut H,
    tracks: &[Track],
    saved: Option<&SavedSelection>,
    preferred: &PreferredLangs,
) -> Result<AudioChoice, H::Error>
where
    H: TrackHost + ?Sized,
{
    log_available(tracks, TrackKind::Audio, preferred);
    let audios = of_kind(tracks, TrackKind::Audio);

    if let Some(id) = saved.and_then(SavedSelection::audio) {
        if audios.clone().any(|t| t.id == id) {
            host.set_active(TrackKind::Audio, Some(id)).await?;
            return Ok(AudioChoice::Saved(id));
        }
        log::info!("The saved audio track {id} does not exist, ignoring it");
    }

    let Some(first) = audios.clone().next() else {
        return Ok(AudioChoice::NoTracks);
    };

    clear_active(host, TrackKind::Audio).await?;

    let choice = if let Some((lang, track)) = preferred.first_match(audios.clone()) {
        AudioChoice::Preferred {
            id: track.id,
            lang: lang.to_string(),
        }
    } else if let Some(track) = audios.clone().find(|t| t.default) {
        AudioChoice::Default(track.id)
    } else {
        AudioChoice::First(first.id)
    };

    host.set_active(TrackKind::Audio, choice.id()).await?;
    Ok(choice)
}

pub async fn resolve_subtitle<H>(
    host: &mut H,
    tracks: &[Track],
    saved: Option<&SavedSelection>,
    preferred: &PreferredLangs,
) -> Result<SubtitleChoice, H::Error>
where
    H: TrackHost + ?Sized,
{
    log_available(tracks, TrackKind::Subtitle, preferred);
    let subs = of_kind(tracks, TrackKind::Subtitle);

    if let Some(saved) = saved {
        let choice = match saved.subtitle() {
            Some(id) if subs.clone().any(|t| t.id == id) => SubtitleChoice::Saved(id),
            Some(id) => SubtitleChoice::Disabled(Disabled::StaleSaved(id)),
            None => SubtitleChoice::Disabled(Disabled::ByUser),
        };
        host.set_active(TrackKind::Subtitle, choice.id()).await?;
        return Ok(choice);
    }

    clear_active(host, TrackKind::Subtitle).await?;

    // NOTE: a configured language list means "only these", so the default flag is
    // only consulted when the list is empty
    let choice = if !preferred.is_empty() {
        match preferred.first_match(subs) {
            Some((lang, track)) => SubtitleChoice::Preferred {
                id: track.id,
                lang: lang.to_string(),
            },
            None => SubtitleChoice::Disabled(Disabled::NoLanguageMatch),
        }
    } else {
        match subs.clone().find(|t| t.default) {
            Some(track) => SubtitleChoice::Default(track.id),
            None => SubtitleChoice::Disabled(Disabled::NoDefault),
        }
    };

    if let Some(id) = choice.id() {
        host.set_active(TrackKind::Subtitle, Some(id)).await?;
    }
    Ok(choice)
}

async fn clear_active<H>(host: &mut H, kind: TrackKind) -> Result<(), H::Error>
where
    H: TrackHost + ?Sized,
{
    if let Some(id) = host.active(kind).await? {
        log::debug!("Clearing the active {kind} track {id}");
        host.set_active(kind, None).await?;
    }
    Ok(())
}

fn log_available(tracks: &[Track], kind: TrackKind, preferred: &PreferredLangs) {
    let names: Vec<_> = of_kind(tracks, kind).map(|t| t.to_string()).collect();
    log::info!(
        "Available {}: {:?} (preferred={})",
        kind.name(),
        names,
        preferred
    );
}
