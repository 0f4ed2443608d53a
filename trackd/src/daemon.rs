use std::{
    collections::HashMap,
    future::Future,
    path::{Path, PathBuf},
};

use anyhow::Context;
use async_trait::async_trait;
use mpvipc::{parse_track_id, Client, Event, Events, MpvTracks, Property};
use selector::{
    select_tracks_on_load, Preferences, SavedSelection, SelectionReport, Track, TrackHost,
    TrackKind, WaitPolicy,
};
use serde_json::Value;
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    config,
    signal::signal_received,
    store::{self, SavedSelections},
};

const AID_OBSERVER: u64 = 1;
const SID_OBSERVER: u64 = 2;
const CHANNEL_SIZE: usize = 16;

type Command = (TrackKind, Option<i64>);
type ReportSnd = mpsc::Sender<(u64, SelectionReport, Vec<Command>)>;

/// Everything the daemon needs besides the connection.
#[derive(Debug, Clone)]
pub struct Options {
    pub store_file: PathBuf,
    pub prefs: Preferences,
    pub wait: WaitPolicy,
}

impl Options {
    pub fn from_config() -> anyhow::Result<Self> {
        Ok(Self {
            store_file: config::store_file()?,
            prefs: config::preferences().clone(),
            wait: config::wait_policy(),
        })
    }
}

/// Passes everything through and remembers what was set.
struct RecordingHost<H> {
    inner: H,
    commands: Vec<Command>,
}

#[async_trait]
impl<H: TrackHost> TrackHost for RecordingHost<H> {
    type Error = H::Error;

    async fn track_count(&mut self) -> Result<usize, H::Error> {
        self.inner.track_count().await
    }

    async fn track(&mut self, index: usize) -> Result<Track, H::Error> {
        self.inner.track(index).await
    }

    async fn active(&mut self, kind: TrackKind) -> Result<Option<i64>, H::Error> {
        self.inner.active(kind).await
    }

    async fn set_active(&mut self, kind: TrackKind, id: Option<i64>) -> Result<(), H::Error> {
        // NOTE: mpv might have applied it even if this fails
        self.commands.push((kind, id));
        self.inner.set_active(kind, id).await
    }
}

fn id_of(selection: &SavedSelection, kind: TrackKind) -> i64 {
    match kind {
        TrackKind::Audio => selection.audio_id,
        TrackKind::Subtitle | TrackKind::Video => selection.subtitle_id,
    }
}

fn set_id(selection: &mut SavedSelection, kind: TrackKind, id: i64) {
    match kind {
        TrackKind::Audio => selection.audio_id = id,
        TrackKind::Subtitle | TrackKind::Video => selection.subtitle_id = id,
    }
}

/// The file that is loaded right now.
#[derive(Debug)]
struct Playing {
    generation: u64,
    path: String,
    /// The tracks as they are now, 0 meaning none.
    known: SavedSelection,
    /// The last id mpv reported for each kind since the file was loaded.
    seen: HashMap<TrackKind, i64>,
    /// Ids the automatic selection set whose change events have not arrived yet.
    /// A kind is removed once its final id shows up or the user picks something else.
    pending: HashMap<TrackKind, Vec<i64>>,
    /// Changes before the automatic selection is done are not the user's.
    selected: bool,
    token: CancellationToken,
}

impl Playing {
    fn new(generation: u64, path: String, token: CancellationToken) -> Self {
        Self {
            generation,
            path,
            known: SavedSelection::default(),
            seen: HashMap::new(),
            pending: HashMap::new(),
            selected: false,
            token,
        }
    }

    fn selection_done(&mut self, report: &SelectionReport, commands: &[Command]) {
        if let Some(choice) = &report.audio {
            self.known.audio_id = choice.id().unwrap_or(0);
        }
        if let Some(choice) = &report.subtitle {
            self.known.subtitle_id = choice.id().unwrap_or(0);
        }

        for &(kind, id) in commands {
            // mpv reports changes in order, so nothing older can follow the final id
            if self.seen.get(&kind) == Some(&id_of(&self.known, kind)) {
                continue;
            }
            let ids = self.pending.entry(kind).or_default();
            let id = id.unwrap_or(0);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.selected = true;
    }

    /// Returns what should be saved, if anything.
    fn track_changed(&mut self, kind: TrackKind, id: Option<i64>) -> Option<SavedSelection> {
        let id = id.unwrap_or(0);
        self.seen.insert(kind, id);
        if !self.selected {
            set_id(&mut self.known, kind, id);
            return None;
        }

        match self.pending.get(&kind).map(|ids| ids.contains(&id)) {
            Some(true) => {
                if id == id_of(&self.known, kind) {
                    self.pending.remove(&kind);
                }
                return None;
            }
            Some(false) => {
                self.pending.remove(&kind);
            }
            None => (),
        }

        if id == id_of(&self.known, kind) {
            return None;
        }
        set_id(&mut self.known, kind, id);
        Some(self.known)
    }
}

struct Daemon {
    client: Client,
    options: Options,
    store: SavedSelections,
    dirty: bool,
    playing: Option<Playing>,
    generation: u64,
    reports: ReportSnd,
    canceltoken: CancellationToken,
}

impl Daemon {
    fn stop_selection(&mut self) {
        if let Some(playing) = self.playing.take() {
            log::debug!("Done with {}", playing.path);
            playing.token.cancel();
        }
    }

    async fn file_loaded(&mut self) {
        self.stop_selection();

        let path = match self.client.get_property(&Property::Path).await {
            Ok(Value::String(path)) => path,
            Ok(v) => {
                log::error!("Mpv has a weird path: {}", v);
                return;
            }
            Err(e) => {
                log::error!("Could not get the path of the loaded file: {}", e);
                return;
            }
        };
        log::info!("Loaded {}", path);

        self.generation += 1;
        let token = self.canceltoken.child_token();
        let saved = self.store.get(&path);
        spawn_selection(
            self.client.clone(),
            self.generation,
            saved,
            self.options.clone(),
            token.clone(),
            self.reports.clone(),
        );
        self.playing = Some(Playing::new(self.generation, path, token));
    }

    fn selection_done(&mut self, generation: u64, report: SelectionReport, commands: Vec<Command>) {
        match &mut self.playing {
            Some(playing) if playing.generation == generation => {
                playing.selection_done(&report, &commands)
            }
            _ => log::debug!("Got a selection report for an old file"),
        }
    }

    fn property_changed(&mut self, name: &str, data: Value) {
        let kind = match Property::from_name(name) {
            Some(Property::Aid) => TrackKind::Audio,
            Some(Property::Sid) => TrackKind::Subtitle,
            _ => return,
        };
        let id = match parse_track_id(&Property::active(kind), data) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Ignoring a change of {}: {}", name, e);
                return;
            }
        };

        let Some(playing) = &mut self.playing else {
            return;
        };
        if let Some(selection) = playing.track_changed(kind, id) {
            log::info!("Recording {} for {}", selection, playing.path);
            self.dirty |= self.store.record(&playing.path, selection);
        }
    }

    fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        match store::write_store(&self.options.store_file, &self.store) {
            Ok(()) => self.dirty = false,
            Err(e) => log::error!("Failed to save the selections: {}", e),
        }
    }
}

fn spawn_selection(
    client: Client,
    generation: u64,
    saved: Option<SavedSelection>,
    options: Options,
    token: CancellationToken,
    reports: ReportSnd,
) {
    tokio::spawn(async move {
        let mut host = RecordingHost {
            inner: MpvTracks::new(client),
            commands: Vec::new(),
        };
        select! {
            _ = token.cancelled() => log::info!("Selection cancelled, the file changed"),
            report = select_tracks_on_load(&mut host, saved, &options.prefs, &options.wait) => {
                reports.send((generation, report, host.commands)).await.ok();
            }
        }
    });
}

/// Runs the automatic selection on every file mpv loads until mpv or we are told to
/// quit.
pub async fn run(socket: &Path) -> anyhow::Result<()> {
    let options = Options::from_config()?;
    let (client, events) = mpvipc::connect(socket)
        .await
        .with_context(|| format!("connecting to mpv at {:?}", socket))?;
    serve(client, events, options, signal_received()).await
}

/// The daemon over an already open connection. Returns when `shutdown` resolves, mpv
/// shuts down or the connection closes.
pub async fn serve<F>(
    client: Client,
    mut events: Events,
    options: Options,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let store = store::read_store(&options.store_file)
        .with_context(|| format!("reading the saved selections at {:?}", options.store_file))?;
    log::info!("Read {} saved selections", store.len());

    client
        .observe_property(AID_OBSERVER, &Property::Aid)
        .await
        .context("observing the audio track")?;
    client
        .observe_property(SID_OBSERVER, &Property::Sid)
        .await
        .context("observing the subtitle track")?;

    let (reports, mut from_selection) = mpsc::channel(CHANNEL_SIZE);
    let mut daemon = Daemon {
        client,
        options,
        store,
        dirty: false,
        playing: None,
        generation: 0,
        reports,
        canceltoken: CancellationToken::new(),
    };

    tokio::pin!(shutdown);

    loop {
        select! {
            _ = &mut shutdown => {
                log::info!("Terminating due to a signal");
                break;
            }
            Some((generation, report, commands)) = from_selection.recv() => {
                daemon.selection_done(generation, report, commands)
            }
            event = events.next() => match event {
                None => {
                    log::info!("The connection to mpv is gone");
                    break;
                }
                Some(Event::Shutdown) => {
                    log::info!("Mpv is shutting down");
                    break;
                }
                Some(Event::StartFile) => daemon.stop_selection(),
                Some(Event::FileLoaded) => daemon.file_loaded().await,
                Some(Event::EndFile(reason)) => {
                    log::debug!("File ended: {:?}", reason);
                    daemon.stop_selection();
                    daemon.flush();
                }
                Some(Event::PropertyChange { name, data, .. }) => {
                    daemon.property_changed(&name, data)
                }
                Some(Event::Other(name)) => log::trace!("Ignoring mpv event {}", name),
            },
        }
    }

    daemon.canceltoken.cancel();
    daemon.flush();
    log::info!("Goodbye");
    Ok(())
}
