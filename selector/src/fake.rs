use async_trait::async_trait;

use crate::{Track, TrackHost, TrackKind};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FakeError {
    #[error("track count unavailable")]
    Count,
    #[error("no track at index {0}")]
    Index(usize),
    #[error("{0} is broken")]
    Broken(TrackKind),
    #[error("there is no {0} track with id {1}")]
    NoSuchId(TrackKind, i64),
}

/// An engine that keeps its track list in memory and remembers every command.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub tracks: Vec<Track>,
    pub audio: Option<i64>,
    pub subtitle: Option<i64>,
    pub commands: Vec<(TrackKind, Option<i64>)>,
    pub count_polls: usize,
    empty_polls: usize,
    failing_polls: usize,
    phantom: usize,
    broken: Option<TrackKind>,
}

impl FakeHost {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            ..Default::default()
        }
    }

    pub fn empty_for(mut self, polls: usize) -> Self {
        self.empty_polls = polls;
        self
    }

    pub fn failing_count_for(mut self, polls: usize) -> Self {
        self.failing_polls = polls;
        self
    }

    /// Claims to have `count` more tracks than it does.
    pub fn phantom_tracks(mut self, count: usize) -> Self {
        self.phantom = count;
        self
    }

    pub fn broken(mut self, kind: TrackKind) -> Self {
        self.broken = Some(kind);
        self
    }

    pub fn active_audio(mut self, id: i64) -> Self {
        self.audio = Some(id);
        self
    }

    pub fn active_subtitle(mut self, id: i64) -> Self {
        self.subtitle = Some(id);
        self
    }

    pub fn commands_for(&self, kind: TrackKind) -> Vec<Option<i64>> {
        self.commands
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .collect()
    }

    fn check(&self, kind: TrackKind) -> Result<(), FakeError> {
        if self.broken == Some(kind) {
            return Err(FakeError::Broken(kind));
        }
        Ok(())
    }

    fn slot(&mut self, kind: TrackKind) -> &mut Option<i64> {
        match kind {
            TrackKind::Audio => &mut self.audio,
            TrackKind::Subtitle => &mut self.subtitle,
            TrackKind::Video => panic!("video is never touched"),
        }
    }
}

#[async_trait]
impl TrackHost for FakeHost {
    type Error = FakeError;

    async fn track_count(&mut self) -> Result<usize, FakeError> {
        self.count_polls += 1;
        if self.failing_polls > 0 {
            self.failing_polls -= 1;
            return Err(FakeError::Count);
        }
        if self.empty_polls > 0 {
            self.empty_polls -= 1;
            return Ok(0);
        }
        Ok(self.tracks.len() + self.phantom)
    }

    async fn track(&mut self, index: usize) -> Result<Track, FakeError> {
        self.tracks.get(index).cloned().ok_or(FakeError::Index(index))
    }

    async fn active(&mut self, kind: TrackKind) -> Result<Option<i64>, FakeError> {
        self.check(kind)?;
        Ok(*self.slot(kind))
    }

    async fn set_active(
        &mut self,
        kind: TrackKind,
        id: Option<i64>,
    ) -> Result<(), FakeError> {
        self.check(kind)?;
        if let Some(id) = id {
            if !self.tracks.iter().any(|t| t.kind == kind && t.id == id) {
                return Err(FakeError::NoSuchId(kind, id));
            }
        }
        self.commands.push((kind, id));
        *self.slot(kind) = id;
        Ok(())
    }
}

pub fn audio(id: i64, lang: &str) -> Track {
    Track::new(0, id, TrackKind::Audio).with_lang(lang)
}

pub fn sub(id: i64, lang: &str) -> Track {
    Track::new(0, id, TrackKind::Subtitle).with_lang(lang)
}

/// Builds a host where every track's index matches its position.
pub fn host(tracks: impl IntoIterator<Item = Track>) -> FakeHost {
    FakeHost::new(
        tracks
            .into_iter()
            .enumerate()
            .map(|(i, mut t)| {
                t.index = i;
                t
            })
            .collect(),
    )
}
