use async_trait::async_trait;

use crate::{Track, TrackKind};

/// The media engine as seen by the selector. Implementations translate these into
/// whatever the engine speaks, nothing outside them should know property names.
#[async_trait]
pub trait TrackHost: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Length of the dynamic track list. Zero while the engine is still demuxing.
    async fn track_count(&mut self) -> Result<usize, Self::Error>;

    /// The entry at `index` of the dynamic track list.
    async fn track(&mut self, index: usize) -> Result<Track, Self::Error>;

    /// Id of the active track of `kind`, if any.
    async fn active(&mut self, kind: TrackKind) -> Result<Option<i64>, Self::Error>;

    /// Activates the track with `id`, or deactivates the kind when `None`.
    async fn set_active(
        &mut self,
        kind: TrackKind,
        id: Option<i64>,
    ) -> Result<(), Self::Error>;
}

/// Reads the whole track list as it looks right now.
pub async fn read_tracks<H>(host: &mut H) -> Result<Vec<Track>, H::Error>
where
    H: TrackHost + ?Sized,
{
    let count = host.track_count().await?;
    read_track_entries(host, count).await
}

/// Reads the first `count` entries of the track list.
pub async fn read_track_entries<H>(host: &mut H, count: usize) -> Result<Vec<Track>, H::Error>
where
    H: TrackHost + ?Sized,
{
    let mut tracks = Vec::with_capacity(count);
    for i in 0..count {
        tracks.push(host.track(i).await?);
    }
    Ok(tracks)
}
