use async_trait::async_trait;
use selector::{Track, TrackHost, TrackKind};
use serde_json::{json, Value};

use crate::{
    Client, IpcError, IpcResult, Property, PropertyName, TrackField, TrackProperty,
    TrackType,
};

/// The track list and track selection of an mpv reached over ipc.
#[derive(Debug, Clone)]
pub struct MpvTracks {
    client: Client,
}

impl MpvTracks {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn field(&self, index: usize, field: TrackField) -> IpcResult<Value> {
        self.client
            .get_property(&TrackProperty::new(index, field))
            .await
    }

    /// Like `field`, but a field mpv doesn't have a value for is `None`.
    async fn optional_field(
        &self,
        index: usize,
        field: TrackField,
    ) -> IpcResult<Option<Value>> {
        match self.field(index, field).await {
            Ok(Value::Null) => Ok(None),
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_unavailable() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn take_int(prop: &impl PropertyName, value: Value) -> IpcResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| IpcError::malformed(prop.name(), value))
}

fn take_str(prop: &impl PropertyName, value: Value) -> IpcResult<String> {
    match value {
        Value::String(s) => Ok(s),
        v => Err(IpcError::malformed(prop.name(), v)),
    }
}

fn take_flag(prop: &impl PropertyName, value: Value) -> IpcResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| IpcError::malformed(prop.name(), value))
}

/// `aid`, `sid` and `vid` are either a track id, or `false` when nothing is active.
pub fn parse_track_id(prop: &impl PropertyName, value: Value) -> IpcResult<Option<i64>> {
    match value {
        Value::Bool(false) => Ok(None),
        Value::String(s) if s == "no" => Ok(None),
        Value::Number(n) if n.as_i64().is_some_and(|id| id > 0) => Ok(n.as_i64()),
        v => Err(IpcError::malformed(prop.name(), v)),
    }
}

#[async_trait]
impl TrackHost for MpvTracks {
    type Error = IpcError;

    async fn track_count(&mut self) -> IpcResult<usize> {
        let prop = Property::TrackCount;
        let value = self.client.get_property(&prop).await?;
        let count = take_int(&prop, value.clone())?;
        usize::try_from(count).map_err(|_| IpcError::malformed(prop.name(), value))
    }

    async fn track(&mut self, index: usize) -> IpcResult<Track> {
        let prop = TrackProperty::new(index, TrackField::Type);
        let ttype = take_str(&prop, self.field(index, TrackField::Type).await?)?;
        let kind: TrackKind = TrackType::from_name(&ttype)
            .ok_or_else(|| IpcError::malformed(prop.name(), json!(ttype)))?
            .into();

        let prop = TrackProperty::new(index, TrackField::Id);
        let id = take_int(&prop, self.field(index, TrackField::Id).await?)?;

        let prop = TrackProperty::new(index, TrackField::Lang);
        let lang = match self.optional_field(index, TrackField::Lang).await? {
            Some(v) => take_str(&prop, v)?,
            None => String::new(),
        };

        let prop = TrackProperty::new(index, TrackField::Default);
        let default = match self.optional_field(index, TrackField::Default).await? {
            Some(v) => take_flag(&prop, v)?,
            None => false,
        };

        Ok(Track::new(index, id, kind)
            .with_lang(lang)
            .with_default(default))
    }

    async fn active(&mut self, kind: TrackKind) -> IpcResult<Option<i64>> {
        let prop = Property::active(kind);
        parse_track_id(&prop, self.client.get_property(&prop).await?)
    }

    async fn set_active(&mut self, kind: TrackKind, id: Option<i64>) -> IpcResult<()> {
        let value = match id {
            Some(id) => json!(id),
            None => json!("no"),
        };
        self.client.set_property(&Property::active(kind), value).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fake;
    use selector::{
        read_tracks, select_tracks_on_load, PreferredLangs, Preferences, SavedSelection,
        WaitPolicy,
    };

    fn two_tracks() -> Vec<(&'static str, Value)> {
        vec![
            ("track-list/count", json!(3)),
            ("track-list/0/type", json!("video")),
            ("track-list/0/id", json!(1)),
            ("track-list/1/type", json!("audio")),
            ("track-list/1/id", json!(1)),
            ("track-list/1/lang", json!("jpn")),
            ("track-list/1/default", json!(true)),
            ("track-list/2/type", json!("sub")),
            ("track-list/2/id", json!(1)),
            ("track-list/2/default", json!(false)),
            ("aid", json!(1)),
            ("sid", json!(false)),
        ]
    }

    #[tokio::test]
    async fn reading_the_track_list() {
        let (client, _events, _) = fake::mpv(&two_tracks());
        let mut tracks = MpvTracks::new(client);

        let list = read_tracks(&mut tracks).await.unwrap();
        assert_eq!(
            vec![
                Track::new(0, 1, TrackKind::Video),
                Track::new(1, 1, TrackKind::Audio)
                    .with_lang("jpn")
                    .with_default(true),
                Track::new(2, 1, TrackKind::Subtitle),
            ],
            list
        );
        assert_eq!(Some(1), tracks.active(TrackKind::Audio).await.unwrap());
        assert_eq!(None, tracks.active(TrackKind::Subtitle).await.unwrap());
    }

    #[tokio::test]
    async fn setting_and_clearing() {
        let (client, events, server) = fake::mpv(&two_tracks());
        let mut tracks = MpvTracks::new(client);
        drop(events);

        tracks.set_active(TrackKind::Subtitle, Some(1)).await.unwrap();
        assert_eq!(Some(1), tracks.active(TrackKind::Subtitle).await.unwrap());
        tracks.set_active(TrackKind::Audio, None).await.unwrap();
        assert_eq!(None, tracks.active(TrackKind::Audio).await.unwrap());

        drop(tracks);
        let props = server.await.unwrap();
        assert_eq!(Some(&json!(1)), props.get("sid"));
    }

    #[tokio::test]
    async fn malformed_values() {
        let (client, _events, _) = fake::mpv(&[
            ("track-list/count", json!("many")),
            ("track-list/0/type", json!("data")),
            ("aid", json!(true)),
        ]);
        let mut tracks = MpvTracks::new(client);

        assert!(matches!(
            tracks.track_count().await,
            Err(IpcError::Malformed { .. })
        ));
        assert!(matches!(
            tracks.track(0).await,
            Err(IpcError::Malformed { .. })
        ));
        assert!(matches!(
            tracks.active(TrackKind::Audio).await,
            Err(IpcError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn whole_selection_over_ipc() {
        let (client, events, server) = fake::mpv(&two_tracks());
        let mut tracks = MpvTracks::new(client);
        drop(events);
        let prefs =
            Preferences::new(PreferredLangs::parse("jpn"), PreferredLangs::default());

        let report = select_tracks_on_load(
            &mut tracks,
            Some(SavedSelection::new(5, 1)),
            &prefs,
            &WaitPolicy::once(),
        )
        .await;
        assert_eq!(Some(1), report.audio.and_then(|c| c.id()));
        assert_eq!(Some(1), report.subtitle.and_then(|c| c.id()));

        drop(tracks);
        let props = server.await.unwrap();
        assert_eq!(Some(&json!(1)), props.get("aid"));
        assert_eq!(Some(&json!(1)), props.get("sid"));
    }
}
