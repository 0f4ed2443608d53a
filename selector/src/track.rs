use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
    Subtitle,
}

impl TrackKind {
    /// Plural name used when logging
    pub const fn name(self) -> &'static str {
        match self {
            Self::Audio => "dubs",
            Self::Video => "vubs",
            Self::Subtitle => "subs",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Subtitle => "subtitle",
        };
        write!(f, "{name}")
    }
}

/// One entry of the host's dynamic track list. `index` is the position in the list,
/// `id` is what the host wants in selection commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub index: usize,
    pub id: i64,
    pub kind: TrackKind,
    pub lang: Option<String>,
    pub default: bool,
}

impl Track {
    pub fn new(index: usize, id: i64, kind: TrackKind) -> Self {
        Self {
            index,
            id,
            kind,
            lang: None,
            default: false,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        let lang = lang.into();
        self.lang = (!lang.is_empty()).then_some(lang);
        self
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    pub fn lang_is(&self, lang: &str) -> bool {
        self.lang
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(lang))
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)?;
        match &self.lang {
            Some(lang) => write!(f, " {lang}")?,
            None => write!(f, " None")?,
        }
        if self.default {
            write!(f, " (default)")?;
        }
        Ok(())
    }
}

/// The last track choice recorded for a file. An `audio_id` of 0 means nothing was
/// recorded, a `subtitle_id` of 0 means subtitles were turned off.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
pub struct SavedSelection {
    pub audio_id: i64,
    pub subtitle_id: i64,
}

impl SavedSelection {
    pub const fn new(audio_id: i64, subtitle_id: i64) -> Self {
        Self {
            audio_id,
            subtitle_id,
        }
    }

    pub fn audio(&self) -> Option<i64> {
        (self.audio_id > 0).then_some(self.audio_id)
    }

    pub fn subtitle(&self) -> Option<i64> {
        (self.subtitle_id > 0).then_some(self.subtitle_id)
    }
}

impl fmt::Display for SavedSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.audio() {
            Some(id) => write!(f, "audio={id}")?,
            None => write!(f, "audio=unset")?,
        }
        match self.subtitle() {
            Some(id) => write!(f, " subtitle={id}"),
            None => write!(f, " subtitle=off"),
        }
    }
}

/// The tracks of one kind, in list order.
pub(crate) fn of_kind(
    tracks: &[Track],
    kind: TrackKind,
) -> impl Iterator<Item = &Track> + Clone {
    tracks.iter().filter(move |t| t.kind == kind)
}
