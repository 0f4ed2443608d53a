use std::borrow::Cow;

use selector::TrackKind;

macro_rules! enum_str_map {
    ($vis:vis $name:ident {$(($r:ident, $s:literal)),* $(,)*}) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($r),*
        }

        impl $name {
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($s => Some(Self::$r),)*
                    _ => None,
                }
            }

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$r => $s),*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

/// Anything that names an mpv property.
pub trait PropertyName {
    fn name(&self) -> Cow<'static, str>;
}

enum_str_map! {pub Property {
    (Path, "path"),
    (Aid, "aid"),
    (Vid, "vid"),
    (Sid, "sid"),
    (TrackCount, "track-list/count"),
}}

impl Property {
    /// The property holding the active track of `kind`.
    pub const fn active(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Audio => Self::Aid,
            TrackKind::Video => Self::Vid,
            TrackKind::Subtitle => Self::Sid,
        }
    }
}

impl PropertyName for Property {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.as_str())
    }
}

enum_str_map! {pub TrackField {
    (Type, "type"),
    (Id, "id"),
    (Lang, "lang"),
    (Default, "default"),
}}

/// A field of one entry in `track-list`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TrackProperty {
    pub index: usize,
    pub field: TrackField,
}

impl TrackProperty {
    pub const fn new(index: usize, field: TrackField) -> Self {
        Self { index, field }
    }
}

impl PropertyName for TrackProperty {
    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(format!("track-list/{}/{}", self.index, self.field))
    }
}

enum_str_map! {pub TrackType {
    (Audio, "audio"),
    (Video, "video"),
    (Sub, "sub"),
}}

impl From<TrackType> for TrackKind {
    fn from(ttype: TrackType) -> Self {
        match ttype {
            TrackType::Audio => TrackKind::Audio,
            TrackType::Video => TrackKind::Video,
            TrackType::Sub => TrackKind::Subtitle,
        }
    }
}
