use std::fmt;

use itertools::Itertools;

use crate::Track;

/// What separates the languages in a configured language list.
pub const LANG_SEPARATOR: char = ',';

/// Languages in priority order, compared case insensitively. Empty entries and
/// duplicates are dropped, keeping the position of the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(from = "String")]
pub struct PreferredLangs {
    langs: Vec<String>,
}

impl PreferredLangs {
    pub fn new<I>(langs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for lang in langs.into_iter().map(Into::into) {
            if !lang.is_empty() && !unique.iter().any(|l| l.eq_ignore_ascii_case(&lang)) {
                unique.push(lang);
            }
        }
        Self { langs: unique }
    }

    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(LANG_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.langs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.langs.iter().map(String::as_str)
    }

    /// Goes through the languages in priority order and returns the first track, in
    /// list order, that has that language.
    pub fn first_match<'t, It>(&self, tracks: It) -> Option<(&str, &'t Track)>
    where
        It: IntoIterator<Item = &'t Track>,
        It::IntoIter: Clone,
    {
        let tracks = tracks.into_iter();
        self.iter()
            .find_map(|lang| tracks.clone().find(|t| t.lang_is(lang)).map(|t| (lang, t)))
    }
}

impl From<String> for PreferredLangs {
    fn from(list: String) -> Self {
        Self::parse(&list)
    }
}

impl From<&str> for PreferredLangs {
    fn from(list: &str) -> Self {
        Self::parse(list)
    }
}

impl fmt::Display for PreferredLangs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", self.langs.iter().join(", "))
        }
    }
}

/// The user's language priorities, one list per kind of track.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Preferences {
    pub audio: PreferredLangs,
    #[serde(alias = "sub")]
    pub subtitle: PreferredLangs,
}

impl Preferences {
    pub fn new(audio: PreferredLangs, subtitle: PreferredLangs) -> Self {
        Self { audio, subtitle }
    }
}
