//! Type definitions for plexy.
//!
//! This module contains the user-facing preference and filter types: what to
//! look for in the library and which tracks to prefer once found.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use clap::ValueEnum;
use regex::Regex;
use serde::Deserialize;

use crate::error::AppError;
use crate::language::Language;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>.*?)\s*(?:\((?P<year>\d{4})\))?\s*(?:[sS](?P<season>\d+)(?:[eE](?P<episode>\d+))?)?$",
    )
    .unwrap()
});

static AGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<weeks>\d+)w)?(?:(?P<days>\d+)d)?(?:(?P<hours>\d+)h)?$").unwrap()
});

/// How the user likes to watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchingPreference {
    /// Original audio, subtitles in the desired language when needed.
    Original,
    /// Audio in the desired language.
    Dubbed,
}

impl fmt::Display for WatchingPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchingPreference::Original => write!(f, "original"),
            WatchingPreference::Dubbed => write!(f, "dubbed"),
        }
    }
}

/// Audio codecs as Plex names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
pub enum AudioCodec {
    #[value(name = "dca")]
    #[serde(rename = "dca")]
    Dts,
    #[value(name = "aac")]
    #[serde(rename = "aac")]
    Aac,
    #[value(name = "ac3")]
    #[serde(rename = "ac3")]
    DolbyDigital,
    #[value(name = "eac3")]
    #[serde(rename = "eac3")]
    DolbyDigitalPlus,
    #[value(name = "truehd")]
    #[serde(rename = "truehd")]
    DolbyTrueHd,
    #[value(name = "flac")]
    #[serde(rename = "flac")]
    Flac,
    #[value(name = "mp2")]
    #[serde(rename = "mp2")]
    Mp2,
    #[value(name = "mp3")]
    #[serde(rename = "mp3")]
    Mp3,
    #[value(name = "vorbis")]
    #[serde(rename = "vorbis")]
    Vorbis,
    #[value(name = "pcm")]
    #[serde(rename = "pcm")]
    Pcm,
}

impl AudioCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCodec::Dts => "dca",
            AudioCodec::Aac => "aac",
            AudioCodec::DolbyDigital => "ac3",
            AudioCodec::DolbyDigitalPlus => "eac3",
            AudioCodec::DolbyTrueHd => "truehd",
            AudioCodec::Flac => "flac",
            AudioCodec::Mp2 => "mp2",
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Vorbis => "vorbis",
            AudioCodec::Pcm => "pcm",
        }
    }
}

/// Subtitle formats as Plex names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
pub enum SubtitleCodec {
    #[value(name = "srt")]
    #[serde(rename = "srt")]
    Srt,
    #[value(name = "pgs")]
    #[serde(rename = "pgs")]
    Pgs,
    #[value(name = "vobsub")]
    #[serde(rename = "vobsub")]
    Vobsub,
    #[value(name = "ass")]
    #[serde(rename = "ass")]
    Ass,
    #[value(name = "mov_text")]
    #[serde(rename = "mov_text")]
    MovText,
    #[value(name = "eia_608")]
    #[serde(rename = "eia_608")]
    ClosedCaption,
    #[value(name = "dvb_subtitle")]
    #[serde(rename = "dvb_subtitle")]
    Dvb,
}

impl SubtitleCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleCodec::Srt => "srt",
            SubtitleCodec::Pgs => "pgs",
            SubtitleCodec::Vobsub => "vobsub",
            SubtitleCodec::Ass => "ass",
            SubtitleCodec::MovText => "mov_text",
            SubtitleCodec::ClosedCaption => "eia_608",
            SubtitleCodec::Dvb => "dvb_subtitle",
        }
    }
}

/// The two kinds of playable items plexy touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LibraryType {
    Movie,
    Episode,
}

impl LibraryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryType::Movie => "movie",
            LibraryType::Episode => "episode",
        }
    }

    /// Plex's numeric `type` query value.
    pub fn plex_type(&self) -> u8 {
        match self {
            LibraryType::Movie => 1,
            LibraryType::Episode => 4,
        }
    }

    /// Prefix of the title/year filter fields.
    fn filter_prefix(&self) -> &'static str {
        match self {
            LibraryType::Movie => "movie",
            LibraryType::Episode => "show",
        }
    }
}

/// A title filter: a movie, a show, a season or an episode.
///
/// # Examples
///
/// ```
/// use plexy::types::Title;
///
/// let title: Title = "Game of Thrones (2011) s03e09".parse().unwrap();
/// assert_eq!(title.name, "Game of Thrones");
/// assert_eq!(title.year, Some(2011));
/// assert_eq!(title.season, Some(3));
/// assert_eq!(title.episode, Some(9));
/// assert_eq!(title.to_string(), "Game of Thrones (2011) s03e09");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Title {
    pub name: String,
    pub year: Option<u32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl Title {
    pub fn is_episode(&self) -> bool {
        self.season.is_some() || self.episode.is_some()
    }

    pub fn is_only_name(&self) -> bool {
        self.year.is_none() && !self.is_episode()
    }
}

impl FromStr for Title {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidInput(format!("'{}' is not a valid title", s));
        let caps = TITLE_RE.captures(s.trim()).ok_or_else(invalid)?;

        let name = caps["name"].trim().to_string();
        if name.is_empty() {
            return Err(invalid());
        }

        let number = |group: &str| -> Result<Option<u32>, AppError> {
            caps.name(group)
                .map(|m| m.as_str().parse::<u32>().map_err(|_| invalid()))
                .transpose()
        };

        Ok(Title {
            name,
            year: number("year")?,
            season: number("season")?,
            episode: number("episode")?,
        })
    }
}

impl TryFrom<String> for Title {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(year) = self.year {
            write!(f, " ({:04})", year)?;
        }
        if let Some(season) = self.season {
            write!(f, " s{:02}", season)?;
        }
        if let Some(episode) = self.episode {
            if self.season.is_none() {
                write!(f, " ")?;
            }
            write!(f, "e{:02}", episode)?;
        }
        Ok(())
    }
}

/// A relative age such as `12h` or `1w2d`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Age {
    text: String,
    delta: TimeDelta,
}

impl Age {
    pub fn delta(&self) -> TimeDelta {
        self.delta
    }

    /// The instant this age refers to, counted back from `now`.
    ///
    /// Ages reaching past the earliest representable date clamp to it.
    pub fn before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.delta)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl FromStr for Age {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidInput(format!("'{}' is not a valid age", s));
        let text = s.trim();
        if text.is_empty() {
            return Err(invalid());
        }
        let caps = AGE_RE.captures(text).ok_or_else(invalid)?;

        let amount = |group: &str| -> Result<i64, AppError> {
            caps.name(group)
                .map(|m| m.as_str().parse::<i64>().map_err(|_| invalid()))
                .unwrap_or(Ok(0))
        };

        let delta = TimeDelta::try_weeks(amount("weeks")?)
            .zip(TimeDelta::try_days(amount("days")?))
            .zip(TimeDelta::try_hours(amount("hours")?))
            .and_then(|((w, d), h)| w.checked_add(&d)?.checked_add(&h))
            .ok_or_else(invalid)?;

        Ok(Age {
            text: text.to_string(),
            delta,
        })
    }
}

impl TryFrom<String> for Age {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Server connection settings.
#[derive(Clone)]
pub struct Settings {
    pub url: String,
    pub token: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// One Plex library query: `(field, value)` pairs, field may carry an
/// operator suffix such as `addedAt>>`.
pub type Filter = Vec<(String, String)>;

/// Which items of the library to look at.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub libraries: Vec<String>,
    pub titles: Vec<Title>,
    pub newer: Option<Age>,
    pub older: Option<Age>,
}

impl Criteria {
    fn matching_titles(&self, lib_type: LibraryType) -> Vec<&Title> {
        self.titles
            .iter()
            .filter(|t| lib_type == LibraryType::Episode || !t.is_episode())
            .collect()
    }

    fn base_filter(&self, now: DateTime<Utc>) -> Filter {
        let mut filter = Filter::new();
        if let Some(newer) = &self.newer {
            filter.push(("addedAt>>".to_string(), newer.before(now).timestamp().to_string()));
        }
        if let Some(older) = &self.older {
            filter.push(("addedAt<<".to_string(), older.before(now).timestamp().to_string()));
        }
        filter
    }

    /// Build the queries to run against a section of the given type.
    ///
    /// An empty result means the section has nothing to offer for these
    /// titles and should be skipped.
    pub fn to_filters(&self, lib_type: LibraryType, now: DateTime<Utc>) -> Vec<Filter> {
        let titles = self.matching_titles(lib_type);
        if titles.is_empty() {
            if self.titles.is_empty() {
                return vec![self.base_filter(now)];
            }
            return Vec::new();
        }

        let prefix = lib_type.filter_prefix();
        if titles.iter().all(|t| t.is_only_name()) {
            let names: Vec<&str> = titles.iter().map(|t| t.name.as_str()).collect();
            let mut filter = self.base_filter(now);
            filter.push((format!("{}.title", prefix), names.join(",")));
            return vec![filter];
        }

        titles
            .into_iter()
            .map(|title| {
                let mut filter = self.base_filter(now);
                filter.push((format!("{}.title", prefix), title.name.clone()));
                if let Some(year) = title.year {
                    filter.push((format!("{}.year", prefix), year.to_string()));
                }
                if let Some(season) = title.season {
                    filter.push(("season.index".to_string(), season.to_string()));
                }
                if let Some(episode) = title.episode {
                    filter.push(("episode.index".to_string(), episode.to_string()));
                }
                filter
            })
            .collect()
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.libraries.is_empty() {
            parts.push(format!("in {}", self.libraries.join(",")));
        }
        if !self.titles.is_empty() {
            let titles: Vec<String> = self
                .titles
                .iter()
                .map(|t| format!("with title \"{}\"", t))
                .collect();
            parts.push(titles.join(" or "));
        }
        if let Some(newer) = &self.newer {
            parts.push(format!("newer than {}", newer));
        }
        if let Some(older) = &self.older {
            parts.push(format!("older than {}", older));
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// Track preferences applied to every matching item.
#[derive(Debug, Clone)]
pub struct Preferences {
    pub watching_preference: WatchingPreference,
    pub language: Language,
    pub audio_codecs: HashSet<AudioCodec>,
    pub excluded_audio_codecs: HashSet<AudioCodec>,
    pub subtitle_codecs: HashSet<SubtitleCodec>,
    pub excluded_subtitle_codecs: HashSet<SubtitleCodec>,
    /// Leave partially watched items alone.
    pub skip_watching: bool,
    /// Keep the current selection when it ranks as high as the best candidate.
    pub keep_selected: bool,
    /// Select subtitles even when the audio is already in the desired language.
    pub force_subtitles: bool,
    /// Report every change, not only the counts.
    pub full_summary: bool,
}

impl Preferences {
    pub fn new(watching_preference: WatchingPreference, language: Language) -> Self {
        Self {
            watching_preference,
            language,
            audio_codecs: HashSet::new(),
            excluded_audio_codecs: HashSet::new(),
            subtitle_codecs: HashSet::new(),
            excluded_subtitle_codecs: HashSet::new(),
            skip_watching: false,
            keep_selected: false,
            force_subtitles: false,
            full_summary: false,
        }
    }

    /// Whether an audio stream with this Plex codec may be selected.
    pub fn accepts_audio(&self, codec: &str) -> bool {
        let codec = codec.to_ascii_lowercase();
        if self.excluded_audio_codecs.iter().any(|c| c.as_str() == codec) {
            return false;
        }
        self.audio_codecs.is_empty() || self.audio_codecs.iter().any(|c| c.as_str() == codec)
    }

    /// Whether a subtitle stream with this Plex format may be selected.
    pub fn accepts_subtitle(&self, format: &str) -> bool {
        let format = format.to_ascii_lowercase();
        if self.excluded_subtitle_codecs.iter().any(|c| c.as_str() == format) {
            return false;
        }
        self.subtitle_codecs.is_empty() || self.subtitle_codecs.iter().any(|c| c.as_str() == format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn title(s: &str) -> Title {
        s.parse().unwrap()
    }

    #[test]
    fn test_title_name_only() {
        let t = title("Avatar");
        assert_eq!(t.name, "Avatar");
        assert!(t.is_only_name());
        assert!(!t.is_episode());
    }

    #[test]
    fn test_title_with_year() {
        let t = title("The Matrix (1999)");
        assert_eq!(t.name, "The Matrix");
        assert_eq!(t.year, Some(1999));
        assert!(!t.is_only_name());
        assert!(!t.is_episode());
    }

    #[test]
    fn test_title_season_only() {
        let t = title("The Boys s2");
        assert_eq!(t.name, "The Boys");
        assert_eq!(t.season, Some(2));
        assert_eq!(t.episode, None);
        assert!(t.is_episode());
        assert_eq!(t.to_string(), "The Boys s02");
    }

    #[test]
    fn test_title_episode() {
        let t = title("Chernobyl S01E03");
        assert_eq!(t.name, "Chernobyl");
        assert_eq!(t.season, Some(1));
        assert_eq!(t.episode, Some(3));
    }

    #[test]
    fn test_title_keeps_words_with_s() {
        let t = title("Ocean's Eleven");
        assert_eq!(t.name, "Ocean's Eleven");
        assert!(t.is_only_name());
    }

    #[test]
    fn test_title_rejects_empty_name() {
        assert!("".parse::<Title>().is_err());
        assert!("s01e02".parse::<Title>().is_err());
    }

    #[test]
    fn test_age_parse() {
        assert_eq!("12h".parse::<Age>().unwrap().delta(), TimeDelta::hours(12));
        assert_eq!(
            "1w2d".parse::<Age>().unwrap().delta(),
            TimeDelta::days(9)
        );
        assert_eq!(
            "1w2d3h".parse::<Age>().unwrap().delta(),
            TimeDelta::days(9) + TimeDelta::hours(3)
        );
    }

    #[test]
    fn test_huge_age_clamps_instead_of_overflowing() {
        let age: Age = "15000000w".parse().unwrap();
        assert_eq!(age.before(now()), DateTime::<Utc>::MIN_UTC);

        let criteria = Criteria {
            newer: Some(age),
            ..Default::default()
        };
        let filters = criteria.to_filters(LibraryType::Movie, now());
        let expected = DateTime::<Utc>::MIN_UTC.timestamp().to_string();
        assert_eq!(filters, vec![vec![("addedAt>>".to_string(), expected)]]);
    }

    #[test]
    fn test_age_invalid() {
        assert!("".parse::<Age>().is_err());
        assert!("2d1w".parse::<Age>().is_err());
        assert!("3m".parse::<Age>().is_err());
    }

    #[test]
    fn test_filters_without_titles() {
        let criteria = Criteria {
            newer: Some("1d".parse().unwrap()),
            ..Default::default()
        };
        let filters = criteria.to_filters(LibraryType::Movie, now());
        let expected = (now() - TimeDelta::days(1)).timestamp().to_string();
        assert_eq!(filters, vec![vec![("addedAt>>".to_string(), expected)]]);
    }

    #[test]
    fn test_filters_no_criteria_is_one_empty_query() {
        let criteria = Criteria::default();
        assert_eq!(criteria.to_filters(LibraryType::Episode, now()), vec![Filter::new()]);
    }

    #[test]
    fn test_filters_name_only_titles_are_merged() {
        let criteria = Criteria {
            titles: vec![title("Avatar"), title("Alien")],
            ..Default::default()
        };
        let filters = criteria.to_filters(LibraryType::Movie, now());
        assert_eq!(
            filters,
            vec![vec![("movie.title".to_string(), "Avatar,Alien".to_string())]]
        );
    }

    #[test]
    fn test_filters_episode_titles_skipped_for_movies() {
        let criteria = Criteria {
            titles: vec![title("Chernobyl s01e03")],
            ..Default::default()
        };
        assert!(criteria.to_filters(LibraryType::Movie, now()).is_empty());

        let filters = criteria.to_filters(LibraryType::Episode, now());
        assert_eq!(
            filters,
            vec![vec![
                ("show.title".to_string(), "Chernobyl".to_string()),
                ("season.index".to_string(), "1".to_string()),
                ("episode.index".to_string(), "3".to_string()),
            ]]
        );
    }

    #[test]
    fn test_filters_one_query_per_detailed_title() {
        let criteria = Criteria {
            titles: vec![title("Avatar"), title("The Matrix (1999)")],
            older: Some("2w".parse().unwrap()),
            ..Default::default()
        };
        let filters = criteria.to_filters(LibraryType::Movie, now());
        let older = (now() - TimeDelta::weeks(2)).timestamp().to_string();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0][0], ("addedAt<<".to_string(), older));
        assert_eq!(filters[0][1], ("movie.title".to_string(), "Avatar".to_string()));
        assert_eq!(filters[1][2], ("movie.year".to_string(), "1999".to_string()));
    }

    #[test]
    fn test_criteria_display() {
        let criteria = Criteria {
            libraries: vec!["Movies".to_string()],
            titles: vec![title("Avatar"), title("Alien")],
            newer: Some("1w".parse().unwrap()),
            older: None,
        };
        assert_eq!(
            criteria.to_string(),
            "in Movies with title \"Avatar\" or with title \"Alien\" newer than 1w"
        );
    }

    #[test]
    fn test_codec_filters() {
        let mut prefs = Preferences::new(WatchingPreference::Dubbed, Language::from_ietf("en").unwrap());
        assert!(prefs.accepts_audio("dca"));

        prefs.excluded_audio_codecs.insert(AudioCodec::Dts);
        assert!(!prefs.accepts_audio("DCA"));
        assert!(prefs.accepts_audio("aac"));

        prefs.audio_codecs.insert(AudioCodec::DolbyDigital);
        assert!(!prefs.accepts_audio("aac"));
        assert!(prefs.accepts_audio("ac3"));

        prefs.subtitle_codecs.insert(SubtitleCodec::Srt);
        prefs.excluded_subtitle_codecs.insert(SubtitleCodec::Srt);
        assert!(!prefs.accepts_subtitle("srt"));
    }

    #[test]
    fn test_watching_preference_deserialize() {
        let pref: WatchingPreference = serde_json::from_str("\"dubbed\"").unwrap();
        assert_eq!(pref, WatchingPreference::Dubbed);
        let codec: SubtitleCodec = serde_json::from_str("\"eia_608\"").unwrap();
        assert_eq!(codec, SubtitleCodec::ClosedCaption);
    }
}
