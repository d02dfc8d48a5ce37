//! Library items as plexy sees them: videos, their parts and the streams of
//! each part.

use std::fmt;

use crate::language::Language;
use crate::types::LibraryType;

/// A library section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub key: String,
    pub title: String,
    /// `movie`, `show`, `artist`, `photo`...
    pub kind: String,
}

impl Section {
    /// The item type to search for in this section, if plexy handles it.
    pub fn library_type(&self) -> Option<LibraryType> {
        match self.kind.as_str() {
            "movie" => Some(LibraryType::Movie),
            "show" => Some(LibraryType::Episode),
            _ => None,
        }
    }
}

/// A movie or an episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub rating_key: String,
    pub kind: LibraryType,
    pub title: String,
    pub year: Option<u32>,
    /// Show title, for episodes.
    pub show_title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Playback position in milliseconds; non-zero while partially watched.
    pub view_offset: u64,
}

impl Video {
    pub fn is_in_progress(&self) -> bool {
        self.view_offset > 0
    }

    /// Format the video for logs and summaries.
    ///
    /// # Examples
    ///
    /// ```
    /// use plexy::media::Video;
    /// use plexy::types::LibraryType;
    ///
    /// let episode = Video {
    ///     rating_key: "42".to_string(),
    ///     kind: LibraryType::Episode,
    ///     title: "Please Remain Calm".to_string(),
    ///     year: Some(2019),
    ///     show_title: Some("Chernobyl".to_string()),
    ///     season: Some(1),
    ///     episode: Some(2),
    ///     view_offset: 0,
    /// };
    /// assert_eq!(episode.to_display(), "Chernobyl - s01e02 - Please Remain Calm");
    /// ```
    pub fn to_display(&self) -> String {
        match self.kind {
            LibraryType::Episode => format!(
                "{} - s{:02}e{:02} - {}",
                self.show_title.as_deref().unwrap_or("Unknown show"),
                self.season.unwrap_or(0),
                self.episode.unwrap_or(0),
                self.title
            ),
            LibraryType::Movie => match self.year {
                Some(year) => format!("{} ({})", self.title, year),
                None => self.title.clone(),
            },
        }
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

/// A stream of a media part with its language already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub id: u64,
    pub kind: StreamKind,
    pub language: Language,
    pub codec: String,
    /// Subtitle format (`srt`, `pgs`...), when Plex reports one.
    pub format: Option<String>,
    pub display_title: String,
    pub selected: bool,
    pub default: bool,
    pub commentary: bool,
    pub hearing_impaired: bool,
    pub closed_caption: bool,
}

impl Stream {
    /// The format the subtitle codec filters look at.
    pub fn subtitle_format(&self) -> &str {
        self.format.as_deref().unwrap_or(&self.codec)
    }

    /// Same stream, regardless of the selection flags.
    pub fn same_as(&self, other: &Stream) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.language, self.display_title)
    }
}

/// One file of a video; stream defaults are set per part.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPart {
    pub id: u64,
    pub file: String,
    pub streams: Vec<Stream>,
}

impl MediaPart {
    pub fn streams_of(&self, kind: StreamKind) -> impl Iterator<Item = &Stream> {
        self.streams.iter().filter(move |s| s.kind == kind)
    }

    pub fn selected_audio(&self) -> Option<&Stream> {
        self.streams_of(StreamKind::Audio).find(|s| s.selected)
    }

    pub fn selected_subtitle(&self) -> Option<&Stream> {
        self.streams_of(StreamKind::Subtitle).find(|s| s.selected)
    }

    /// The language the part was produced in.
    ///
    /// Video streams are asked first, then audio streams; default streams
    /// win over non-default ones and undetermined languages are ignored.
    pub fn original_language(&self) -> Option<&Language> {
        [StreamKind::Video, StreamKind::Audio]
            .into_iter()
            .find_map(|kind| {
                let known = || self.streams_of(kind).filter(|s| !s.language.is_undetermined());
                known().find(|s| s.default).or_else(|| known().next())
            })
            .map(|s| &s.language)
    }
}
