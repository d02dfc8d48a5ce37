//! Track selection.
//!
//! Given the streams of one media part and the user's [`Preferences`], pick
//! the audio and subtitle streams that should be the part's defaults. This
//! module is pure: it never talks to the server.

use log::debug;

use crate::language::Language;
use crate::media::{MediaPart, Stream, StreamKind};
use crate::types::{Preferences, WatchingPreference};

/// A new selection for a part, together with what it replaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Display title of the video the part belongs to.
    pub video: String,
    pub part_id: u64,
    pub previous_audio: Option<Stream>,
    pub previous_subtitle: Option<Stream>,
    pub audio: Option<Stream>,
    pub subtitle: Option<Stream>,
}

impl Change {
    pub fn audio_changed(&self) -> bool {
        !same_stream(self.previous_audio.as_ref(), self.audio.as_ref())
    }

    pub fn subtitle_changed(&self) -> bool {
        !same_stream(self.previous_subtitle.as_ref(), self.subtitle.as_ref())
    }
}

fn same_stream(a: Option<&Stream>, b: Option<&Stream>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_as(b),
        (None, None) => true,
        _ => false,
    }
}

/// Sort key of a candidate stream; smaller is better.
///
/// Language family first, so a commentary track in the wanted language still
/// beats a regular track in another one. Within the family, plain tracks come
/// before commentary, closed captions and SDH, then regional closeness decides.
type Rank = (bool, bool, bool, bool, u8);

fn rank(stream: &Stream, target: Option<&Language>) -> Rank {
    let (foreign, distance) = match target {
        Some(target) => (!stream.language.same_base(target), stream.language.distance(target)),
        None => (false, 0),
    };
    (
        foreign,
        stream.commentary,
        stream.closed_caption,
        stream.hearing_impaired,
        distance,
    )
}

fn sort_by_rank<'a>(mut streams: Vec<&'a Stream>, target: Option<&Language>) -> Vec<&'a Stream> {
    // stable: equal ranks keep the order the server returned
    streams.sort_by_key(|s| rank(s, target));
    streams
}

/// The language audio is ranked against.
fn audio_target<'a>(part: &'a MediaPart, prefs: &'a Preferences) -> Option<&'a Language> {
    match prefs.watching_preference {
        WatchingPreference::Dubbed => Some(&prefs.language),
        WatchingPreference::Original => part.original_language(),
    }
}

/// Acceptable audio streams, best first.
pub fn sorted_audio_streams<'a>(part: &'a MediaPart, prefs: &'a Preferences) -> Vec<&'a Stream> {
    let candidates = part
        .streams_of(StreamKind::Audio)
        .filter(|s| prefs.accepts_audio(&s.codec))
        .collect();
    sort_by_rank(candidates, audio_target(part, prefs))
}

/// Acceptable subtitle streams, best first.
pub fn sorted_subtitle_streams<'a>(part: &'a MediaPart, prefs: &Preferences) -> Vec<&'a Stream> {
    let candidates = part
        .streams_of(StreamKind::Subtitle)
        .filter(|s| prefs.accepts_subtitle(s.subtitle_format()))
        .collect();
    sort_by_rank(candidates, Some(&prefs.language))
}

fn pick<'a>(
    candidates: &[&'a Stream],
    previous: Option<&'a Stream>,
    target: Option<&Language>,
    keep_selected: bool,
) -> Option<&'a Stream> {
    let Some(best) = candidates.first().copied() else {
        return previous;
    };

    if keep_selected {
        if let Some(previous) = previous {
            let is_candidate = candidates.iter().any(|c| c.same_as(previous));
            if is_candidate && rank(previous, target) == rank(best, target) {
                return Some(previous);
            }
        }
    }

    Some(best)
}

/// Decide the audio and subtitle streams for one part.
///
/// Returns `None` when the current selection already satisfies the
/// preferences, so running twice yields no change the second time.
pub fn select(video: &str, part: &MediaPart, prefs: &Preferences) -> Option<Change> {
    let previous_audio = part.selected_audio();
    let previous_subtitle = part.selected_subtitle();

    let audio_candidates = sorted_audio_streams(part, prefs);
    let audio = pick(
        &audio_candidates,
        previous_audio,
        audio_target(part, prefs),
        prefs.keep_selected,
    );

    let audio_in_language = audio.is_some_and(|a| a.language == prefs.language);
    let subtitle = if audio_in_language && !prefs.force_subtitles {
        None
    } else {
        let subtitle_candidates = sorted_subtitle_streams(part, prefs);
        pick(
            &subtitle_candidates,
            previous_subtitle,
            Some(&prefs.language),
            prefs.keep_selected,
        )
    };

    let change = Change {
        video: video.to_string(),
        part_id: part.id,
        previous_audio: previous_audio.cloned(),
        previous_subtitle: previous_subtitle.cloned(),
        audio: audio.cloned(),
        subtitle: subtitle.cloned(),
    };

    if !change.audio_changed() && !change.subtitle_changed() {
        return None;
    }

    if change.audio_changed() {
        if let Some(audio) = &change.audio {
            debug!("{} - new audio track in {} selected: {}", video, audio.language, audio);
        }
    }
    if change.subtitle_changed() {
        match &change.subtitle {
            Some(subtitle) => debug!(
                "{} - new subtitle in {} selected: {}",
                video, subtitle.language, subtitle
            ),
            None => debug!("{} - no subtitle selected", video),
        }
    }

    Some(change)
}

impl MediaPart {
    /// Mark the streams of a change as selected, the way the server does after
    /// the change is applied.
    pub fn apply_change(&mut self, change: &Change) {
        let audio = change.audio.as_ref().map(|s| s.id);
        let subtitle = change.subtitle.as_ref().map(|s| s.id);
        for stream in &mut self.streams {
            match stream.kind {
                StreamKind::Audio if change.audio_changed() => {
                    stream.selected = Some(stream.id) == audio;
                }
                StreamKind::Subtitle if change.subtitle_changed() => {
                    stream.selected = Some(stream.id) == subtitle;
                }
                _ => {}
            }
        }
    }
}
