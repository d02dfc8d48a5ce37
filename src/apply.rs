//! Applying preferences to videos and tallying what changed.

use std::collections::BTreeMap;

use log::debug;

use crate::api::MediaServer;
use crate::error::Result;
use crate::media::Video;
use crate::selection::{self, Change};
use crate::types::{LibraryType, Preferences};

/// What a run did, per library type.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    total: BTreeMap<LibraryType, usize>,
    changed: BTreeMap<LibraryType, usize>,
    changes: Vec<Change>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one processed video; its changes are kept only when asked to.
    pub fn record(&mut self, kind: LibraryType, changes: Vec<Change>, keep_changes: bool) {
        *self.total.entry(kind).or_default() += 1;
        if !changes.is_empty() {
            *self.changed.entry(kind).or_default() += 1;
            if keep_changes {
                self.changes.extend(changes);
            }
        }
    }

    pub fn total(&self, kind: LibraryType) -> usize {
        self.total.get(&kind).copied().unwrap_or(0)
    }

    pub fn changed(&self, kind: LibraryType) -> usize {
        self.changed.get(&kind).copied().unwrap_or(0)
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }
}

async fn apply_change<S: MediaServer>(server: &S, change: &Change) -> Result<()> {
    if change.audio_changed() {
        if let Some(audio) = &change.audio {
            server.set_audio_stream(change.part_id, audio.id).await?;
        }
    }
    if change.subtitle_changed() {
        match &change.subtitle {
            Some(subtitle) => server.set_subtitle_stream(change.part_id, subtitle.id).await?,
            None => server.reset_subtitle_stream(change.part_id).await?,
        }
    }
    Ok(())
}

/// Select streams for every part of a video and save them on the server.
///
/// With `dry_run` the changes are computed and returned but not saved.
pub async fn save_preferences<S: MediaServer>(
    server: &S,
    video: &Video,
    prefs: &Preferences,
    dry_run: bool,
) -> Result<Vec<Change>> {
    let title = video.to_display();
    debug!("Retrieving information for {}", title);

    let parts = server.media_parts(video).await?;
    debug!("Found {} parts for video {}", parts.len(), title);

    let mut changes = Vec::new();
    for part in &parts {
        debug!("Inspecting {}", part.file);
        if let Some(change) = selection::select(&title, part, prefs) {
            if !dry_run {
                apply_change(server, &change).await?;
            }
            changes.push(change);
        }
    }

    Ok(changes)
}

/// Apply preferences to every video, one at a time.
///
/// `on_done` is called after each video, skipped or not, to drive progress
/// output.
pub async fn apply_all<S, F>(
    server: &S,
    videos: &[Video],
    prefs: &Preferences,
    dry_run: bool,
    mut on_done: F,
) -> Result<Summary>
where
    S: MediaServer,
    F: FnMut(&Video),
{
    let mut summary = Summary::new();
    for video in videos {
        if prefs.skip_watching && video.is_in_progress() {
            debug!("Skipping {}: currently being watched", video);
            on_done(video);
            continue;
        }

        let changes = save_preferences(server, video, prefs, dry_run).await?;
        summary.record(video.kind, changes, prefs.full_summary);
        on_done(video);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(video: &str) -> Change {
        Change {
            video: video.to_string(),
            part_id: 1,
            previous_audio: None,
            previous_subtitle: None,
            audio: None,
            subtitle: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = Summary::new();
        summary.record(LibraryType::Movie, vec![change("A")], false);
        summary.record(LibraryType::Movie, vec![], false);
        summary.record(LibraryType::Episode, vec![change("B"), change("B")], false);

        assert_eq!(summary.total(LibraryType::Movie), 2);
        assert_eq!(summary.changed(LibraryType::Movie), 1);
        assert_eq!(summary.total(LibraryType::Episode), 1);
        assert_eq!(summary.changed(LibraryType::Episode), 1);
        assert!(summary.changes().is_empty());
    }

    #[test]
    fn test_summary_keeps_changes_when_asked() {
        let mut summary = Summary::new();
        summary.record(LibraryType::Episode, vec![change("B"), change("C")], true);
        assert_eq!(summary.changes().len(), 2);
        assert_eq!(summary.changes()[1].video, "C");
    }
}
