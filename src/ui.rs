//! Terminal output: the progress bar and the end-of-run summary.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::apply::Summary;
use crate::media::Stream;
use crate::selection::Change;
use crate::types::{Criteria, LibraryType};

/// Progress bar over the videos being configured; hidden when debug logging
/// would interleave with it.
pub fn progress_bar(len: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len);
    let template = "Configuring watching preferences [{bar:36}] {pos}/{len} {wide_msg}";
    if let Ok(bar_style) = ProgressStyle::with_template(template) {
        bar.set_style(bar_style.progress_chars("#>-"));
    }
    bar
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// One line per library type that had videos.
///
/// # Examples
///
/// ```
/// use plexy::apply::Summary;
/// use plexy::types::LibraryType;
///
/// console::set_colors_enabled(false);
/// let mut summary = Summary::new();
/// summary.record(LibraryType::Movie, vec![], false);
/// summary.record(LibraryType::Movie, vec![], false);
/// assert_eq!(
///     plexy::ui::count_lines(&summary),
///     vec!["0 movies changed out of 2 selected movies"]
/// );
/// ```
pub fn count_lines(summary: &Summary) -> Vec<String> {
    [LibraryType::Movie, LibraryType::Episode]
        .into_iter()
        .filter(|kind| summary.total(*kind) > 0)
        .map(|kind| {
            let changed = summary.changed(kind);
            let total = summary.total(kind);
            format!(
                "{} {}{} changed out of {} selected {}{}",
                style(changed).bold().green(),
                kind.as_str(),
                plural(changed),
                style(total).bold().blue(),
                kind.as_str(),
                plural(total)
            )
        })
        .collect()
}

fn before(stream: &Stream) -> String {
    style(stream.to_string()).bold().yellow().to_string()
}

fn after(stream: &Stream) -> String {
    style(stream.to_string()).bold().green().to_string()
}

/// Describe one change, e.g. `Avatar (2009) changed audio from en: ... to pt-BR: ...`.
pub fn change_line(change: &Change) -> String {
    let mut texts = Vec::new();

    if change.audio_changed() {
        if let (Some(previous), Some(audio)) = (&change.previous_audio, &change.audio) {
            texts.push(format!("changed audio from {} to {}", before(previous), after(audio)));
        } else if let Some(audio) = &change.audio {
            texts.push(format!("selected audio {}", after(audio)));
        }
    }

    if change.subtitle_changed() {
        if let (Some(previous), Some(subtitle)) = (&change.previous_subtitle, &change.subtitle) {
            texts.push(format!(
                "changed subtitles from {} to {}",
                before(previous),
                after(subtitle)
            ));
        } else if let Some(subtitle) = &change.subtitle {
            texts.push(format!(
                "changed from {} subtitles to {} subtitles",
                style("no").bold().yellow(),
                after(subtitle)
            ));
        } else if let Some(previous) = &change.previous_subtitle {
            texts.push(format!(
                "changed from {} to {} subtitles",
                before(previous),
                style("no").bold().green()
            ));
        }
    }

    format!("{} {}", style(&change.video).bold().blue(), texts.join(" and "))
}

pub fn no_video_line(criteria: &Criteria) -> String {
    format!("No video found {}", criteria).trim_end().to_string()
}
