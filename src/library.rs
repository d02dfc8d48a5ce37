//! Walking the library: which sections to visit and which videos in them
//! match the criteria.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::debug;

use crate::api::MediaServer;
use crate::error::{AppError, Result};
use crate::media::{Section, Video};
use crate::types::Criteria;

/// Resolve the sections named in the criteria, or all of them.
pub async fn find_sections<S: MediaServer>(server: &S, criteria: &Criteria) -> Result<Vec<Section>> {
    let sections = server.sections().await?;
    if criteria.libraries.is_empty() {
        return Ok(sections);
    }

    criteria
        .libraries
        .iter()
        .map(|name| {
            sections
                .iter()
                .find(|s| s.title.to_lowercase() == name.to_lowercase())
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("library '{}'", name)))
        })
        .collect()
}

/// Find every movie and episode matching the criteria.
///
/// Videos are returned in section order, then in the order the server lists
/// them; a video matched by several title filters appears once.
pub async fn search<S: MediaServer>(server: &S, criteria: &Criteria, now: DateTime<Utc>) -> Result<Vec<Video>> {
    let sections = find_sections(server, criteria).await?;
    debug!("Found {} sections", sections.len());

    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for section in &sections {
        let Some(lib_type) = section.library_type() else {
            debug!("Skipping section {} of type {}", section.title, section.kind);
            continue;
        };

        debug!("Entering section {}", section.title);
        for filter in criteria.to_filters(lib_type, now) {
            let videos = server.search(section, lib_type, &filter).await?;
            debug!(
                "Found {} {}s in section {}",
                videos.len(),
                lib_type.as_str(),
                section.title
            );
            results.extend(
                videos
                    .into_iter()
                    .filter(|v| seen.insert(v.rating_key.clone())),
            );
        }
    }

    Ok(results)
}
