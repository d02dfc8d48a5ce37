//! API client for interacting with a Plex media server.
//!
//! This module provides the [`MediaServer`] trait the rest of the crate talks
//! to, and [`PlexClient`], its implementation over Plex's HTTP API.

use std::time::Duration;

use log::{debug, info};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::guess;
use crate::media::{MediaPart, Section, Stream, StreamKind, Video};
use crate::types::{Filter, LibraryType, Settings};

const PRODUCT: &str = "plexy";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The server operations plexy needs.
///
/// Every call is awaited before the next one is issued; implementations
/// don't need to be thread-safe.
#[allow(async_fn_in_trait)]
pub trait MediaServer {
    /// All library sections.
    async fn sections(&self) -> Result<Vec<Section>>;

    /// Items of `lib_type` in a section matching one filter.
    async fn search(&self, section: &Section, lib_type: LibraryType, filter: &Filter) -> Result<Vec<Video>>;

    /// Fresh media parts of a video, streams included.
    async fn media_parts(&self, video: &Video) -> Result<Vec<MediaPart>>;

    async fn set_audio_stream(&self, part_id: u64, stream_id: u64) -> Result<()>;

    async fn set_subtitle_stream(&self, part_id: u64, stream_id: u64) -> Result<()>;

    /// Turn subtitles off for a part.
    async fn reset_subtitle_stream(&self, part_id: u64) -> Result<()>;
}

// Response types. Plex wraps every payload in a MediaContainer.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SectionsContainer {
    #[serde(rename = "Directory", default)]
    directory: Vec<RawSection>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    key: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<RawVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideo {
    rating_key: String,
    #[serde(rename = "type")]
    kind: String,
    title: String,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    grandparent_title: Option<String>,
    #[serde(default)]
    parent_index: Option<u32>,
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    view_offset: u64,
    #[serde(rename = "Media", default)]
    media: Vec<RawMedia>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    #[serde(rename = "Part", default)]
    parts: Vec<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    id: u64,
    #[serde(default)]
    file: String,
    #[serde(rename = "Stream", default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStream {
    id: u64,
    stream_type: u8,
    #[serde(default)]
    codec: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    language_tag: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    display_title: Option<String>,
    #[serde(default)]
    extended_display_title: Option<String>,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    hearing_impaired: bool,
}

impl RawVideo {
    fn into_video(self, lib_type: LibraryType) -> Video {
        let is_episode = lib_type == LibraryType::Episode;
        Video {
            rating_key: self.rating_key,
            kind: lib_type,
            title: self.title,
            year: self.year,
            show_title: self.grandparent_title.filter(|_| is_episode),
            season: self.parent_index.filter(|_| is_episode),
            episode: self.index.filter(|_| is_episode),
            view_offset: self.view_offset,
        }
    }
}

impl RawStream {
    /// Resolve language and flags; `None` for stream types plexy ignores.
    fn into_stream(self) -> Option<Stream> {
        let kind = match self.stream_type {
            1 => StreamKind::Video,
            2 => StreamKind::Audio,
            3 => StreamKind::Subtitle,
            _ => return None,
        };

        let title = guess::best_title([
            self.extended_display_title.as_deref(),
            self.display_title.as_deref(),
            self.title.as_deref(),
        ]);
        let expected = guess::expected_languages(&[
            self.language_tag.as_deref(),
            self.language_code.as_deref(),
            self.language.as_deref(),
        ]);
        let hint = match expected.as_slice() {
            [only] => Some(only),
            _ => None,
        };
        let guessed = title.map(|t| guess::guess(t, hint)).unwrap_or_default();
        let language = guess::resolve_language(&expected, guessed.language.as_ref());

        let codec = self.codec.unwrap_or_default().to_ascii_lowercase();
        let closed_caption =
            guessed.closed_caption || (kind == StreamKind::Subtitle && codec == "eia_608");
        let display_title = self
            .display_title
            .clone()
            .or_else(|| title.map(str::to_string))
            .unwrap_or_else(|| language.name().to_string());

        Some(Stream {
            id: self.id,
            kind,
            language,
            codec,
            format: self.format.map(|f| f.to_ascii_lowercase()),
            display_title,
            selected: self.selected,
            default: self.default,
            commentary: guessed.commentary,
            hearing_impaired: guessed.hearing_impaired || self.hearing_impaired,
            closed_caption,
        })
    }
}

impl RawPart {
    fn into_part(self) -> MediaPart {
        MediaPart {
            id: self.id,
            file: self.file,
            streams: self.streams.into_iter().filter_map(RawStream::into_stream).collect(),
        }
    }
}

/// Join a base URL, a path and query pairs.
///
/// Field names are left as is since Plex filter operators (`addedAt>>`) live
/// in them; values are percent-encoded.
///
/// # Examples
///
/// ```
/// use plexy::api::build_url;
///
/// let query = vec![("show.title".to_string(), "The Boys".to_string())];
/// assert_eq!(
///     build_url("http://plex:32400/", "/library/sections/2/all", &query),
///     "http://plex:32400/library/sections/2/all?show.title=The%20Boys"
/// );
/// ```
pub fn build_url(base_url: &str, path: &str, query: &[(String, String)]) -> String {
    let mut url = format!("{}{}", base_url.trim_end_matches('/'), path);
    if !query.is_empty() {
        let pairs: Vec<String> = query
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        url.push('?');
        url.push_str(&pairs.join("&"));
    }
    url
}

/// HTTP client for one Plex server.
pub struct PlexClient {
    client: reqwest::Client,
    base_url: String,
}

impl PlexClient {
    /// Build a client without contacting the server.
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut token = HeaderValue::from_str(&settings.token)
            .map_err(|_| AppError::Config("token contains invalid characters".to_string()))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-plex-token", token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-plex-product", HeaderValue::from_static(PRODUCT));
        headers.insert("x-plex-client-identifier", HeaderValue::from_static(PRODUCT));
        headers.insert(
            "x-plex-version",
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.url.clone(),
        })
    }

    /// Build a client and check the server accepts the token.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let plex = Self::new(settings)?;
        let info: ServerInfo = plex.get("/", &[]).await?;
        info!(
            "Connected to {} ({} {})",
            settings.url,
            info.friendly_name.as_deref().unwrap_or("Plex"),
            info.version.as_deref().unwrap_or("unknown version")
        );
        Ok(plex)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<T> {
        let url = build_url(&self.base_url, path, query);
        debug!("GET {}", url);

        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| AppError::Parse(format!("Unexpected response from {}: {}", path, e)))?;
        Ok(envelope.media_container)
    }

    async fn put(&self, path: &str, query: &[(String, String)]) -> Result<()> {
        let url = build_url(&self.base_url, path, query);
        debug!("PUT {}", url);

        self.client.put(&url).send().await?.error_for_status()?;
        Ok(())
    }

    async fn set_part_streams(&self, part_id: u64, field: &str, stream_id: u64) -> Result<()> {
        let query = vec![
            (field.to_string(), stream_id.to_string()),
            ("allParts".to_string(), "1".to_string()),
        ];
        self.put(&format!("/library/parts/{}", part_id), &query).await
    }
}

impl MediaServer for PlexClient {
    async fn sections(&self) -> Result<Vec<Section>> {
        let container: SectionsContainer = self.get("/library/sections", &[]).await?;
        Ok(container
            .directory
            .into_iter()
            .map(|raw| Section {
                key: raw.key,
                title: raw.title,
                kind: raw.kind,
            })
            .collect())
    }

    async fn search(&self, section: &Section, lib_type: LibraryType, filter: &Filter) -> Result<Vec<Video>> {
        let mut query = vec![("type".to_string(), lib_type.plex_type().to_string())];
        query.extend(filter.iter().cloned());

        let path = format!("/library/sections/{}/all", section.key);
        let container: MetadataContainer = self.get(&path, &query).await?;
        Ok(container
            .metadata
            .into_iter()
            .filter(|raw| raw.kind == lib_type.as_str())
            .map(|raw| raw.into_video(lib_type))
            .collect())
    }

    async fn media_parts(&self, video: &Video) -> Result<Vec<MediaPart>> {
        let path = format!("/library/metadata/{}", video.rating_key);
        let container: MetadataContainer = self.get(&path, &[]).await?;
        let raw = container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("metadata for {}", video)))?;

        Ok(raw
            .media
            .into_iter()
            .flat_map(|media| media.parts)
            .map(RawPart::into_part)
            .collect())
    }

    async fn set_audio_stream(&self, part_id: u64, stream_id: u64) -> Result<()> {
        self.set_part_streams(part_id, "audioStreamID", stream_id).await
    }

    async fn set_subtitle_stream(&self, part_id: u64, stream_id: u64) -> Result<()> {
        self.set_part_streams(part_id, "subtitleStreamID", stream_id).await
    }

    async fn reset_subtitle_stream(&self, part_id: u64) -> Result<()> {
        self.set_part_streams(part_id, "subtitleStreamID", 0).await
    }
}
