//! Configuration file support for plexy.
//!
//! Settings come from three places: command-line flags, an optional config
//! file and built-in defaults, in that order of precedence. The file is TOML
//! unless its extension says JSON or YAML.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::language::Language;
use crate::types::{
    Age, AudioCodec, Criteria, Preferences, Settings, SubtitleCodec, Title, WatchingPreference,
};

/// Every setting plexy understands, all optional until resolved.
///
/// The same struct holds what the file says and what the command line says,
/// so the two can be merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plex server base URL
    pub url: Option<String>,

    /// Plex authentication token
    pub token: Option<String>,

    /// Library sections to visit; all of them when empty
    pub library: Vec<String>,

    /// Title filters
    pub title: Vec<Title>,

    /// Desired language as an IETF tag
    pub language: Option<Language>,

    pub watching_preference: Option<WatchingPreference>,

    pub audio_codec: Vec<AudioCodec>,
    pub excluded_audio_codec: Vec<AudioCodec>,
    pub subtitle_codec: Vec<SubtitleCodec>,
    pub excluded_subtitle_codec: Vec<SubtitleCodec>,

    /// Only items added more recently than this
    pub newer: Option<Age>,

    /// Only items added before this
    pub older: Option<Age>,

    pub full_summary: bool,
    pub skip_watching: bool,
    pub keep_selected: bool,
    pub force_subtitles: bool,
    pub dry_run: bool,
}

/// A fully resolved configuration, ready to run.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub settings: Settings,
    pub criteria: Criteria,
    pub preferences: Preferences,
    pub dry_run: bool,
}

/// File formats the config may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Format::Json,
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Toml,
        }
    }
}

fn merge_list<T>(cli: Vec<T>, file: Vec<T>) -> Vec<T> {
    if cli.is_empty() { file } else { cli }
}

impl Config {
    /// Get the path to the default config file.
    ///
    /// Returns ~/.config/plexy/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("plexy");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the default config file.
    ///
    /// Returns an empty config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load a config file that must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!("Loaded config from {}", path.display());
        Self::parse(&content, Format::from_path(path))
    }

    fn parse(content: &str, format: Format) -> Result<Self> {
        let config = match format {
            Format::Toml => toml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
            Format::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(config)
    }

    /// Layer `cli` on top of this file config.
    ///
    /// Values given on the command line win, non-empty lists replace the
    /// file's lists and boolean flags are OR-ed.
    pub fn merge(self, cli: Config) -> Config {
        Config {
            url: cli.url.or(self.url),
            token: cli.token.or(self.token),
            library: merge_list(cli.library, self.library),
            title: merge_list(cli.title, self.title),
            language: cli.language.or(self.language),
            watching_preference: cli.watching_preference.or(self.watching_preference),
            audio_codec: merge_list(cli.audio_codec, self.audio_codec),
            excluded_audio_codec: merge_list(cli.excluded_audio_codec, self.excluded_audio_codec),
            subtitle_codec: merge_list(cli.subtitle_codec, self.subtitle_codec),
            excluded_subtitle_codec: merge_list(
                cli.excluded_subtitle_codec,
                self.excluded_subtitle_codec,
            ),
            newer: cli.newer.or(self.newer),
            older: cli.older.or(self.older),
            full_summary: cli.full_summary || self.full_summary,
            skip_watching: cli.skip_watching || self.skip_watching,
            keep_selected: cli.keep_selected || self.keep_selected,
            force_subtitles: cli.force_subtitles || self.force_subtitles,
            dry_run: cli.dry_run || self.dry_run,
        }
    }

    /// Check the required settings are present and build the run settings.
    pub fn resolve(self) -> Result<Resolved> {
        let missing = |what: &str| AppError::Config(format!("{} is required", what));

        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| missing("url"))?;
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| missing("token"))?;
        let language = self.language.ok_or_else(|| missing("language"))?;
        let watching_preference = self
            .watching_preference
            .ok_or_else(|| missing("watching preference"))?;

        let mut preferences = Preferences::new(watching_preference, language);
        preferences.audio_codecs = self.audio_codec.into_iter().collect();
        preferences.excluded_audio_codecs = self.excluded_audio_codec.into_iter().collect();
        preferences.subtitle_codecs = self.subtitle_codec.into_iter().collect();
        preferences.excluded_subtitle_codecs = self.excluded_subtitle_codec.into_iter().collect();
        preferences.skip_watching = self.skip_watching;
        preferences.keep_selected = self.keep_selected;
        preferences.force_subtitles = self.force_subtitles;
        preferences.full_summary = self.full_summary;

        Ok(Resolved {
            settings: Settings {
                url: url.trim_end_matches('/').to_string(),
                token,
            },
            criteria: Criteria {
                libraries: self.library,
                titles: self.title,
                newer: self.newer,
                older: self.older,
            },
            preferences,
            dry_run: self.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn complete() -> Config {
        Config {
            url: Some("http://localhost:32400/".to_string()),
            token: Some("secret".to_string()),
            language: Some(Language::from_ietf("pt-BR").unwrap()),
            watching_preference: Some(WatchingPreference::Dubbed),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_empty() {
        let config = Config::default();
        assert!(config.url.is_none());
        assert!(config.library.is_empty());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            url = "http://plex:32400"
            token = "abc"
            language = "pt-BR"
            watching_preference = "original"
            library = ["Movies", "TV Shows"]
            title = ["The Boys s02"]
            excluded_audio_codec = ["dca"]
            newer = "2w"
            skip_watching = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.url.as_deref(), Some("http://plex:32400"));
        assert_eq!(config.language.unwrap().to_string(), "pt-BR");
        assert_eq!(config.watching_preference, Some(WatchingPreference::Original));
        assert_eq!(config.library, vec!["Movies", "TV Shows"]);
        assert_eq!(config.title[0].season, Some(2));
        assert_eq!(config.excluded_audio_codec, vec![AudioCodec::Dts]);
        assert_eq!(config.newer.unwrap().to_string(), "2w");
        assert!(config.skip_watching);
        assert!(!config.keep_selected);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(Config::parse("language = \"zz-top\"", Format::Toml).is_err());
        assert!(Config::parse("newer = \"3m\"", Format::Toml).is_err());
        assert!(Config::parse("audio_codec = [\"wav\"]", Format::Toml).is_err());
        assert!(matches!(
            Config::parse(r#"{"language": "zz"}"#, Format::Json),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Config::parse("dry_run: [", Format::Yaml),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a/config.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("config.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("config.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("config")), Format::Toml);
    }

    #[test]
    fn test_load_from_json_and_yaml_files() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"token": "abc", "library": ["Movies"], "dry_run": true}}"#).unwrap();
        let config = Config::load_from(json.path()).unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.library, vec!["Movies"]);
        assert!(config.dry_run);

        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "language: en\nwatching_preference: dubbed").unwrap();
        let config = Config::load_from(yaml.path()).unwrap();
        assert_eq!(config.language.unwrap().to_string(), "en");
        assert_eq!(config.watching_preference, Some(WatchingPreference::Dubbed));
    }

    #[test]
    fn test_load_from_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_merge_prefers_cli() {
        let file = Config {
            url: Some("http://file".to_string()),
            token: Some("file-token".to_string()),
            library: vec!["Movies".to_string()],
            audio_codec: vec![AudioCodec::Aac],
            skip_watching: true,
            ..Default::default()
        };
        let cli = Config {
            url: Some("http://cli".to_string()),
            library: vec!["TV Shows".to_string()],
            dry_run: true,
            ..Default::default()
        };

        let merged = file.merge(cli);
        assert_eq!(merged.url.as_deref(), Some("http://cli"));
        assert_eq!(merged.token.as_deref(), Some("file-token"));
        assert_eq!(merged.library, vec!["TV Shows"]);
        assert_eq!(merged.audio_codec, vec![AudioCodec::Aac]);
        assert!(merged.skip_watching);
        assert!(merged.dry_run);
    }

    #[test]
    fn test_resolve_complete() {
        let mut config = complete();
        config.excluded_subtitle_codec = vec![SubtitleCodec::Pgs];
        config.force_subtitles = true;

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.settings.url, "http://localhost:32400");
        assert_eq!(resolved.preferences.language.to_string(), "pt-BR");
        assert!(!resolved.preferences.accepts_subtitle("pgs"));
        assert!(resolved.preferences.force_subtitles);
        assert!(resolved.criteria.libraries.is_empty());
        assert!(!resolved.dry_run);
    }

    #[test]
    fn test_resolve_requires_settings() {
        let mut config = complete();
        config.token = None;
        assert!(matches!(config.resolve(), Err(AppError::Config(_))));

        let mut config = complete();
        config.language = None;
        assert!(matches!(config.resolve(), Err(AppError::Config(_))));

        let mut config = complete();
        config.watching_preference = None;
        assert!(matches!(config.resolve(), Err(AppError::Config(_))));

        let mut config = complete();
        config.url = Some("  ".to_string());
        assert!(matches!(config.resolve(), Err(AppError::Config(_))));
    }
}
