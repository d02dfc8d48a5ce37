//! A command-line tool that sets default audio and subtitle tracks on a Plex
//! server.
//!
//! plexy walks the movies and episodes of a Plex library and, for each file,
//! picks the audio and subtitle streams that best fit how the user likes to
//! watch: dubbed in their language, or in the original language with
//! subtitles.
//!
//! # Features
//!
//! - Filter by library, title, season/episode and date added
//! - Language matching that understands regional variants (pt-BR vs pt-PT)
//! - Avoids commentary and SDH tracks when a regular one exists
//! - Accepted and excluded audio/subtitle codecs
//! - Dry runs that only report what would change
//!
//! # Usage
//!
//! ```bash
//! # Original audio with Brazilian Portuguese subtitles, in one library
//! plexy -u http://localhost:32400 -t TOKEN preferences -L Movies -l pt-BR original
//!
//! # Dubbed audio, only for recently added episodes of one show
//! plexy preferences -t "The Boys s02" -n 1w -l en dubbed
//! ```

pub mod api;
pub mod apply;
pub mod config;
pub mod error;
pub mod guess;
pub mod language;
pub mod library;
pub mod media;
pub mod selection;
pub mod types;
pub mod ui;
