//! Track identification from mkvtoolnix output.
//!
//! Two grammars are understood:
//!
//! * `mkvmerge -J` JSON. Fields read: `identification_format_version`,
//!   `container.type`, `tracks[].{id,type,codec}`,
//!   `tracks[].properties.audio_sampling_frequency` and `chapters[]`.
//!   Unknown fields are ignored, so newer format versions still parse.
//! * `mkvinfo` text, used only to recover audio sampling frequencies when the
//!   JSON leaves them out. Each `+ Track` block carries a
//!   `track ID for mkvmerge & mkvextract: N` line and, for audio, a
//!   `Sampling frequency: F` line.

use super::{TrackDescriptor, TrackKind};
use crate::error::{PalfixError, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, warn};

static MKVINFO_TRACK_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"track ID for mkvmerge & mkvextract: (\d+)").expect("Invalid regex")
});

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("Invalid regex"));

/// Oldest `identification_format_version` these structures were written for.
pub const MIN_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct RawIdentification {
    #[serde(default)]
    identification_format_version: Option<u32>,
    #[serde(default)]
    container: Option<RawContainer>,
    #[serde(default)]
    tracks: Vec<RawTrack>,
    #[serde(default)]
    chapters: Vec<RawChapters>,
}

#[derive(Debug, Deserialize)]
struct RawContainer {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    recognized: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    codec: Option<String>,
    #[serde(default)]
    properties: RawTrackProperties,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrackProperties {
    #[serde(default)]
    audio_sampling_frequency: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawChapters {
    #[serde(default)]
    num_entries: Option<u32>,
}

/// What we know about a container before re-timing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub format_version: Option<u32>,
    pub container: Option<String>,
    pub tracks: Vec<TrackDescriptor>,
    pub has_chapters: bool,
}

impl Identification {
    /// Parse `mkvmerge -J` output.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawIdentification = serde_json::from_str(json)?;

        if let Some(container) = &raw.container {
            if container.recognized == Some(false) {
                return Err(PalfixError::TrackInfo(
                    "container format not recognized".to_string(),
                ));
            }
        }

        match raw.identification_format_version {
            Some(v) if v < MIN_FORMAT_VERSION => {
                warn!("Unexpected identification format version {}", v);
            }
            Some(v) => debug!("Identification format version {}", v),
            None => warn!("Identification output carries no format version"),
        }

        let tracks = raw
            .tracks
            .into_iter()
            .map(|t| TrackDescriptor {
                id: t.id,
                kind: TrackKind::from_type_name(&t.kind),
                codec: t.codec,
                sample_rate: t
                    .properties
                    .audio_sampling_frequency
                    .filter(|rate| *rate > 0.0),
            })
            .collect();

        let has_chapters = raw
            .chapters
            .iter()
            .any(|c| c.num_entries.map_or(true, |n| n > 0));

        Ok(Self {
            format_version: raw.identification_format_version,
            container: raw.container.and_then(|c| c.kind),
            tracks,
            has_chapters,
        })
    }

    /// Audio tracks that still lack a sample rate.
    pub fn audio_missing_rates(&self) -> Vec<u32> {
        self.tracks
            .iter()
            .filter(|t| t.kind.is_audio() && t.sample_rate.is_none())
            .map(|t| t.id)
            .collect()
    }

    /// Fill in missing audio sample rates from `(track id, Hz)` pairs.
    ///
    /// Rates already present are left alone, and only positive finite rates
    /// are taken. Returns how many were filled.
    pub fn fill_sample_rates(&mut self, rates: &[(u32, f64)]) -> usize {
        let mut filled = 0;
        for track in self
            .tracks
            .iter_mut()
            .filter(|t| t.kind.is_audio() && t.sample_rate.is_none())
        {
            if let Some((_, rate)) = rates
                .iter()
                .find(|(id, rate)| *id == track.id && rate.is_finite() && *rate > 0.0)
            {
                track.sample_rate = Some(*rate);
                filled += 1;
            }
        }
        filled
    }
}

/// Pull `(track id, sampling frequency)` pairs out of `mkvinfo` output.
///
/// Only the first positive frequency inside each track block is taken.
/// Frequencies that appear before any track id are ignored.
pub fn parse_mkvinfo_sampling_frequencies(text: &str) -> Vec<(u32, f64)> {
    let mut rates: Vec<(u32, f64)> = Vec::new();
    let mut current: Option<u32> = None;

    for line in text.lines() {
        let entry = line.trim_start_matches(['|', '+', ' ', '\t']);

        if entry.starts_with("Track number:") || entry == "Track" {
            current = None;
        }

        if let Some(caps) = MKVINFO_TRACK_ID_RE.captures(line) {
            current = caps[1].parse().ok();
            continue;
        }

        if let Some(value) = entry.strip_prefix("Sampling frequency:") {
            let Some(id) = current else {
                continue;
            };
            if rates.iter().any(|(seen, _)| *seen == id) {
                continue;
            }
            if let Some(rate) = NUMBER_RE
                .find(value)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|rate| *rate > 0.0)
            {
                rates.push((id, rate));
            }
        }
    }

    rates
}
