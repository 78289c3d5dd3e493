pub mod identify;
pub mod plan;

pub use identify::{parse_mkvinfo_sampling_frequencies, Identification};
pub use plan::{plan, plan_each, plan_track, DirectiveKind, SyncAdjustment, SyncDirective};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

impl TrackKind {
    /// Map a tool's track type name onto a kind. Unknown names are `Other`.
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "video" => TrackKind::Video,
            "audio" => TrackKind::Audio,
            "subtitles" | "subtitle" => TrackKind::Subtitle,
            _ => TrackKind::Other,
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, TrackKind::Audio)
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Subtitle => write!(f, "subtitle"),
            TrackKind::Other => write!(f, "other"),
        }
    }
}

/// One stream inside a container, as reported by the identification tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub id: u32,
    pub kind: TrackKind,
    pub codec: Option<String>,
    /// Hz. Only meaningful for audio.
    pub sample_rate: Option<f64>,
}

impl TrackDescriptor {
    pub fn new(id: u32, kind: TrackKind) -> Self {
        Self {
            id,
            kind,
            codec: None,
            sample_rate: None,
        }
    }

    pub fn audio(id: u32, sample_rate: f64) -> Self {
        Self {
            sample_rate: Some(sample_rate),
            ..Self::new(id, TrackKind::Audio)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_type_name() {
        assert_eq!(TrackKind::from_type_name("video"), TrackKind::Video);
        assert_eq!(TrackKind::from_type_name("Audio"), TrackKind::Audio);
        assert_eq!(TrackKind::from_type_name("subtitles"), TrackKind::Subtitle);
        assert_eq!(TrackKind::from_type_name("buttons"), TrackKind::Other);
        assert_eq!(TrackKind::from_type_name(""), TrackKind::Other);
    }

    #[test]
    fn test_audio_constructor() {
        let track = TrackDescriptor::audio(3, 44100.0);
        assert_eq!(track.id, 3);
        assert!(track.kind.is_audio());
        assert_eq!(track.sample_rate, Some(44100.0));
        assert_eq!(track.codec, None);
    }
}
