use super::TrackDescriptor;
use crate::error::{PalfixError, Result};
use crate::timing::RationalFactor;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    FrameRate,
    SampleRate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncAdjustment {
    /// Stretch the track's timestamps by this factor. Content is not resampled.
    FrameRate(RationalFactor),
    /// Play the audio at this many Hz, with `original` kept for resampling back.
    SampleRate { original: f64, new: f64 },
}

/// How one track's timing or rate has to change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncDirective {
    pub track_id: u32,
    pub adjustment: SyncAdjustment,
}

impl SyncDirective {
    pub fn kind(&self) -> DirectiveKind {
        match self.adjustment {
            SyncAdjustment::FrameRate(_) => DirectiveKind::FrameRate,
            SyncAdjustment::SampleRate { .. } => DirectiveKind::SampleRate,
        }
    }

    pub fn stretch(&self) -> Option<RationalFactor> {
        match self.adjustment {
            SyncAdjustment::FrameRate(factor) => Some(factor),
            SyncAdjustment::SampleRate { .. } => None,
        }
    }

    pub fn new_sample_rate(&self) -> Option<f64> {
        match self.adjustment {
            SyncAdjustment::SampleRate { new, .. } => Some(new),
            SyncAdjustment::FrameRate(_) => None,
        }
    }
}

impl fmt::Display for SyncDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.adjustment {
            SyncAdjustment::FrameRate(factor) => {
                write!(f, "track {}: stretch timestamps by {}", self.track_id, factor)
            }
            SyncAdjustment::SampleRate { original, new } => write!(
                f,
                "track {}: sample rate {} Hz -> {} Hz",
                self.track_id, original, new
            ),
        }
    }
}

/// Plan a single track.
///
/// Non-audio tracks get the factor itself as a timestamp stretch. Audio
/// tracks get their rate scaled by the reciprocal factor; a rate that is not
/// a positive finite number counts as missing.
pub fn plan_track(track: &TrackDescriptor, factor: &RationalFactor) -> Result<SyncDirective> {
    let adjustment = if track.kind.is_audio() {
        let original = track
            .sample_rate
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or(PalfixError::MissingSampleRate { track_id: track.id })?;
        SyncAdjustment::SampleRate {
            original,
            new: factor.invert().apply(original),
        }
    } else {
        SyncAdjustment::FrameRate(*factor)
    };

    Ok(SyncDirective {
        track_id: track.id,
        adjustment,
    })
}

/// One result per track, in track order.
pub fn plan_each(tracks: &[TrackDescriptor], factor: &RationalFactor) -> Vec<Result<SyncDirective>> {
    tracks.iter().map(|t| plan_track(t, factor)).collect()
}

/// Plan every track, failing on the first audio track without a sample rate.
pub fn plan(tracks: &[TrackDescriptor], factor: &RationalFactor) -> Result<Vec<SyncDirective>> {
    tracks.iter().map(|t| plan_track(t, factor)).collect()
}
