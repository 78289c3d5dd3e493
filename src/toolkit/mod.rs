pub mod args;
pub mod mkvtoolnix;

pub use args::{
    audio_retimes, ffmpeg_args, ffmpeg_audio_filter, mkvmerge_args, mkvmerge_sync_args,
    AudioRetime,
};
pub use mkvtoolnix::MkvToolkit;

use crate::error::Result;
use crate::tracks::{Identification, SyncDirective};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Mkvmerge,
    Mkvextract,
    Mkvinfo,
    Ffmpeg,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Mkvmerge, Tool::Mkvextract, Tool::Mkvinfo, Tool::Ffmpeg];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Mkvmerge => "mkvmerge",
            Tool::Mkvextract => "mkvextract",
            Tool::Mkvinfo => "mkvinfo",
            Tool::Ffmpeg => "ffmpeg",
        }
    }

    /// Flag that prints the version and exits successfully.
    pub fn version_flag(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "-version",
            _ => "--version",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The external programs the pipeline drives.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Fail with `ToolMissing` listing every tool that cannot be run.
    async fn check(&self) -> Result<()>;

    async fn identify(&self, input: &Path) -> Result<Identification>;

    /// `(track id, Hz)` for each audio track the container describes.
    async fn sampling_frequencies(&self, input: &Path) -> Result<Vec<(u32, f64)>>;

    /// Write the container's chapters as XML to `dest`.
    async fn extract_chapters(&self, input: &Path, dest: &Path) -> Result<()>;

    /// Remux with non-audio timestamps stretched and chapters replaced.
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        directives: &[SyncDirective],
        chapters: Option<&Path>,
    ) -> Result<()>;

    /// Re-rate audio streams into `output`, copying everything else.
    async fn retime_audio(&self, input: &Path, output: &Path, audio: &[AudioRetime]) -> Result<()>;
}
