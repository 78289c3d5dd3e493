use super::args::{ffmpeg_args, mkvmerge_args, AudioRetime};
use super::{MediaToolkit, Tool};
use crate::config::ToolPaths;
use crate::error::{PalfixError, Result};
use crate::tracks::{parse_mkvinfo_sampling_frequencies, Identification, SyncDirective};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// mkvtoolnix and FFmpeg, run as subprocesses.
#[derive(Debug, Clone, Default)]
pub struct MkvToolkit {
    paths: ToolPaths,
}

impl MkvToolkit {
    pub fn new(paths: ToolPaths) -> Self {
        Self { paths }
    }

    fn program(&self, tool: Tool) -> &PathBuf {
        match tool {
            Tool::Mkvmerge => &self.paths.mkvmerge,
            Tool::Mkvextract => &self.paths.mkvextract,
            Tool::Mkvinfo => &self.paths.mkvinfo,
            Tool::Ffmpeg => &self.paths.ffmpeg,
        }
    }

    async fn run(&self, tool: Tool, args: &[OsString]) -> Result<Output> {
        let program = self.program(tool);
        debug!("Running {} {:?}", program.display(), args);

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PalfixError::ToolMissing(format!(
                    "{} ({}). Install mkvtoolnix and FFmpeg and make sure they are in your PATH",
                    tool,
                    program.display()
                )),
                _ => PalfixError::ToolFailed {
                    tool: tool.to_string(),
                    message: format!("could not start: {e}"),
                },
            })?;

        check_status(tool, &output)?;
        Ok(output)
    }
}

/// mkvtoolnix exits with 1 for warnings and 2 for errors.
fn check_status(tool: Tool, output: &Output) -> Result<()> {
    let code = output.status.code();
    let warnings_only = matches!(tool, Tool::Mkvmerge | Tool::Mkvextract) && code == Some(1);

    if output.status.success() {
        return Ok(());
    }

    // mkvtoolnix reports problems on stdout
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let message = if stderr.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        stderr.trim().to_string()
    };

    if warnings_only {
        warn!("{} finished with warnings: {}", tool, message);
        return Ok(());
    }

    Err(PalfixError::ToolFailed {
        tool: tool.to_string(),
        message: match code {
            Some(code) => format!("exit code {code}: {message}"),
            None => format!("terminated by signal: {message}"),
        },
    })
}

#[async_trait]
impl MediaToolkit for MkvToolkit {
    async fn check(&self) -> Result<()> {
        let mut missing = Vec::new();

        for tool in Tool::ALL {
            let ok = Command::new(self.program(tool))
                .arg(tool.version_flag())
                .output()
                .await
                .map(|o| o.status.success())
                .unwrap_or(false);

            if ok {
                debug!("{} is available", tool);
            } else {
                missing.push(tool.name());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PalfixError::ToolMissing(format!(
                "{}. Install mkvtoolnix and FFmpeg and make sure they are in your PATH",
                missing.join(", ")
            )))
        }
    }

    async fn identify(&self, input: &Path) -> Result<Identification> {
        let output = self
            .run(Tool::Mkvmerge, &["-J".into(), input.into()])
            .await?;
        Identification::from_json(&String::from_utf8_lossy(&output.stdout))
    }

    async fn sampling_frequencies(&self, input: &Path) -> Result<Vec<(u32, f64)>> {
        let output = self.run(Tool::Mkvinfo, &[input.into()]).await?;
        Ok(parse_mkvinfo_sampling_frequencies(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    async fn extract_chapters(&self, input: &Path, dest: &Path) -> Result<()> {
        self.run(
            Tool::Mkvextract,
            &[input.into(), "chapters".into(), dest.into()],
        )
        .await?;

        if !dest.exists() {
            return Err(PalfixError::ToolFailed {
                tool: Tool::Mkvextract.to_string(),
                message: "chapter file was not created".to_string(),
            });
        }
        Ok(())
    }

    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        directives: &[SyncDirective],
        chapters: Option<&Path>,
    ) -> Result<()> {
        let args = mkvmerge_args(input, output, directives, chapters);
        self.run(Tool::Mkvmerge, &args).await?;
        info!("Remuxed to {}", output.display());
        Ok(())
    }

    async fn retime_audio(&self, input: &Path, output: &Path, audio: &[AudioRetime]) -> Result<()> {
        let args = ffmpeg_args(input, output, audio);
        self.run(Tool::Ffmpeg, &args).await?;

        if !output.exists() {
            return Err(PalfixError::ToolFailed {
                tool: Tool::Ffmpeg.to_string(),
                message: "output file was not created".to_string(),
            });
        }
        Ok(())
    }
}
