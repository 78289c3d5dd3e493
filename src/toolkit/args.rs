//! Command lines for the external tools, built from sync directives.

use crate::tracks::{SyncAdjustment, SyncDirective};
use std::ffi::OsString;
use std::path::Path;

/// One audio stream to slow down, addressed by its position among the audio
/// streams of the remuxed file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioRetime {
    pub stream_index: usize,
    pub track_id: u32,
    pub original_rate: f64,
    pub new_rate: f64,
}

/// Audio directives in stream order. Directives must be in track order.
pub fn audio_retimes(directives: &[SyncDirective]) -> Vec<AudioRetime> {
    directives
        .iter()
        .filter_map(|d| match d.adjustment {
            SyncAdjustment::SampleRate { original, new } => Some((d.track_id, original, new)),
            SyncAdjustment::FrameRate(_) => None,
        })
        .enumerate()
        .map(|(stream_index, (track_id, original_rate, new_rate))| AudioRetime {
            stream_index,
            track_id,
            original_rate,
            new_rate,
        })
        .collect()
}

/// `--sync ID:0,N/D` for every timestamp-stretch directive.
pub fn mkvmerge_sync_args(directives: &[SyncDirective]) -> Vec<String> {
    directives
        .iter()
        .filter_map(|d| d.stretch().map(|factor| (d.track_id, factor)))
        .flat_map(|(id, factor)| ["--sync".to_string(), format!("{id}:0,{factor}")])
        .collect()
}

/// Full `mkvmerge` invocation: stretch non-audio tracks, drop the old
/// chapters and attach the re-timed ones if there are any.
pub fn mkvmerge_args(
    input: &Path,
    output: &Path,
    directives: &[SyncDirective],
    chapters: Option<&Path>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--output".into(), output.into()];
    args.extend(mkvmerge_sync_args(directives).into_iter().map(OsString::from));
    args.push("--no-chapters".into());
    if let Some(chapters) = chapters {
        args.push("--chapters".into());
        args.push(chapters.into());
    }
    args.push(input.into());
    args
}

/// Play the stream at the new rate, then resample back to the original one.
pub fn ffmpeg_audio_filter(audio: &AudioRetime) -> String {
    format!(
        "asetrate={},aresample={}",
        audio.new_rate, audio.original_rate
    )
}

/// `ffmpeg` invocation that re-rates every listed audio stream and copies
/// video and subtitles untouched.
pub fn ffmpeg_args(input: &Path, output: &Path, audio: &[AudioRetime]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(["-map", "0"].map(OsString::from));

    for stream in audio {
        args.push(format!("-filter:a:{}", stream.stream_index).into());
        args.push(ffmpeg_audio_filter(stream).into());
    }

    args.extend(
        ["-c:v", "copy", "-c:s", "copy", "-max_interleave_delta", "0"].map(OsString::from),
    );
    args.push(output.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::RationalFactor;
    use crate::tracks::{plan, TrackDescriptor, TrackKind};

    fn sample_directives() -> Vec<SyncDirective> {
        let tracks = vec![
            TrackDescriptor::new(0, TrackKind::Video),
            TrackDescriptor::audio(1, 48000.0),
            TrackDescriptor::new(2, TrackKind::Subtitle),
            TrackDescriptor::audio(3, 44100.0),
        ];
        plan(&tracks, &RationalFactor::PAL).unwrap()
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_sync_args_skip_audio() {
        assert_eq!(
            mkvmerge_sync_args(&sample_directives()),
            vec!["--sync", "0:0,25/24", "--sync", "2:0,25/24"]
        );
    }

    #[test]
    fn test_mkvmerge_args_with_chapters() {
        let args = mkvmerge_args(
            Path::new("in.mkv"),
            Path::new("/tmp/x/temp.mkv"),
            &sample_directives(),
            Some(Path::new("/tmp/x/chapters.xml")),
        );

        assert_eq!(
            strings(args),
            vec![
                "--output",
                "/tmp/x/temp.mkv",
                "--sync",
                "0:0,25/24",
                "--sync",
                "2:0,25/24",
                "--no-chapters",
                "--chapters",
                "/tmp/x/chapters.xml",
                "in.mkv",
            ]
        );
    }

    #[test]
    fn test_mkvmerge_args_without_chapters() {
        let args = strings(mkvmerge_args(
            Path::new("in.mkv"),
            Path::new("out.mkv"),
            &[],
            None,
        ));
        assert_eq!(args, vec!["--output", "out.mkv", "--no-chapters", "in.mkv"]);
    }

    #[test]
    fn test_audio_retimes_in_stream_order() {
        let audio = audio_retimes(&sample_directives());

        assert_eq!(audio.len(), 2);
        assert_eq!(audio[0].stream_index, 0);
        assert_eq!(audio[0].track_id, 1);
        assert_eq!(audio[0].new_rate, 46080.0);
        assert_eq!(audio[1].stream_index, 1);
        assert_eq!(audio[1].track_id, 3);
        assert_eq!(audio[1].new_rate, 42336.0);
    }

    #[test]
    fn test_ffmpeg_filter() {
        let audio = audio_retimes(&sample_directives());
        assert_eq!(ffmpeg_audio_filter(&audio[0]), "asetrate=46080,aresample=48000");
    }

    #[test]
    fn test_ffmpeg_args() {
        let audio = audio_retimes(&sample_directives());
        let args = strings(ffmpeg_args(Path::new("temp.mkv"), Path::new("out.mkv"), &audio));

        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "temp.mkv",
                "-map",
                "0",
                "-filter:a:0",
                "asetrate=46080,aresample=48000",
                "-filter:a:1",
                "asetrate=42336,aresample=44100",
                "-c:v",
                "copy",
                "-c:s",
                "copy",
                "-max_interleave_delta",
                "0",
                "out.mkv",
            ]
        );
    }
}
