//! Integration tests for palfix
//!
//! These tests exercise the re-timing core and track planning through the
//! public API, without any external tools.

use palfix::timing::{
    rescale_line, rescale_stream, rescale_text, rescale_timestamp, timestamp, RationalFactor,
    Rescaler, Timestamp,
};
use palfix::toolkit::{audio_retimes, ffmpeg_args, mkvmerge_args};
use palfix::tracks::{plan, plan_each, DirectiveKind, Identification, TrackDescriptor, TrackKind};
use palfix::PalfixError;
use std::path::Path;

const PAL: RationalFactor = RationalFactor::PAL;

// ============================================================================
// Timestamp Codec Tests
// ============================================================================

mod codec_tests {
    use super::*;

    #[test]
    fn test_round_trip_over_thirty_hours() {
        // 7919 is prime, so the steps land on every field boundary pattern.
        for ms in (0..30 * 3_600_000u64).step_by(7919) {
            let ts = Timestamp::from_millis(ms);
            assert_eq!(timestamp::parse(&timestamp::format(ts)), Some(ts));
        }
    }

    #[test]
    fn test_format_field_widths() {
        let text = Timestamp::from_millis(5).format();
        assert_eq!(text, "00:00:00.005");
        assert_eq!(text.len(), 12);
    }

    #[test]
    fn test_parse_inside_markup() {
        let line = "<ChapterTimeEnd>00:42:17.250</ChapterTimeEnd>";
        assert_eq!(
            timestamp::parse(line),
            Some(Timestamp::from_millis(42 * 60_000 + 17_250))
        );
    }
}

// ============================================================================
// Rescaler Tests
// ============================================================================

mod rescale_tests {
    use super::*;

    const CHAPTERS: &str = r#"<?xml version="1.0"?>
<!-- <!DOCTYPE Chapters SYSTEM "matroskachapters.dtd"> -->
<Chapters>
  <EditionEntry>
    <ChapterAtom>
      <ChapterUID>1234567890</ChapterUID>
      <ChapterTimeStart>00:00:00.000000000</ChapterTimeStart>
      <ChapterDisplay>
        <ChapterString>Chapter 01: Opening</ChapterString>
      </ChapterDisplay>
    </ChapterAtom>
    <ChapterAtom>
      <ChapterTimeStart>00:24:00.000000000</ChapterTimeStart>
      <ChapterTimeEnd>01:36:00.000000000</ChapterTimeEnd>
    </ChapterAtom>
  </EditionEntry>
</Chapters>
"#;

    #[test]
    fn test_rescale_chapter_file() {
        let output = rescale_text(CHAPTERS, &PAL).unwrap();

        assert_eq!(output.lines().count(), CHAPTERS.lines().count());
        assert!(output.contains("<ChapterTimeStart>00:00:00.000000000</ChapterTimeStart>"));
        assert!(output.contains("<ChapterTimeStart>00:25:00.000000000</ChapterTimeStart>"));
        assert!(output.contains("<ChapterTimeEnd>01:40:00.000000000</ChapterTimeEnd>"));
        assert!(output.contains("<ChapterString>Chapter 01: Opening</ChapterString>"));
        assert!(output.contains("<ChapterUID>1234567890</ChapterUID>"));
    }

    #[test]
    fn test_rescale_chapter_file_and_back() {
        let there = rescale_text(CHAPTERS, &PAL).unwrap();
        let back = rescale_text(&there, &PAL.invert()).unwrap();
        assert_eq!(back, CHAPTERS);
    }

    #[test]
    fn test_example_from_inverse_factor() {
        assert_eq!(
            rescale_line("00:01:00.000 text", &PAL.invert()).unwrap(),
            "00:00:57.600 text"
        );
    }

    #[test]
    fn test_stream_preserves_count_and_order() {
        let lines = vec![
            "",
            "WEBVTT",
            "",
            "1",
            "00:00:01.000 --> 00:00:02.000",
            "Note: time: 12:30 sharp",
            "",
            "2",
            "00:00:48.000 --> 00:00:50.000",
        ];
        let results: Vec<String> = rescale_stream(lines.iter().copied(), &PAL)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(results.len(), lines.len());
        for (i, (before, after)) in lines.iter().zip(&results).enumerate() {
            if timestamp::parse(before).is_none() {
                assert_eq!(before, after, "line {i} changed");
            }
        }
        assert_eq!(results[4], "00:00:01.041 --> 00:00:02.000");
        assert_eq!(results[8], "00:00:50.000 --> 00:00:50.000");
    }

    #[test]
    fn test_inverse_drift_bounded() {
        let originals: Vec<u64> = (0..500).map(|i| i * 1_237 + i % 7).collect();
        let lines: Vec<String> = originals
            .iter()
            .map(|ms| format!("{} cue", Timestamp::from_millis(*ms)))
            .collect();
        let text = lines.join("\n");

        let there = rescale_text(&text, &PAL).unwrap();
        let back = rescale_text(&there, &PAL.invert()).unwrap();

        let mut total_drift = 0u64;
        for (line, original) in back.lines().zip(&originals) {
            let restored = timestamp::parse(line).unwrap().as_millis();
            let drift = original - restored;
            assert!(drift <= 1, "{original} restored as {restored}");
            total_drift += drift;
        }
        assert!(total_drift <= originals.len() as u64);
    }

    #[test]
    fn test_rescaler_reports_malformed_line() {
        let result = Rescaler::new(PAL).rescale_text("00:00:01.000\n00:60:00.000\n");
        assert!(matches!(result, Err(PalfixError::MalformedTimestamp(_))));
    }

    #[test]
    fn test_factor_is_a_parameter() {
        let ntsc_ish = RationalFactor::new(1001, 1000).unwrap();
        let ts = rescale_timestamp(Timestamp::from_millis(1_000_000), &ntsc_ish);
        assert_eq!(ts.as_millis(), 1_001_000);
    }
}

// ============================================================================
// Track Planning Tests
// ============================================================================

mod planning_tests {
    use super::*;

    #[test]
    fn test_plan_reference_tracks() {
        let tracks = vec![
            TrackDescriptor::new(0, TrackKind::Video),
            TrackDescriptor::audio(1, 48000.0),
            TrackDescriptor::new(2, TrackKind::Subtitle),
        ];

        let directives = plan(&tracks, &PAL).unwrap();
        let summary: Vec<(u32, DirectiveKind)> =
            directives.iter().map(|d| (d.track_id, d.kind())).collect();

        assert_eq!(
            summary,
            vec![
                (0, DirectiveKind::FrameRate),
                (1, DirectiveKind::SampleRate),
                (2, DirectiveKind::FrameRate),
            ]
        );
        assert_eq!(directives[0].stretch().unwrap().to_string(), "25/24");
        assert_eq!(directives[1].new_sample_rate(), Some(46080.0));
    }

    #[test]
    fn test_missing_rate_has_no_default() {
        let tracks = vec![TrackDescriptor::new(4, TrackKind::Audio)];
        assert!(matches!(
            plan(&tracks, &PAL),
            Err(PalfixError::MissingSampleRate { track_id: 4 })
        ));
        assert!(plan_each(&tracks, &PAL)[0].is_err());
    }

    #[test]
    fn test_identification_to_command_lines() {
        let ident = Identification::from_json(
            r#"{
              "identification_format_version": 12,
              "container": {"type": "Matroska", "recognized": true},
              "chapters": [],
              "tracks": [
                {"id": 0, "type": "video", "codec": "MPEG-2"},
                {"id": 1, "type": "audio", "codec": "AC-3",
                 "properties": {"audio_sampling_frequency": 48000}},
                {"id": 2, "type": "audio", "codec": "AC-3",
                 "properties": {"audio_sampling_frequency": 48000}},
                {"id": 3, "type": "subtitles", "codec": "VobSub"}
              ]
            }"#,
        )
        .unwrap();

        let directives = plan(&ident.tracks, &PAL).unwrap();
        let merge: Vec<String> = mkvmerge_args(
            Path::new("film.mkv"),
            Path::new("remuxed.mkv"),
            &directives,
            None,
        )
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

        assert_eq!(
            merge,
            vec![
                "--output",
                "remuxed.mkv",
                "--sync",
                "0:0,25/24",
                "--sync",
                "3:0,25/24",
                "--no-chapters",
                "film.mkv",
            ]
        );

        let audio = audio_retimes(&directives);
        let ffmpeg: Vec<String> = ffmpeg_args(Path::new("remuxed.mkv"), Path::new("out.mkv"), &audio)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(ffmpeg.contains(&"-filter:a:0".to_string()));
        assert!(ffmpeg.contains(&"-filter:a:1".to_string()));
        assert_eq!(
            ffmpeg
                .iter()
                .filter(|a| *a == "asetrate=46080,aresample=48000")
                .count(),
            2
        );
    }
}
