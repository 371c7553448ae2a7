//! video-to-audio through ffmpeg.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pipeline::process::{self, FFMPEG};
use crate::pipeline::workspace::StagedInput;
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

/// Extract the audio track of `input` as an MP3 at `output`.
///
/// A video without an audio stream makes ffmpeg exit non-zero, which
/// surfaces as [`ConvertError::ProcessFailed`].
pub async fn video_to_audio(
    input: &StagedInput,
    output: &Path,
    config: &ConversionConfig,
) -> Result<(), ConvertError> {
    let ffmpeg = process::locate(&FFMPEG, config.ffmpeg_path.as_deref())?;
    let args = ffmpeg_args(&input.path, output, config.audio_bitrate_kbps);

    info!(
        "Extracting audio from '{}' at {} kbit/s",
        input.name, config.audio_bitrate_kbps
    );
    process::run(&FFMPEG, &ffmpeg, args, config.process_timeout_secs).await?;
    Ok(())
}

fn ffmpeg_args(input: &Path, output: &Path, bitrate_kbps: u32) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-i".into(),
        input.as_os_str().to_owned(),
        "-vn".into(),
        "-codec:a".into(),
        "libmp3lame".into(),
        "-b:a".into(),
        format!("{bitrate_kbps}k").into(),
        output.as_os_str().to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_drop_video_and_encode_mp3() {
        let args = ffmpeg_args(Path::new("in.mp4"), Path::new("out.mp3"), 192);
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input + 1], "in.mp4");
        assert!(args.contains(&"-vn".to_string()));
        let codec = args.iter().position(|a| a == "-codec:a").unwrap();
        assert_eq!(args[codec + 1], "libmp3lame");
        let bitrate = args.iter().position(|a| a == "-b:a").unwrap();
        assert_eq!(args[bitrate + 1], "192k");
        assert_eq!(args.last().unwrap(), "out.mp3");
    }

    #[tokio::test]
    async fn missing_ffmpeg_is_reported_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .ffmpeg_path(dir.path().join("no-ffmpeg"))
            .build()
            .unwrap();
        let input = StagedInput {
            name: "clip.mp4".into(),
            path: dir.path().join("input-0.mp4"),
        };
        let err = video_to_audio(&input, &dir.path().join("output.mp3"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingDependency { .. }));
    }
}
