//! Encode job description and ffmpeg argument rendering

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::domain::model::{EncoderProfile, EncoderTier};
use crate::planner::{FilterGraph, AUDIO_OUT};

/// AAC bitrate for every re-encoded output
const AUDIO_BITRATE: &str = "192k";

/// How an input is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A media file
    File,
    /// A concat demuxer list file
    ConcatList,
}

/// One `-i` input of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInput {
    pub path: PathBuf,
    pub kind: InputKind,
}

impl JobInput {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: InputKind::File,
        }
    }

    pub fn concat_list(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: InputKind::ConcatList,
        }
    }
}

/// Codec handling for the output streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Codec {
    /// Copy packets without re-encoding
    StreamCopy,
    /// Re-encode video with the profile, audio as AAC
    Encode(EncoderProfile),
}

/// Muxer and threading settings shared by renders and exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// Move the moov atom to the front for progressive playback
    pub faststart: bool,
    /// Encoder thread count; engine default when unset
    pub threads: Option<usize>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            faststart: true,
            threads: None,
        }
    }
}

/// A complete invocation of the encoding engine
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeJob {
    pub inputs: Vec<JobInput>,
    pub graph: Option<FilterGraph>,
    pub codec: Codec,
    pub output: PathBuf,
    pub options: OutputOptions,
}

impl EncodeJob {
    /// Re-encode `graph` over `inputs`
    pub fn encode(
        inputs: Vec<JobInput>,
        graph: FilterGraph,
        profile: EncoderProfile,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inputs,
            graph: Some(graph),
            codec: Codec::Encode(profile),
            output: output.into(),
            options: OutputOptions::default(),
        }
    }

    /// Stream-copy `inputs` into the output
    pub fn stream_copy(inputs: Vec<JobInput>, output: impl Into<PathBuf>) -> Self {
        Self {
            inputs,
            graph: None,
            codec: Codec::StreamCopy,
            output: output.into(),
            options: OutputOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OutputOptions) -> Self {
        self.options = options;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Encoder name used in diagnostics
    pub fn codec_label(&self) -> &str {
        match &self.codec {
            Codec::StreamCopy => "copy",
            Codec::Encode(profile) => &profile.codec_id,
        }
    }

    /// Whether the job writes an audio stream
    fn has_audio_output(&self) -> bool {
        self.graph
            .as_ref()
            .map_or(false, |graph| graph.produces(AUDIO_OUT))
    }

    /// Command-line arguments for the ffmpeg binary
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error"]
            .iter()
            .map(OsString::from)
            .collect();

        for input in &self.inputs {
            if input.kind == InputKind::ConcatList {
                args.extend(["-f", "concat", "-safe", "0"].iter().map(OsString::from));
            }
            args.push("-i".into());
            args.push(input.path.clone().into_os_string());
        }

        if let Some(graph) = &self.graph {
            args.push("-filter_complex".into());
            args.push(graph.to_string().into());
            for map in graph.output_maps() {
                args.push("-map".into());
                args.push(map.into());
            }
        }

        match &self.codec {
            Codec::StreamCopy => {
                args.push("-c".into());
                args.push("copy".into());
            }
            Codec::Encode(profile) => {
                args.push("-c:v".into());
                args.push(profile.codec_id.clone().into());
                if !profile.preset_id.is_empty() {
                    args.push("-preset".into());
                    args.push(profile.preset_id.clone().into());
                }
                if profile.tier == EncoderTier::Software {
                    args.push("-pix_fmt".into());
                    args.push("yuv420p".into());
                }
                if self.has_audio_output() {
                    args.extend(["-c:a", "aac", "-b:a", AUDIO_BITRATE].iter().map(OsString::from));
                } else {
                    args.push("-an".into());
                }
            }
        }

        if let Some(threads) = self.options.threads {
            args.push("-threads".into());
            args.push(threads.to_string().into());
        }
        if self.options.faststart {
            args.push("-movflags".into());
            args.push("+faststart".into());
        }
        args.push(self.output.clone().into_os_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::HardwareAcceleration;
    use crate::planner::{Filter, Pipeline};

    fn strings(job: &EncodeJob) -> Vec<String> {
        job.args()
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_software_encode_args() {
        let mut pipeline = Pipeline::new(true);
        pipeline.video(Filter::new("negate"));
        let job = EncodeJob::encode(
            vec![JobInput::file("in.mp4")],
            pipeline.into_graph(0),
            EncoderProfile::default_software(),
            "out.mp4",
        )
        .with_options(OutputOptions {
            faststart: true,
            threads: Some(4),
        });

        assert_eq!(
            strings(&job),
            vec![
                "-y", "-hide_banner", "-loglevel", "error",
                "-i", "in.mp4",
                "-filter_complex", "[0:v]negate[vout];[0:a]anull[aout]",
                "-map", "[vout]", "-map", "[aout]",
                "-c:v", "libx264", "-preset", "fast", "-pix_fmt", "yuv420p",
                "-c:a", "aac", "-b:a", "192k",
                "-threads", "4",
                "-movflags", "+faststart",
                "out.mp4",
            ]
        );
        assert_eq!(job.codec_label(), "libx264");
    }

    #[test]
    fn test_hardware_encode_without_audio() {
        let job = EncodeJob::encode(
            vec![JobInput::file("in.mp4")],
            Pipeline::new(false).into_graph(0),
            HardwareAcceleration::VideoToolbox.profile(),
            "out.mp4",
        );
        let args = strings(&job);

        assert!(args.contains(&"h264_videotoolbox".to_string()));
        assert!(!args.contains(&"-preset".to_string()));
        assert!(!args.contains(&"-pix_fmt".to_string()));
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_concat_copy_args() {
        let job = EncodeJob::stream_copy(vec![JobInput::concat_list("list.txt")], "joined.mp4");
        assert_eq!(
            strings(&job),
            vec![
                "-y", "-hide_banner", "-loglevel", "error",
                "-f", "concat", "-safe", "0", "-i", "list.txt",
                "-c", "copy",
                "-movflags", "+faststart",
                "joined.mp4",
            ]
        );
        assert_eq!(job.codec_label(), "copy");
    }
}
