//! Smart stitcher for segment keep-lists

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{MediaAsset, Resolution, Segment};
use crate::domain::rules::{ConcatCompatibility, ResolutionPolicy, SegmentPolicy};
use crate::planner::graph::{num, Chain, Filter, FilterGraph, StreamKind, AUDIO_OUT, VIDEO_OUT};

/// Audio format every stitched part is converted to before concatenation
const STITCH_SAMPLE_RATE: u32 = 48_000;
const STITCH_CHANNEL_LAYOUT: &str = "stereo";

/// One piece of a concatenation: an input index and an optional time range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcatPart {
    pub input: usize,
    pub range: Option<(f64, f64)>,
}

impl ConcatPart {
    /// The whole of an input
    pub fn whole(input: usize) -> Self {
        Self { input, range: None }
    }

    pub fn range(input: usize, start: f64, end: f64) -> Self {
        Self {
            input,
            range: Some((start, end)),
        }
    }
}

/// Build a graph concatenating `parts` in order into `[vout]` (and `[aout]`
/// when `with_audio`).
///
/// With a `target`, every part is scaled to fit, letterboxed to exactly that
/// size with square pixels, and its audio resampled to one common format, so
/// the concat filter never sees mismatched geometry.
pub fn concat_graph(parts: &[ConcatPart], target: Option<Resolution>, with_audio: bool) -> FilterGraph {
    let mut graph = FilterGraph::new();
    let video_pads = fan_out(&mut graph, parts, StreamKind::Video);
    let audio_pads = if with_audio {
        fan_out(&mut graph, parts, StreamKind::Audio)
    } else {
        Vec::new()
    };

    let mut concat_inputs = Vec::with_capacity(parts.len() * 2);
    for (i, part) in parts.iter().enumerate() {
        let mut video = Chain::video();
        if let Some((start, end)) = part.range {
            video.push(Filter::new("trim").opt("start", num(start)).opt("end", num(end)));
        }
        video.push(Filter::new("setpts").arg("PTS-STARTPTS"));
        if let Some(target) = target {
            for filter in letterbox(target) {
                video.push(filter);
            }
        }
        let video_label = format!("v{}", i);
        graph.add(vec![video_pads[i].clone()], video, vec![video_label.clone()]);
        concat_inputs.push(video_label);

        if with_audio {
            let mut audio = Chain::audio();
            if let Some((start, end)) = part.range {
                audio.push(Filter::new("atrim").opt("start", num(start)).opt("end", num(end)));
            }
            audio.push(Filter::new("asetpts").arg("PTS-STARTPTS"));
            if target.is_some() {
                audio.push(
                    Filter::new("aformat")
                        .opt("sample_fmts", "fltp")
                        .opt("sample_rates", STITCH_SAMPLE_RATE)
                        .opt("channel_layouts", STITCH_CHANNEL_LAYOUT),
                );
            }
            let audio_label = format!("a{}", i);
            graph.add(vec![audio_pads[i].clone()], audio, vec![audio_label.clone()]);
            concat_inputs.push(audio_label);
        }
    }

    let mut outputs = vec![VIDEO_OUT.to_string()];
    if with_audio {
        outputs.push(AUDIO_OUT.to_string());
    }
    let concat = Filter::new("concat")
        .opt("n", parts.len())
        .opt("v", 1)
        .opt("a", if with_audio { 1 } else { 0 });
    graph.add(concat_inputs, Chain::video().then(concat), outputs);
    graph
}

/// Scale into `target` keeping aspect and pad to exactly `target`
fn letterbox(target: Resolution) -> Vec<Filter> {
    vec![
        Filter::new("scale")
            .arg(target.width)
            .arg(target.height)
            .opt("force_original_aspect_ratio", "decrease")
            .opt("force_divisible_by", 2),
        Filter::new("pad")
            .arg(target.width)
            .arg(target.height)
            .arg("(ow-iw)/2")
            .arg("(oh-ih)/2"),
        Filter::new("setsar").arg(1),
        Filter::new("format").arg("yuv420p"),
    ]
}

/// Input pads per part. An input stream consumed by several parts is split
/// first, since a graph pad can only be read once.
fn fan_out(graph: &mut FilterGraph, parts: &[ConcatPart], kind: StreamKind) -> Vec<String> {
    let spec = kind.specifier();
    let mut pads = vec![String::new(); parts.len()];
    let inputs: BTreeSet<usize> = parts.iter().map(|p| p.input).collect();

    for input in inputs {
        let users: Vec<usize> = (0..parts.len()).filter(|&i| parts[i].input == input).collect();
        let source = format!("{}:{}", input, spec);
        if users.len() == 1 {
            pads[users[0]] = source;
            continue;
        }

        let labels: Vec<String> = (0..users.len())
            .map(|n| format!("s{}{}{}", input, spec, n))
            .collect();
        let splitter = match kind {
            StreamKind::Video => "split",
            StreamKind::Audio => "asplit",
        };
        graph.add(
            vec![source],
            Chain::new(kind).then(Filter::new(splitter).arg(users.len())),
            labels.clone(),
        );
        for (part, label) in users.into_iter().zip(labels) {
            pads[part] = label;
        }
    }
    pads
}

/// Segment keep-list stitcher
#[derive(Debug, Clone, Default)]
pub struct SmartStitcher {
    policy: ResolutionPolicy,
}

impl SmartStitcher {
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    /// Build a normalized stitch of `segments` taken from `assets`, where a
    /// segment's `source` indexes into `assets`.
    pub fn build(&self, segments: &[Segment], assets: &[MediaAsset]) -> Result<FilterGraph, DomainError> {
        let kept = Self::kept(segments, assets)?;
        let first = &assets[kept[0].source];
        let target = self.policy.target(first);
        let with_audio = Self::audio_joinable(&kept, assets);
        debug!(
            segments = kept.len(),
            kept_seconds = kept.iter().map(Segment::duration).sum::<f64>(),
            target = %target,
            with_audio,
            "Stitching segments"
        );

        Ok(concat_graph(&Self::parts(&kept), Some(target), with_audio))
    }

    /// Build a stitch without geometry normalization. Only valid when every
    /// involved source already shares one format; otherwise fails with
    /// `StitchIncompatible`.
    pub fn build_raw(&self, segments: &[Segment], assets: &[MediaAsset]) -> Result<FilterGraph, DomainError> {
        let kept = Self::kept(segments, assets)?;
        let involved: BTreeSet<usize> = kept.iter().map(|s| s.source).collect();
        let involved: Vec<MediaAsset> = involved.into_iter().map(|i| assets[i].clone()).collect();
        ConcatCompatibility::check(&involved)?;

        let with_audio = Self::audio_joinable(&kept, assets);
        Ok(concat_graph(&Self::parts(&kept), None, with_audio))
    }

    fn kept(segments: &[Segment], assets: &[MediaAsset]) -> Result<Vec<Segment>, DomainError> {
        let kept = SegmentPolicy::sanitize(segments, assets.len())?;
        if kept.is_empty() {
            return Err(DomainError::InvalidActionParams(
                "No valid segments to keep".to_string(),
            ));
        }
        Ok(kept)
    }

    fn audio_joinable(kept: &[Segment], assets: &[MediaAsset]) -> bool {
        kept.iter().all(|segment| assets[segment.source].has_audio)
    }

    fn parts(kept: &[Segment]) -> Vec<ConcatPart> {
        kept.iter()
            .map(|segment| ConcatPart::range(segment.source, segment.start, segment.end))
            .collect()
    }
}
