//! Legacy tool-sequence pipeline builder

use tracing::{debug, warn};

use crate::domain::model::{EditAction, FilterKind, TimelineSelection};
use crate::domain::rules::TempoPlanner;
use crate::planner::graph::{num, Filter, Pipeline};

/// Sepia color matrix, row-major
const SEPIA_MATRIX: [[f64; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Band-pass limits and loudness target for audio cleanup
const CLEANUP_HIGHPASS_HZ: u32 = 200;
const CLEANUP_LOWPASS_HZ: u32 = 3000;
const LOUDNESS_TARGET_LUFS: f64 = -16.0;
const LOUDNESS_TRUE_PEAK_DB: f64 = -1.5;
const LOUDNESS_RANGE: f64 = 11.0;

/// Option ranges accepted by the `eq` filter
const CONTRAST_RANGE: (f64, f64) = (-1000.0, 1000.0);
const BRIGHTNESS_RANGE: (f64, f64) = (-1.0, 1.0);
const SATURATION_RANGE: (f64, f64) = (0.0, 3.0);

/// Builds a single-source pipeline from a pre-trim selection and an ordered
/// list of edit actions.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    warm_red_gamma: Option<f64>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Red gamma boost added by the `warm` filter
    pub fn with_warm_red_gamma(mut self, gamma: Option<f64>) -> Self {
        self.warm_red_gamma = gamma;
        self
    }

    /// Build the pipeline: pre-trim first, then every action in list order.
    ///
    /// Actions whose parameters cannot produce a transformation are skipped
    /// and leave the pipeline untouched.
    pub fn build(
        &self,
        has_audio: bool,
        selection: &TimelineSelection,
        actions: &[EditAction],
    ) -> Pipeline {
        let mut pipeline = Pipeline::new(has_audio);
        self.pre_trim(&mut pipeline, selection);

        for (index, action) in actions.iter().enumerate() {
            if !self.apply(&mut pipeline, action) {
                warn!(index, tool = action.tool(), ?action, "Skipping action");
            }
        }
        pipeline
    }

    /// Restrict both streams to the timeline selection and rebase them to zero
    fn pre_trim(&self, pipeline: &mut Pipeline, selection: &TimelineSelection) {
        if selection.is_trivial() {
            return;
        }
        let start = selection.clip_start.max(0.0);
        debug!(start, end = ?selection.end(), "Applying timeline pre-trim");
        trim(pipeline, start, selection.end());
    }

    /// Apply one action to the current pipeline state. Returns false when the
    /// action was skipped.
    pub fn apply(&self, pipeline: &mut Pipeline, action: &EditAction) -> bool {
        match action {
            EditAction::Trim { start, end } => {
                if !start.is_finite() || !end.is_finite() {
                    return false;
                }
                let start = start.max(0.0);
                if *end <= start {
                    return false;
                }
                trim(pipeline, start, Some(*end));
                true
            }
            EditAction::Speed { factor } => {
                let steps = match TempoPlanner::steps(*factor) {
                    Ok(steps) => steps,
                    Err(_) => return false,
                };
                pipeline.video(Filter::new("setpts").arg(format!("PTS/{}", num(*factor))));
                for step in steps {
                    pipeline.audio(Filter::new("atempo").arg(num(step)));
                }
                true
            }
            EditAction::Filter { kind } => {
                pipeline.video(self.color_filter(*kind));
                true
            }
            EditAction::Adjust {
                contrast,
                brightness,
                saturation,
            } => {
                if !within(*contrast, CONTRAST_RANGE)
                    || !within(*brightness, BRIGHTNESS_RANGE)
                    || !within(*saturation, SATURATION_RANGE)
                {
                    return false;
                }
                pipeline.video(
                    Filter::new("eq")
                        .opt("contrast", num(*contrast))
                        .opt("brightness", num(*brightness))
                        .opt("saturation", num(*saturation)),
                );
                true
            }
            EditAction::AudioCleanup => {
                if !pipeline.has_audio() {
                    debug!("No audio stream, audio cleanup has nothing to do");
                    return true;
                }
                pipeline.audio(Filter::new("highpass").opt("f", CLEANUP_HIGHPASS_HZ));
                pipeline.audio(Filter::new("lowpass").opt("f", CLEANUP_LOWPASS_HZ));
                pipeline.audio(
                    Filter::new("loudnorm")
                        .opt("I", num(LOUDNESS_TARGET_LUFS))
                        .opt("TP", num(LOUDNESS_TRUE_PEAK_DB))
                        .opt("LRA", num(LOUDNESS_RANGE)),
                );
                true
            }
        }
    }

    fn color_filter(&self, kind: FilterKind) -> Filter {
        match kind {
            FilterKind::Grayscale => Filter::new("hue").opt("s", 0),
            FilterKind::Sepia => {
                let mut filter = Filter::new("colorchannelmixer");
                for (row, channel) in SEPIA_MATRIX.iter().zip(["r", "g", "b"]) {
                    for (coefficient, source) in row.iter().zip(["r", "g", "b"]) {
                        filter = filter.opt(format!("{}{}", channel, source), num(*coefficient));
                    }
                }
                filter
            }
            FilterKind::Invert => Filter::new("negate"),
            FilterKind::Warm => {
                let filter = Filter::new("eq").opt("saturation", 1.2).opt("contrast", 1.1);
                match self.warm_red_gamma {
                    Some(gamma) => filter.opt("gamma_r", num(gamma)),
                    None => filter,
                }
            }
        }
    }
}

/// Trim both streams and reset their timestamps to zero
fn trim(pipeline: &mut Pipeline, start: f64, end: Option<f64>) {
    let mut video = Filter::new("trim").opt("start", num(start));
    let mut audio = Filter::new("atrim").opt("start", num(start));
    if let Some(end) = end {
        video = video.opt("end", num(end));
        audio = audio.opt("end", num(end));
    }
    pipeline.video(video);
    pipeline.video(Filter::new("setpts").arg("PTS-STARTPTS"));
    pipeline.audio(audio);
    pipeline.audio(Filter::new("asetpts").arg("PTS-STARTPTS"));
}

fn within(value: f64, (low, high): (f64, f64)) -> bool {
    value.is_finite() && value >= low && value <= high
}
