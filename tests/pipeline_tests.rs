//! Public API behaviour, from instruction payloads to encode jobs, run
//! against in-memory doubles.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use vidcraft::adapters::AppConfig;
use vidcraft::app::{AppContainer, DefaultAppContainer};
use vidcraft::cli::commands::parse_instructions;
use vidcraft::domain::model::{EditRequest, HardwareAcceleration, Segment};
use vidcraft::domain::rules::ResolutionPolicy;
use vidcraft::engine::{Codec, FixedEncoderProvider};
use vidcraft::planner::{ActionInterpreter, PipelineBuilder, PlanMode, SmartStitcher};
use vidcraft::testing::{asset, MockProbe, ScriptedEncoder};
use vidcraft::{DomainError, EncoderProfile, Instructions};

struct Harness {
    dir: TempDir,
    source: PathBuf,
    encoder: Arc<ScriptedEncoder>,
    container: DefaultAppContainer,
}

fn harness(encoder: ScriptedEncoder, has_audio: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("talk.mp4");
    std::fs::write(&source, b"talk").unwrap();

    let mut config = AppConfig::default();
    config.storage.output_dir = dir.path().join("out");
    config.storage.media_dir = dir.path().to_path_buf();

    let probe = Arc::new(
        MockProbe::new()
            .with_asset(asset(&source, 1920, 1080, 30.0, has_audio))
            .with_fallback(asset("rendered.mp4", 1920, 1080, 5.0, has_audio)),
    );
    let encoder = Arc::new(encoder);
    let provider = Arc::new(FixedEncoderProvider::new(
        HardwareAcceleration::Nvenc.profile(),
        EncoderProfile::default_software(),
    ));
    let container = DefaultAppContainer::with_ports(&config, probe, encoder.clone(), provider);

    Harness {
        dir,
        source,
        encoder,
        container,
    }
}

fn graph_of(encoder: &ScriptedEncoder, index: usize) -> String {
    encoder.jobs()[index].graph.as_ref().unwrap().to_string()
}

#[tokio::test]
async fn test_legacy_payload_renders_in_order() {
    let h = harness(ScriptedEncoder::new(), true);
    let instructions = parse_instructions(
        r#"{
            "mode": "legacy",
            "actions": [
                {"tool": "speed", "params": {"factor": "4.0"}},
                {"tool": "filter", "params": {"type": "GRAYSCALE"}},
                {"tool": "remove_silence"}
            ]
        }"#,
        false,
    )
    .unwrap();

    let request = EditRequest::new(&h.source, instructions).with_selection(10.0, Some(8.0));
    let result = h.container.edit_interactor().execute(&request).await.unwrap();

    assert_eq!(result.encoder.codec_id, "h264_nvenc");
    let graph = graph_of(&h.encoder, 0);
    let trim = graph.find("trim=start=10:end=18").unwrap();
    let speed = graph.find("setpts=PTS/4").unwrap();
    let gray = graph.find("hue=s=0").unwrap();
    assert!(trim < speed && speed < gray);
    assert!(graph.contains("atempo=2,atempo=2"));
    assert!(graph.contains("loudnorm=I=-16:TP=-1.5:LRA=11"));
    assert!(graph.ends_with("[aout]"));
}

#[tokio::test]
async fn test_hardware_failure_heals_through_the_app() {
    let h = harness(ScriptedEncoder::new().then_fail("No NVENC capable devices found"), true);
    let request = EditRequest::new(&h.source, Instructions::default());

    let result = h.container.edit_interactor().execute(&request).await.unwrap();

    assert_eq!(result.encoder, EncoderProfile::default_software());
    let jobs = h.encoder.jobs();
    assert_eq!(jobs.len(), 2);
    assert!(matches!(&jobs[0].codec, Codec::Encode(p) if p.codec_id == "h264_nvenc"));
    assert!(matches!(&jobs[1].codec, Codec::Encode(p) if p.codec_id == "libx264"));
    assert_eq!(jobs[0].output, jobs[1].output);
}

#[tokio::test]
async fn test_silent_source_has_no_audio_branch() {
    let h = harness(ScriptedEncoder::new(), false);
    let instructions = parse_instructions(
        "mode: legacy\nactions:\n  - tool: audio_cleanup\n  - tool: filter\n    params: {type: invert}\n",
        true,
    )
    .unwrap();

    h.container
        .edit_interactor()
        .execute(&EditRequest::new(&h.source, instructions))
        .await
        .unwrap();

    let graph = graph_of(&h.encoder, 0);
    assert!(graph.contains("negate"));
    assert!(!graph.contains("[aout]"));
    assert!(!graph.contains("loudnorm"));
    let args: Vec<String> = h.encoder.jobs()[0]
        .args()
        .iter()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    assert!(args.contains(&"-an".to_string()));
}

#[tokio::test]
async fn test_segment_payload_stitches_keep_list() {
    let h = harness(ScriptedEncoder::new(), true);
    let instructions = parse_instructions(
        r#"{"mode": "segments", "segments": [
            {"start": 0, "end": 4, "label": "intro"},
            {"start": 9, "end": 9},
            {"start": 12.5, "end": 20, "label": "answer"}
        ]}"#,
        false,
    )
    .unwrap();

    h.container
        .edit_interactor()
        .execute(&EditRequest::new(&h.source, instructions))
        .await
        .unwrap();

    let graph = graph_of(&h.encoder, 0);
    assert!(graph.contains("split=2"));
    assert!(graph.contains("trim=start=12.5:end=20"));
    assert!(graph.contains("pad=1920:1080:(ow-iw)/2:(oh-ih)/2"));
    assert!(graph.contains("concat=n=2:v=1:a=1[vout][aout]"));
}

#[tokio::test]
async fn test_empty_keep_list_is_rejected_before_encoding() {
    let h = harness(ScriptedEncoder::new(), true);
    let instructions = Instructions::Segments {
        segments: vec![Segment::new(5.0, 2.0, "backwards")],
    };

    let err = h
        .container
        .edit_interactor()
        .execute(&EditRequest::new(&h.source, instructions))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::InvalidActionParams(_)));
    assert!(h.encoder.jobs().is_empty());
    assert!(!h.dir.path().join("out").join("anything.mp4").exists());
}

#[test]
fn test_raw_stitch_of_mixed_sources_is_incompatible() {
    let assets = vec![
        asset("a.mp4", 1920, 1080, 10.0, true),
        asset("b.mp4", 1280, 720, 10.0, true),
    ];
    let segments = vec![
        Segment::new(0.0, 2.0, "a"),
        Segment::new(0.0, 2.0, "b").from_source(1),
    ];
    let stitcher = SmartStitcher::new(ResolutionPolicy::Native);

    assert!(matches!(
        stitcher.build_raw(&segments, &assets),
        Err(DomainError::StitchIncompatible(_))
    ));
    assert!(stitcher.build(&segments, &assets).is_ok());
}

#[test]
fn test_interpreter_dispatches_on_mode() {
    let interpreter = ActionInterpreter::new(PipelineBuilder::new(), SmartStitcher::default());
    let assets = vec![asset("a.mp4", 640, 360, 10.0, true)];

    let legacy = EditRequest::new("a.mp4", Instructions::default());
    assert_eq!(interpreter.plan(&legacy, &assets).unwrap().mode, PlanMode::Legacy);

    let stitch = EditRequest::new(
        "a.mp4",
        Instructions::Segments {
            segments: vec![Segment::new(1.0, 2.0, "")],
        },
    );
    assert_eq!(interpreter.plan(&stitch, &assets).unwrap().mode, PlanMode::Stitch);

    let empty_segments = EditRequest::new("a.mp4", Instructions::Segments { segments: vec![] });
    assert_eq!(
        interpreter.plan(&empty_segments, &assets).unwrap().mode,
        PlanMode::Legacy
    );
}
