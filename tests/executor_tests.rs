mod common;

use std::sync::atomic::Ordering;

use common::{descriptor, speaker_turn, EngineFailure, ScriptedEngine, TestPipeline};
use scrivener::job::{ExecutionError, JobStatus, Segment, UNKNOWN_SPEAKER};
use scrivener::media::StagingError;
use scrivener::pipeline::{ChainError, Stage};

#[test]
fn end_to_end_drops_hallucinations_and_summarizes() {
    let engine = ScriptedEngine::new(
        vec![
            Segment::new(0.0, 0.05, "uh"),
            Segment::new(0.1, 5.0, "Hello team"),
        ],
        vec![speaker_turn("SPEAKER_00", 0.0, 6.0)],
    );
    let pipeline = TestPipeline::with_engine(engine);
    pipeline.put_object("meeting.wav", b"RIFF");

    let job = descriptor("11111111-1111-1111-1111-111111111111", "meeting.wav");
    let result = pipeline.executor.execute(&job).unwrap();

    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.job_id, job.job_id);
    assert_eq!(result.error_message, None);
    assert!(!result.turnaround.is_empty());

    let segments: Vec<Segment> = serde_json::from_str(&result.transcript).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].speaker, "SPEAKER_00");
    assert_eq!(segments[0].text.as_deref(), Some("Hello team"));

    // The summarizer saw exactly the surviving text, one line per utterance
    assert_eq!(
        pipeline.summarizer.last_input.lock().unwrap().as_deref(),
        Some("Hello team\n")
    );
    assert_eq!(result.summary, "MINUTES::Hello team\n");

    // Transcript is pretty-printed, not a single line
    assert!(result.transcript.lines().count() > 1);

    assert!(pipeline.scratch_is_empty());
}

#[test]
fn missing_recording_fails_with_staging_error() {
    let pipeline = TestPipeline::with_engine(ScriptedEngine::new(vec![], vec![]));

    let job = descriptor("22222222-2222-2222-2222-222222222222", "absent.wav");
    let err = pipeline.executor.execute(&job).unwrap_err();

    assert!(matches!(
        err,
        ExecutionError::Staging(StagingError::Missing { .. })
    ));
    assert!(pipeline.scratch_is_empty());
}

#[test]
fn mid_chain_failure_still_cleans_scratch() {
    let mut engine = ScriptedEngine::new(vec![Segment::new(0.1, 5.0, "Hello team")], vec![]);
    engine.fail_at = Some(EngineFailure::Diarize);
    let pipeline = TestPipeline::with_engine(engine);
    pipeline.put_object("meeting.wav", b"RIFF");

    let job = descriptor("33333333-3333-3333-3333-333333333333", "meeting.wav");
    let err = pipeline.executor.execute(&job).unwrap_err();

    assert!(matches!(
        err,
        ExecutionError::Chain(ChainError::Stage {
            stage: Stage::Diarize,
            ..
        })
    ));
    assert!(pipeline.scratch_is_empty());
    assert_eq!(pipeline.summarizer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unattributed_segments_keep_the_unknown_speaker() {
    let engine = ScriptedEngine::new(vec![Segment::new(0.1, 5.0, "Hello team")], vec![]);
    let pipeline = TestPipeline::with_engine(engine);
    pipeline.put_object("meeting.wav", b"RIFF");

    let job = descriptor("44444444-4444-4444-4444-444444444444", "meeting.wav");
    let result = pipeline.executor.execute(&job).unwrap();

    let segments: Vec<Segment> = serde_json::from_str(&result.transcript).unwrap();
    assert_eq!(segments[0].speaker, UNKNOWN_SPEAKER);
}

#[test]
fn empty_meetings_complete_with_an_empty_summary() {
    let engine = ScriptedEngine::new(vec![Segment::new(0.0, 0.02, "uh")], vec![]);
    let pipeline = TestPipeline::with_engine(engine);
    pipeline.put_object("meeting.wav", b"RIFF");

    let job = descriptor("55555555-5555-5555-5555-555555555555", "meeting.wav");
    let result = pipeline.executor.execute(&job).unwrap();

    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.summary, "");
    assert_eq!(serde_json::from_str::<Vec<Segment>>(&result.transcript).unwrap(), vec![]);
    assert_eq!(pipeline.summarizer.calls.load(Ordering::SeqCst), 0);
}
