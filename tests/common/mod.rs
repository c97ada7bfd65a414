// Shared test harness. Not every binary uses every helper.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use uuid::Uuid;

use scrivener::config::BrokerSettings;
use scrivener::engine::{EngineError, SpeakerTurn, SpeechEngine, Transcription};
use scrivener::job::{JobDescriptor, JobExecutor, Segment};
use scrivener::llm::{Summarizer, SummaryError};
use scrivener::media::{FsObjectStore, MediaStager};
use scrivener::pipeline::ProcessingChain;

pub fn run_scrivener(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_scrivener"))
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env_remove("SCRIVENER_SUMMARIZER_API_KEY")
            .env_remove("SCRIVENER_BOOTSTRAP_SERVERS")
            .output()
            .expect("failed to execute scrivener binary")
    }

    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }
}

/// Which engine stage a [`ScriptedEngine`] should fail at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFailure {
    Transcribe,
    Align,
    Diarize,
}

/// Speech engine that replays scripted output.
///
/// Checks that the staged audio actually exists, so tests exercise the real
/// staging path.
pub struct ScriptedEngine {
    pub language: String,
    pub segments: Vec<Segment>,
    pub turns: Vec<SpeakerTurn>,
    pub fail_at: Option<EngineFailure>,
    /// Slows transcription down, for shutdown-while-busy tests
    pub stage_delay: Option<Duration>,
    /// Set as soon as transcription begins
    pub transcribe_started: Arc<AtomicBool>,
}

impl ScriptedEngine {
    pub fn new(segments: Vec<Segment>, turns: Vec<SpeakerTurn>) -> Self {
        Self {
            language: "en".to_string(),
            segments,
            turns,
            fail_at: None,
            stage_delay: None,
            transcribe_started: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SpeechEngine for ScriptedEngine {
    fn transcribe(&self, audio: &Path) -> Result<Transcription, EngineError> {
        self.transcribe_started.store(true, Ordering::SeqCst);
        if !audio.is_file() {
            return Err(EngineError::Request(format!(
                "no staged audio at {}",
                audio.display()
            )));
        }
        if let Some(delay) = self.stage_delay {
            std::thread::sleep(delay);
        }
        if self.fail_at == Some(EngineFailure::Transcribe) {
            return Err(EngineError::Request("scripted transcribe failure".to_string()));
        }
        Ok(Transcription {
            language: self.language.clone(),
            segments: self.segments.clone(),
        })
    }

    fn align(
        &self,
        segments: &[Segment],
        _language: &str,
        _audio: &Path,
    ) -> Result<Vec<Segment>, EngineError> {
        if self.fail_at == Some(EngineFailure::Align) {
            return Err(EngineError::Request("scripted align failure".to_string()));
        }
        Ok(segments.to_vec())
    }

    fn diarize(&self, _audio: &Path) -> Result<Vec<SpeakerTurn>, EngineError> {
        if self.fail_at == Some(EngineFailure::Diarize) {
            return Err(EngineError::Request("scripted diarize failure".to_string()));
        }
        Ok(self.turns.clone())
    }
}

/// Summarizer that echoes its input and records what it saw
#[derive(Default)]
pub struct EchoSummarizer {
    pub calls: AtomicUsize,
    pub last_input: Mutex<Option<String>>,
}

impl Summarizer for EchoSummarizer {
    fn summarize(&self, transcript: &str) -> Result<String, SummaryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(transcript.to_string());
        Ok(format!("MINUTES::{transcript}"))
    }
}

/// A full executor wired to a filesystem bucket and scripted engines
pub struct TestPipeline {
    pub bucket: TempDir,
    pub scratch: TempDir,
    pub executor: Arc<JobExecutor>,
    pub summarizer: Arc<EchoSummarizer>,
}

impl TestPipeline {
    pub fn with_engine(engine: ScriptedEngine) -> Self {
        let bucket = tempfile::tempdir().expect("create bucket dir");
        let scratch = tempfile::tempdir().expect("create scratch dir");

        let store = Arc::new(FsObjectStore::new(bucket.path().to_path_buf()));
        let summarizer = Arc::new(EchoSummarizer::default());
        let stager = MediaStager::new(store, scratch.path().to_path_buf());
        let chain = ProcessingChain::new(Arc::new(engine), summarizer.clone(), 0.1, 32_000);
        let executor = Arc::new(JobExecutor::new(stager, chain));

        Self {
            bucket,
            scratch,
            executor,
            summarizer,
        }
    }

    /// Put a recording into the test bucket
    pub fn put_object(&self, key: &str, bytes: &[u8]) {
        let path = self.bucket.path().join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create bucket subdir");
        }
        std::fs::write(path, bytes).expect("write object");
    }

    /// True when no job left a scratch area behind
    pub fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(self.scratch.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false)
    }
}

pub fn descriptor(job_id: &str, source_ref: &str) -> JobDescriptor {
    JobDescriptor {
        job_id: Uuid::parse_str(job_id).expect("valid uuid"),
        source_ref: source_ref.to_string(),
        source_url: None,
        size_bytes: None,
        duration_seconds: Some(600),
    }
}

pub fn speaker_turn(speaker: &str, start: f64, end: f64) -> SpeakerTurn {
    SpeakerTurn {
        speaker: speaker.to_string(),
        start,
        end,
    }
}

/// Broker settings tightened for tests
pub fn fast_broker_settings() -> BrokerSettings {
    let mut settings = BrokerSettings::default();
    settings.poll_timeout_ms = 20;
    settings.flush_interval_ms = 100;
    settings
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}
