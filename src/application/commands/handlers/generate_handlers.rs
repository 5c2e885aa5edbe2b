//! Generate Command Handlers

use std::sync::Arc;

use chrono::Local;
use futures_util::stream::{self, StreamExt};
use uuid::Uuid;

use crate::application::commands::generate_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ArchiveBuilderPort, ArchiveEntry, ArchiveStoragePort, SynthesisRequest, TtsEnginePort,
};
use crate::application::retry::RetryPolicy;
use crate::domain::{index_fragments, split, Fragment};
use crate::infrastructure::events::EventPublisher;

/// 默认归档名前缀
pub const DEFAULT_ARCHIVE_PREFIX: &str = "audios_generados";

/// 单个片段的合成结果
enum FragmentOutcome {
    Synthesized(SynthesizedFragment, Vec<u8>),
    Failed(FailedFragment),
}

/// GenerateAudio Handler - 批量合成
///
/// 每个片段独立合成；失败只记录在响应中，不中断整批。
/// 并发度大于 1 时请求并发发出，结果仍按片段序号组装。
pub struct GenerateAudioHandler {
    tts_engine: Arc<dyn TtsEnginePort>,
    archive_builder: Arc<dyn ArchiveBuilderPort>,
    archive_storage: Arc<dyn ArchiveStoragePort>,
    event_publisher: Arc<EventPublisher>,
    retry_policy: RetryPolicy,
    concurrency: usize,
    archive_prefix: String,
}

impl GenerateAudioHandler {
    pub fn new(
        tts_engine: Arc<dyn TtsEnginePort>,
        archive_builder: Arc<dyn ArchiveBuilderPort>,
        archive_storage: Arc<dyn ArchiveStoragePort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            tts_engine,
            archive_builder,
            archive_storage,
            event_publisher,
            retry_policy: RetryPolicy::default(),
            concurrency: 1,
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_archive_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.archive_prefix = prefix.into();
        self
    }

    pub async fn handle(
        &self,
        cmd: GenerateAudioCommand,
    ) -> Result<GenerateAudioResponse, ApplicationError> {
        if cmd.voice_id.trim().is_empty() {
            return Err(ApplicationError::validation("Voice id cannot be empty"));
        }

        let fragments = index_fragments(split(&cmd.text, cmd.max_chars)?);
        if fragments.is_empty() {
            return Err(ApplicationError::validation("Nothing to synthesize"));
        }

        let run_id = Uuid::new_v4();
        let total = fragments.len();

        tracing::info!(
            run_id = %run_id,
            total,
            voice_id = %cmd.voice_id,
            max_chars = cmd.max_chars,
            concurrency = self.concurrency,
            "Starting synthesis batch"
        );

        // buffered 保持输入顺序
        let outcomes: Vec<FragmentOutcome> = stream::iter(
            fragments
                .into_iter()
                .map(|fragment| self.synthesize_fragment(run_id, total, &cmd, fragment)),
        )
        .buffered(self.concurrency)
        .collect()
        .await;

        let mut synthesized = Vec::new();
        let mut failed = Vec::new();
        let mut entries = Vec::new();
        for outcome in outcomes {
            match outcome {
                FragmentOutcome::Synthesized(fragment, audio) => {
                    entries.push(ArchiveEntry::new(fragment.filename.clone(), audio));
                    synthesized.push(fragment);
                }
                FragmentOutcome::Failed(fragment) => failed.push(fragment),
            }
        }

        self.event_publisher
            .publish_batch_completed(run_id, synthesized.len(), failed.len());

        let archive = if entries.is_empty() {
            tracing::warn!(run_id = %run_id, total, "No fragment synthesized, skipping archive");
            None
        } else {
            Some(self.store_archive(&entries).await?)
        };

        tracing::info!(
            run_id = %run_id,
            succeeded = synthesized.len(),
            failed = failed.len(),
            archive = ?archive.as_ref().map(|a| &a.path),
            "Synthesis batch completed"
        );

        Ok(GenerateAudioResponse {
            run_id,
            total,
            synthesized,
            failed,
            archive,
        })
    }

    async fn synthesize_fragment(
        &self,
        run_id: Uuid,
        total: usize,
        cmd: &GenerateAudioCommand,
        fragment: Fragment,
    ) -> FragmentOutcome {
        self.event_publisher
            .publish_fragment_started(run_id, fragment.index, total);

        let request = SynthesisRequest {
            text: fragment.text.clone(),
            voice_id: cmd.voice_id.clone(),
            model_id: cmd.model_id.clone(),
            settings: cmd.settings,
        };

        let (result, attempts) = self
            .retry_policy
            .run(|attempt| {
                tracing::debug!(
                    index = fragment.index,
                    total,
                    attempt,
                    text_len = request.text.chars().count(),
                    "Synthesizing fragment"
                );
                self.tts_engine.synthesize(&request)
            })
            .await;

        match result {
            Ok(audio) => {
                self.event_publisher.publish_fragment_synthesized(
                    run_id,
                    fragment.index,
                    total,
                    audio.len(),
                    attempts,
                );
                FragmentOutcome::Synthesized(
                    SynthesizedFragment {
                        index: fragment.index,
                        filename: fragment.audio_filename(),
                        text: fragment.text,
                        audio_size: audio.len(),
                        attempts,
                    },
                    audio,
                )
            }
            Err(error) => {
                tracing::error!(
                    index = fragment.index,
                    total,
                    attempts,
                    kind = error.kind(),
                    error = %error,
                    "Fragment synthesis failed"
                );
                self.event_publisher.publish_fragment_failed(
                    run_id,
                    fragment.index,
                    total,
                    &error.to_string(),
                    attempts,
                );
                FragmentOutcome::Failed(FailedFragment {
                    index: fragment.index,
                    text: fragment.text,
                    error,
                    attempts,
                })
            }
        }
    }

    async fn store_archive(
        &self,
        entries: &[ArchiveEntry],
    ) -> Result<StoredArchive, ApplicationError> {
        let bytes = self.archive_builder.build(entries)?;
        let name = archive_name(&self.archive_prefix, Local::now());
        let path = self.archive_storage.save(&name, &bytes).await?;

        Ok(StoredArchive {
            name,
            path,
            size: bytes.len(),
        })
    }
}

/// 带时间戳的归档名：`{prefix}_{YYYYmmdd_HHMMSS}.zip`
pub fn archive_name<Tz>(prefix: &str, now: chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.zip", prefix, now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::application::ports::{ArchiveStorageError, TtsError, VoiceSettings};
    use crate::infrastructure::adapters::{FakeTtsClient, ZipArchiveBuilder};
    use crate::infrastructure::events::ProgressEvent;

    #[derive(Default)]
    struct MemoryArchiveStorage {
        saved: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl ArchiveStoragePort for MemoryArchiveStorage {
        async fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArchiveStorageError> {
            self.saved
                .lock()
                .unwrap()
                .push((name.to_string(), bytes.to_vec()));
            Ok(PathBuf::from("/memory").join(name))
        }
    }

    fn command(text: &str, max_chars: usize) -> GenerateAudioCommand {
        GenerateAudioCommand {
            text: text.to_string(),
            voice_id: "voice-1".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            settings: VoiceSettings::default(),
            max_chars,
        }
    }

    fn handler(
        tts: Arc<FakeTtsClient>,
        storage: Arc<MemoryArchiveStorage>,
        publisher: Arc<EventPublisher>,
    ) -> GenerateAudioHandler {
        GenerateAudioHandler::new(tts, Arc::new(ZipArchiveBuilder::new()), storage, publisher)
            .with_retry_policy(RetryPolicy::new(3, Duration::ZERO))
    }

    fn zip_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_generates_one_file_per_fragment_in_order() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let storage = Arc::new(MemoryArchiveStorage::default());
        let handler = handler(tts.clone(), storage.clone(), EventPublisher::new().arc());

        let response = handler
            .handle(command("Line one.\nLine two.\nLine three.", 220))
            .await
            .unwrap();

        assert!(response.is_complete());
        assert_eq!(response.total, 3);
        let files: Vec<_> = response.synthesized.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(files, vec!["1.mp3", "2.mp3", "3.mp3"]);
        assert_eq!(tts.requests(), vec!["Line one.", "Line two.", "Line three."]);

        let saved = storage.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].0.starts_with("audios_generados_"));
        assert_eq!(zip_names(&saved[0].1), vec!["1.mp3", "2.mp3", "3.mp3"]);
        assert_eq!(response.archive.unwrap().size, saved[0].1.len());
    }

    #[tokio::test]
    async fn test_failed_fragment_does_not_abort_batch() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        tts.fail_text("Line two", vec![TtsError::Unauthorized("401".into())]);
        let storage = Arc::new(MemoryArchiveStorage::default());
        let handler = handler(tts.clone(), storage.clone(), EventPublisher::new().arc());

        let response = handler
            .handle(command("Line one.\nLine two.\nLine three.", 220))
            .await
            .unwrap();

        assert!(!response.is_complete());
        assert_eq!(response.failed.len(), 1);
        assert_eq!(response.failed[0].index, 2);
        assert_eq!(response.failed[0].attempts, 1);

        let saved = storage.saved.lock().unwrap();
        assert_eq!(zip_names(&saved[0].1), vec!["1.mp3", "3.mp3"]);
    }

    #[tokio::test]
    async fn test_rate_limited_fragment_is_retried() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        tts.fail_text("Line one", vec![TtsError::RateLimited, TtsError::RateLimited]);
        let storage = Arc::new(MemoryArchiveStorage::default());
        let handler = handler(tts.clone(), storage, EventPublisher::new().arc());

        let response = handler.handle(command("Line one.", 220)).await.unwrap();

        assert!(response.is_complete());
        assert_eq!(response.synthesized[0].attempts, 3);
        assert_eq!(tts.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_no_archive_when_everything_fails() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        tts.fail_text("", vec![TtsError::MissingApiKey; 4]);
        let storage = Arc::new(MemoryArchiveStorage::default());
        let handler = handler(tts, storage.clone(), EventPublisher::new().arc());

        let response = handler.handle(command("Uno.\nDos.", 220)).await.unwrap();

        assert!(response.archive.is_none());
        assert_eq!(response.failed.len(), 2);
        assert!(storage.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let storage = Arc::new(MemoryArchiveStorage::default());
        let handler = handler(tts.clone(), storage, EventPublisher::new().arc());

        let result = handler.handle(command("  \n ", 220)).await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert!(tts.requests().is_empty());
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let storage = Arc::new(MemoryArchiveStorage::default());
        let handler = handler(tts, storage, EventPublisher::new().arc());

        let result = handler.handle(command("Hola.", 0)).await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_dispatch_keeps_fragment_order() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        // 序号越小延迟越长，先发出的片段最后完成
        for i in 1..=8u64 {
            tts.delay_text(&format!("number {}.", i), Duration::from_millis((9 - i) * 10));
        }
        let storage = Arc::new(MemoryArchiveStorage::default());
        let publisher = EventPublisher::new().arc();
        let mut rx = publisher.subscribe();
        let handler = handler(tts, storage.clone(), publisher).with_concurrency(4);

        let text = (1..=8)
            .map(|i| format!("Fragment number {}.", i))
            .collect::<Vec<_>>()
            .join("\n");
        let response = handler.handle(command(&text, 220)).await.unwrap();

        let mut completed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProgressEvent::FragmentSynthesized { index, .. } = event {
                completed.push(index);
            }
        }
        assert_eq!(completed.len(), 8);
        assert_eq!(completed[0], 4, "completion order: {:?}", completed);

        let indices: Vec<_> = response.synthesized.iter().map(|f| f.index).collect();
        assert_eq!(indices, (1..=8).collect::<Vec<_>>());
        let texts: Vec<_> = response.synthesized.iter().map(|f| f.text.clone()).collect();
        let expected_texts: Vec<_> = (1..=8).map(|i| format!("Fragment number {}.", i)).collect();
        assert_eq!(texts, expected_texts);

        let saved = storage.saved.lock().unwrap();
        let expected: Vec<_> = (1..=8).map(|i| format!("{}.mp3", i)).collect();
        assert_eq!(zip_names(&saved[0].1), expected);

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(saved[0].1.clone())).unwrap();
        let mut first = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("1.mp3").unwrap(), &mut first).unwrap();
        assert_eq!(first, "FAKE-MP3:voice-1:Fragment number 1.");
    }

    #[tokio::test]
    async fn test_progress_events_published() {
        let tts = Arc::new(FakeTtsClient::with_defaults());
        let storage = Arc::new(MemoryArchiveStorage::default());
        let publisher = EventPublisher::new().arc();
        let mut rx = publisher.subscribe();
        let handler = handler(tts, storage, publisher);

        handler.handle(command("A.\nB.", 220)).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], ProgressEvent::FragmentStarted { index: 1, total: 2, .. }));
        assert!(matches!(
            events[4],
            ProgressEvent::BatchCompleted { succeeded: 2, failed: 0, .. }
        ));
    }

    #[test]
    fn test_archive_name_format() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(archive_name("audios", now), "audios_20240309_070501.zip");
    }
}
