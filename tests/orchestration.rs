//! End-to-end orchestration tests over in-memory infrastructure:
//! admission, quota, dispatch routing, in-process execution, and the
//! lifecycle state machine, with no database or broker.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use vaak_backend::dispatch::{Dispatcher, JobExecutor};
use vaak_backend::domain::job::{
    AdmissionPolicy, Job, JobService, JobServiceError, JobStatus, JobTransition, NewJob,
    ProsodyPreset, TtsJobRequest, VoiceAge,
};
use vaak_backend::domain::quota::{PlanTier, QuotaAccount, QuotaLedger};
use vaak_backend::domain::tts::Segmenter;
use vaak_backend::error::{AppError, AppResult};
use vaak_backend::infrastructure::queue::JobQueue;
use vaak_backend::infrastructure::repositories::{
    AccountRepository, JobRepository, UsageRepository, UsageTotals,
};
use vaak_backend::infrastructure::storage::BlobStore;
use vaak_backend::infrastructure::synthesis::{
    wav, AudioPayload, MockSynthesizer, Synthesizer, SynthesizerRegistry,
};

#[derive(Default)]
struct MemoryJobs {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

#[async_trait]
impl JobRepository for MemoryJobs {
    async fn create(&self, new_job: NewJob) -> AppResult<Job> {
        let job = Job {
            id: Uuid::new_v4(),
            owner_id: new_job.owner_id,
            text: new_job.text,
            voice_id: new_job.voice_id,
            language: new_job.language,
            voice_age: new_job.voice_age,
            prosody_preset: new_job.prosody_preset,
            speaker_reference: new_job.speaker_reference,
            status: JobStatus::Queued,
            priority: new_job.priority,
            weighted_cost: new_job.weighted_cost,
            audio_url: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.jobs.lock().insert(job.id, job.clone());
        Ok(job)
    }

    async fn find(&self, job_id: Uuid, owner_id: Uuid) -> AppResult<Option<Job>> {
        Ok(self
            .jobs
            .lock()
            .get(&job_id)
            .filter(|j| j.owner_id == owner_id)
            .cloned())
    }

    async fn find_any(&self, job_id: Uuid) -> AppResult<Option<Job>> {
        Ok(self.jobs.lock().get(&job_id).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .lock()
            .values()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn transition(&self, job_id: Uuid, transition: JobTransition) -> AppResult<Job> {
        let mut jobs = self.jobs.lock();
        let current = jobs
            .get(&job_id)
            .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
        let updated = current.with_transition(&transition, Utc::now())?;
        jobs.insert(job_id, updated.clone());
        Ok(updated)
    }
}

struct MemoryAccounts {
    accounts: Mutex<HashMap<Uuid, QuotaAccount>>,
}

impl MemoryAccounts {
    fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }

    fn with_balance(user_id: Uuid, remaining: i64) -> Self {
        let mut account = QuotaAccount::new(user_id, PlanTier::Free, Utc::now());
        account.remaining = remaining;
        let store = Self::new();
        store.accounts.lock().insert(user_id, account);
        store
    }

    fn remaining(&self, user_id: Uuid) -> i64 {
        self.accounts.lock().get(&user_id).unwrap().remaining
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn find_or_create(&self, user_id: Uuid) -> AppResult<QuotaAccount> {
        let mut accounts = self.accounts.lock();
        let account = accounts
            .entry(user_id)
            .or_insert_with(|| QuotaAccount::new(user_id, PlanTier::Free, Utc::now()));
        Ok(account.clone())
    }

    async fn save(&self, account: &QuotaAccount) -> AppResult<()> {
        self.accounts
            .lock()
            .insert(account.user_id, account.clone());
        Ok(())
    }

    async fn debit(&self, user_id: Uuid, amount: i64) -> AppResult<()> {
        if let Some(account) = self.accounts.lock().get_mut(&user_id) {
            account.debit(amount);
        }
        Ok(())
    }
}

#[derive(Default)]
struct MemoryUsage {
    records: Mutex<Vec<(Uuid, Uuid, i64)>>,
}

#[async_trait]
impl UsageRepository for MemoryUsage {
    async fn append(&self, user_id: Uuid, job_id: Uuid, characters: i64) -> AppResult<()> {
        self.records.lock().push((user_id, job_id, characters));
        Ok(())
    }

    async fn totals_since(
        &self,
        user_id: Uuid,
        _since: chrono::DateTime<Utc>,
    ) -> AppResult<UsageTotals> {
        let records = self.records.lock();
        let mine: Vec<_> = records.iter().filter(|(u, _, _)| *u == user_id).collect();
        Ok(UsageTotals {
            characters: mine.iter().map(|(_, _, c)| c).sum(),
            requests: mine.len() as i64,
        })
    }
}

struct MemoryQueue {
    healthy: AtomicBool,
    enqueued: Mutex<Vec<(Uuid, i32)>>,
}

impl MemoryQueue {
    fn new(healthy: bool) -> Self {
        Self {
            healthy: AtomicBool::new(healthy),
            enqueued: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, job_id: Uuid, priority: i32) -> Result<(), String> {
        self.enqueued.lock().push((job_id, priority));
        Ok(())
    }

    async fn ping(&self, _timeout: Duration) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct MemoryBlobs {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn put(&self, bytes: &[u8], key: &str) -> Result<String, String> {
        self.objects.lock().insert(key.to_string(), bytes.to_vec());
        Ok(format!("http://localhost:8080/storage/{key}"))
    }
}

/// Synthesizer that always fails, for failure-path tests.
struct BrokenSynthesizer;

#[async_trait]
impl Synthesizer for BrokenSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        _spec: &vaak_backend::infrastructure::synthesis::SynthesisSpec,
    ) -> Result<AudioPayload, String> {
        Err("engine unavailable".to_string())
    }

    fn max_chunk_chars(&self) -> usize {
        250
    }

    fn audio_format(&self) -> &'static str {
        "wav"
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

struct Harness {
    service: JobService,
    jobs: Arc<MemoryJobs>,
    accounts: Arc<MemoryAccounts>,
    usage: Arc<MemoryUsage>,
    queue: Arc<MemoryQueue>,
    blobs: Arc<MemoryBlobs>,
}

struct HarnessOptions {
    broker_healthy: bool,
    allow_degraded_routing: bool,
    initial_balance: Option<(Uuid, i64)>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            broker_healthy: true,
            allow_degraded_routing: false,
            initial_balance: None,
            synthesizer: Arc::new(MockSynthesizer),
        }
    }
}

fn build_harness(options: HarnessOptions) -> Harness {
    let jobs = Arc::new(MemoryJobs::default());
    let accounts = Arc::new(match options.initial_balance {
        Some((user_id, remaining)) => MemoryAccounts::with_balance(user_id, remaining),
        None => MemoryAccounts::new(),
    });
    let usage = Arc::new(MemoryUsage::default());
    let queue = Arc::new(MemoryQueue::new(options.broker_healthy));
    let blobs = Arc::new(MemoryBlobs::default());

    let ledger = Arc::new(QuotaLedger::new(accounts.clone()));
    let registry = Arc::new(SynthesizerRegistry::new(
        options.synthesizer.clone(),
        options.synthesizer,
    ));
    let executor = Arc::new(JobExecutor::new(
        jobs.clone(),
        registry,
        blobs.clone(),
        ledger.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        queue.clone(),
        jobs.clone(),
        executor,
        options.allow_degraded_routing,
        Duration::from_millis(10),
    ));
    let service = JobService::new(
        jobs.clone(),
        usage.clone(),
        ledger,
        dispatcher,
        AdmissionPolicy {
            max_chars_per_request: 2000,
            high_cost_language_multiplier: 2.0,
            enable_voice_cloning: false,
        },
    );

    Harness {
        service,
        jobs,
        accounts,
        usage,
        queue,
        blobs,
    }
}

fn request(text: &str, language: &str) -> TtsJobRequest {
    TtsJobRequest {
        text: text.to_string(),
        voice_id: "voice-1".to_string(),
        language: language.to_string(),
        voice_age: VoiceAge::Adult,
        prosody_preset: ProsodyPreset::Neutral,
        speaker_reference: None,
    }
}

/// Wait for a spawned in-process execution to reach a terminal state.
async fn await_terminal(jobs: &MemoryJobs, job_id: Uuid) -> Job {
    for _ in 0..200 {
        if let Some(job) = jobs.find_any(job_id).await.unwrap() {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

#[tokio::test]
async fn insufficient_quota_rejects_without_side_effects() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions {
        initial_balance: Some((user_id, 50)),
        ..Default::default()
    });

    // 40 chars of Hindi at 2.0 weighting needs 80
    let text = "क".repeat(40);
    let result = harness.service.submit(user_id, request(&text, "hi")).await;

    assert!(matches!(result, Err(JobServiceError::InsufficientQuota(_))));
    assert!(harness.jobs.jobs.lock().is_empty());
    assert!(harness.usage.records.lock().is_empty());
    assert_eq!(harness.accounts.remaining(user_id), 50);
}

#[tokio::test]
async fn standard_language_completes_in_process() {
    let user_id = Uuid::new_v4();
    // Broker is down, but standard jobs never need it
    let harness = build_harness(HarnessOptions {
        broker_healthy: false,
        ..Default::default()
    });

    let submitted = harness
        .service
        .submit(user_id, request("Hello world. This is a test.", "en"))
        .await
        .unwrap();
    assert_eq!(submitted.status, JobStatus::Queued);

    let done = await_terminal(&harness.jobs, submitted.id).await;
    assert_eq!(done.status, JobStatus::Completed);
    let url = done.audio_url.expect("completed job carries audio url");
    assert!(url.contains(&format!("audio/{user_id}/{}.wav", done.id)));
    assert!(done.started_at.is_some());
    assert!(done.completed_at.is_some());
    assert!(harness.queue.enqueued.lock().is_empty());

    // Unweighted cost deducted once
    let cost = "Hello world. This is a test.".chars().count() as i64;
    assert_eq!(harness.accounts.remaining(user_id), 1_000_000 - cost);
    assert_eq!(harness.usage.records.lock().len(), 1);
}

#[tokio::test]
async fn multi_chunk_job_uploads_one_well_formed_wav() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions::default());

    // Long enough to span several 250-char mock chunks
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(16);
    let submitted = harness
        .service
        .submit(user_id, request(&text, "en"))
        .await
        .unwrap();
    let done = await_terminal(&harness.jobs, submitted.id).await;
    assert_eq!(done.status, JobStatus::Completed);

    let chunks = Segmenter::new(250).segment(&text);
    assert!(chunks.len() > 1, "scenario must span multiple chunks");

    let key = format!("audio/{user_id}/{}.wav", done.id);
    let bytes = harness
        .blobs
        .objects
        .lock()
        .get(&key)
        .cloned()
        .expect("uploaded blob");

    // Exactly one container wrapping the whole job, with a length
    // field that covers the full file
    let riff_count = bytes.windows(4).filter(|w| *w == b"RIFF").count();
    assert_eq!(riff_count, 1);
    let declared = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
    assert_eq!(declared, bytes.len() - 8);

    // And the payload is every chunk's samples back to back
    let (rate, samples) = wav::extract_pcm16(&bytes).unwrap();
    assert_eq!(rate, 22_050);
    let expected_chars: usize = chunks.iter().map(|c| c.chars().count()).sum();
    // Mock emits 160 16-bit samples per character
    assert_eq!(samples.len(), expected_chars * 160 * 2);
}

#[tokio::test]
async fn high_resource_language_goes_to_distributed_queue() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions::default());

    let submitted = harness
        .service
        .submit(user_id, request("नमस्ते दुनिया", "hi-IN"))
        .await
        .unwrap();

    // Handed to the worker pool: stays queued on our side
    assert_eq!(submitted.status, JobStatus::Queued);
    let enqueued = harness.queue.enqueued.lock().clone();
    assert_eq!(enqueued, vec![(submitted.id, 0)]);

    let stored = harness.jobs.find_any(submitted.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Queued);

    // Weighted cost recorded at admission, deduction deferred to the worker
    assert_eq!(
        stored.weighted_cost,
        ("नमस्ते दुनिया".chars().count() as f64 * 2.0) as i64
    );
    assert_eq!(harness.usage.records.lock().len(), 1);
}

#[tokio::test]
async fn high_resource_with_down_broker_fails_fast() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions {
        broker_healthy: false,
        ..Default::default()
    });

    let submitted = harness
        .service
        .submit(user_id, request("வணக்கம் உலகம்", "ta"))
        .await
        .unwrap();

    assert_eq!(submitted.status, JobStatus::Failed);
    let message = submitted.error_message.expect("failed job carries a cause");
    assert!(message.contains("broker unavailable"));
    assert!(harness.queue.enqueued.lock().is_empty());

    // The audit record exists even for the rejected dispatch
    assert_eq!(harness.usage.records.lock().len(), 1);
}

#[tokio::test]
async fn degraded_routing_runs_high_resource_in_process() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions {
        broker_healthy: false,
        allow_degraded_routing: true,
        ..Default::default()
    });

    let submitted = harness
        .service
        .submit(user_id, request("नमस्ते दुनिया", "hi"))
        .await
        .unwrap();
    assert_eq!(submitted.status, JobStatus::Queued);

    let done = await_terminal(&harness.jobs, submitted.id).await;
    assert_eq!(done.status, JobStatus::Completed);
    assert!(harness.queue.enqueued.lock().is_empty());
}

#[tokio::test]
async fn synthesis_failure_charges_quota_and_records_cause() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions {
        synthesizer: Arc::new(BrokenSynthesizer),
        ..Default::default()
    });

    let submitted = harness
        .service
        .submit(user_id, request("Hello world.", "en"))
        .await
        .unwrap();

    let done = await_terminal(&harness.jobs, submitted.id).await;
    assert_eq!(done.status, JobStatus::Failed);
    let message = done.error_message.unwrap();
    assert!(message.contains("engine unavailable"), "{message}");
    assert!(done.audio_url.is_none());

    // Failed jobs still consume their admitted characters
    let cost = "Hello world.".chars().count() as i64;
    assert_eq!(harness.accounts.remaining(user_id), 1_000_000 - cost);
}

#[tokio::test]
async fn oversize_and_empty_requests_are_rejected_at_admission() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions::default());

    let result = harness.service.submit(user_id, request("   ", "en")).await;
    assert!(matches!(result, Err(JobServiceError::Validation(_))));

    let big = "a".repeat(2001);
    let result = harness.service.submit(user_id, request(&big, "en")).await;
    assert!(matches!(result, Err(JobServiceError::TooLarge(_))));

    assert!(harness.jobs.jobs.lock().is_empty());
    assert!(harness.usage.records.lock().is_empty());
}

#[tokio::test]
async fn voice_cloning_requires_flag_and_paid_tier() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions::default());

    let mut cloning = request("Hello there.", "en");
    cloning.speaker_reference = Some("ref-sample-1".to_string());

    // Disabled globally by the harness policy
    let result = harness.service.submit(user_id, cloning).await;
    assert!(matches!(result, Err(JobServiceError::Validation(_))));
}

#[tokio::test]
async fn job_lookup_is_ownership_scoped() {
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let harness = build_harness(HarnessOptions::default());

    let job = harness
        .service
        .submit(owner, request("Hello world.", "en"))
        .await
        .unwrap();

    assert!(harness.service.get(job.id, owner).await.is_ok());
    assert!(matches!(
        harness.service.get(job.id, stranger).await,
        Err(JobServiceError::NotFound)
    ));
}

#[tokio::test]
async fn terminal_jobs_reject_further_transitions() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions::default());

    let submitted = harness
        .service
        .submit(user_id, request("Hello world.", "en"))
        .await
        .unwrap();
    let done = await_terminal(&harness.jobs, submitted.id).await;
    assert_eq!(done.status, JobStatus::Completed);

    let result = harness
        .jobs
        .transition(done.id, JobTransition::failed("late failure"))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let unchanged = harness.jobs.find_any(done.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, JobStatus::Completed);
    assert!(unchanged.error_message.is_none());
}

#[tokio::test]
async fn history_is_newest_first_and_paged() {
    let user_id = Uuid::new_v4();
    let harness = build_harness(HarnessOptions::default());

    for i in 0..3 {
        harness
            .service
            .submit(user_id, request(&format!("Sentence number {i}."), "en"))
            .await
            .unwrap();
        // Distinct created_at ordering
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let page = harness.service.history(user_id, 2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(page[0].created_at >= page[1].created_at);

    let rest = harness.service.history(user_id, 2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
}
