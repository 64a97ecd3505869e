//! Session controller: the arbitration point for every thread
//! operation.
//!
//! Owns the thread store, the per-kind pending flags, the composer
//! input, the voice playback state, and the derived speaking signal.
//! All mutations happen through `&mut self` methods that run to
//! completion around a single remote-call suspension point, so an
//! optimistic append is always observable before its request is issued
//! and reconciliation always follows that request's outcome.

use std::fmt;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::backend::{Backend, SyncProfileRequest};
use crate::config::CoreConfig;
use crate::constants::{
    DEFAULT_ANIMATION, DEFAULT_PRACTICE_PROMPT, THREAD_UNAVAILABLE_NOTICE, UPLOAD_CONFIRMATION,
    VOICE_DELIVERED_MESSAGE, VOICE_READY_MESSAGE,
};
use crate::models::{EtaProfile, Message, Persona, Thread};
use crate::speaking::SpeakingCoordinator;
use crate::storage::IdStore;
use crate::store::ThreadStore;
use crate::voice::{VoicePlayback, VoiceReply};

/// The four mutually exclusive composer actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionKind {
    #[default]
    Send,
    Notes,
    Practice,
    Voice,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Send,
        ActionKind::Notes,
        ActionKind::Practice,
        ActionKind::Voice,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Send => "send",
            ActionKind::Notes => "notes",
            ActionKind::Practice => "practice",
            ActionKind::Voice => "voice",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One in-flight flag per action kind plus the independent upload flag.
/// A flag is true for the lifetime of exactly one outstanding request;
/// a second request of the same kind is refused while it is set.
#[derive(Debug, Default)]
pub struct PendingFlags {
    send: bool,
    notes: bool,
    practice: bool,
    voice: bool,
    upload: bool,
}

impl PendingFlags {
    pub fn get(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Send => self.send,
            ActionKind::Notes => self.notes,
            ActionKind::Practice => self.practice,
            ActionKind::Voice => self.voice,
        }
    }

    fn set(&mut self, kind: ActionKind, value: bool) {
        match kind {
            ActionKind::Send => self.send = value,
            ActionKind::Notes => self.notes = value,
            ActionKind::Practice => self.practice = value,
            ActionKind::Voice => self.voice = value,
        }
    }

    pub fn upload(&self) -> bool {
        self.upload
    }

    pub fn any(&self) -> bool {
        self.send || self.notes || self.practice || self.voice || self.upload
    }
}

pub struct SessionController<B: Backend> {
    backend: B,
    config: CoreConfig,
    id_store: IdStore,
    store: ThreadStore,
    profile: Option<EtaProfile>,
    persona: Persona,
    input: String,
    selected_action: ActionKind,
    pending: PendingFlags,
    creating_thread: bool,
    fetching_threads: bool,
    loading_thread_id: Option<String>,
    error_notice: Option<String>,
    expanded_message: Option<Message>,
    voice: VoicePlayback,
    speaking: SpeakingCoordinator,
}

impl<B: Backend> SessionController<B> {
    pub fn new(backend: B, config: CoreConfig) -> Self {
        let id_store = IdStore::new(&config.data_dir);
        Self {
            backend,
            config,
            id_store,
            store: ThreadStore::new(),
            profile: None,
            persona: Persona::default(),
            input: String::new(),
            selected_action: ActionKind::default(),
            pending: PendingFlags::default(),
            creating_thread: false,
            fetching_threads: false,
            loading_thread_id: None,
            error_notice: None,
            expanded_message: None,
            voice: VoicePlayback::default(),
            speaking: SpeakingCoordinator::new(),
        }
    }

    // ─── Read views ─────────────────────────────────────────────────

    pub fn store(&self) -> &ThreadStore {
        &self.store
    }

    pub fn threads(&self) -> &[Thread] {
        self.store.threads()
    }

    pub fn active_thread(&self) -> Option<&Thread> {
        self.store.active_thread()
    }

    pub fn active_messages(&self) -> &[Message] {
        self.store.active_messages()
    }

    pub fn profile(&self) -> Option<&EtaProfile> {
        self.profile.as_ref()
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn selected_action(&self) -> ActionKind {
        self.selected_action
    }

    pub fn pending(&self) -> &PendingFlags {
        &self.pending
    }

    pub fn is_creating_thread(&self) -> bool {
        self.creating_thread
    }

    pub fn is_fetching_threads(&self) -> bool {
        self.fetching_threads
    }

    pub fn loading_thread_id(&self) -> Option<&str> {
        self.loading_thread_id.as_deref()
    }

    pub fn error_notice(&self) -> Option<&str> {
        self.error_notice.as_deref()
    }

    pub fn expanded_message(&self) -> Option<&Message> {
        self.expanded_message.as_ref()
    }

    pub fn voice(&self) -> &VoicePlayback {
        &self.voice
    }

    pub fn is_speaking(&self, now: Instant) -> bool {
        self.speaking.is_speaking(now)
    }

    pub fn animation_hint(&self) -> Option<&str> {
        self.speaking.animation_hint()
    }

    // ─── UI entry points ────────────────────────────────────────────

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn set_persona(&mut self, persona: Persona) {
        self.persona = persona;
    }

    pub fn select_action(&mut self, kind: ActionKind) {
        self.selected_action = kind;
    }

    pub fn close_expanded_message(&mut self) {
        self.expanded_message = None;
    }

    // ─── Identity gate ──────────────────────────────────────────────

    fn eta_id(&self) -> Option<String> {
        self.profile
            .as_ref()
            .and_then(EtaProfile::eta_id)
            .map(str::to_string)
    }

    fn require_identity(&mut self, notice: &str) -> Option<String> {
        match self.eta_id() {
            Some(id) => Some(id),
            None => {
                self.error_notice = Some(notice.to_string());
                None
            }
        }
    }

    /// Resolve the authenticated identity into an eta id, seeding the
    /// request with any locally persisted id. Blocks thread operations
    /// until it succeeds.
    pub async fn sync_profile(
        &mut self,
        name: &str,
        email: Option<&str>,
        auth_subject: &str,
    ) -> bool {
        let stored = match self.id_store.load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!(%err, "stored eta id unreadable, continuing without it");
                None
            }
        };

        if stored.is_none() && email.is_none() {
            self.error_notice = Some(
                "An email address is required to create your ETA workspace. \
                 Please update your profile and try again."
                    .to_string(),
            );
            return false;
        }

        let request = SyncProfileRequest {
            name: name.to_string(),
            email: email.map(str::to_string),
            auth_subject: auth_subject.to_string(),
            eta_id: stored,
        };
        match self.backend.sync_profile(request).await {
            Ok(profile) => {
                if let Some(eta_id) = profile.eta_id() {
                    if let Err(err) = self.id_store.store(Some(eta_id)) {
                        warn!(%err, "unable to persist eta id locally");
                    }
                }
                self.profile = Some(profile);
                self.error_notice = None;
                true
            }
            Err(err) => {
                error!(%err, "failed to sync profile");
                self.error_notice = Some(err.to_string());
                false
            }
        }
    }

    /// Authentication ended: drop the profile, empty the store, release
    /// any held voice resource, and forget the persisted id.
    pub fn clear_identity(&mut self) {
        self.profile = None;
        self.store.clear();
        self.close_voice();
        self.speaking.reset();
        self.expanded_message = None;
        if let Err(err) = self.id_store.store(None) {
            warn!(%err, "unable to clear persisted eta id");
        }
    }

    // ─── Thread loading and selection ───────────────────────────────

    pub async fn load_threads(&mut self) -> bool {
        let Some(eta_id) = self.require_identity("Please sign in to load your sessions.") else {
            return false;
        };

        self.fetching_threads = true;
        let result = self.backend.fetch_user(&eta_id).await;
        self.fetching_threads = false;

        match result {
            Ok(bundle) => {
                let threads: Vec<Thread> = bundle
                    .threads
                    .iter()
                    .enumerate()
                    .filter_map(|(index, raw)| Thread::from_raw(raw, index))
                    .collect();
                debug!(count = threads.len(), "thread bundle loaded");
                self.store.replace_all(threads);
                self.error_notice = None;
                true
            }
            Err(err) => {
                error!(%err, "failed to load threads");
                self.error_notice = Some(err.to_string());
                false
            }
        }
    }

    pub async fn create_thread(&mut self, activate: bool) -> Option<String> {
        if self.creating_thread {
            debug!("thread creation already pending");
            return None;
        }
        let eta_id = self.require_identity("Please sign in to start a session.")?;

        self.creating_thread = true;
        let result = self.backend.create_thread(&eta_id, None).await;
        self.creating_thread = false;

        match result {
            Ok(response) => {
                let raw = response.thread?;
                let thread_id = self.store.upsert_from_server(&raw, None)?;
                if activate {
                    self.store.set_active(Some(&thread_id));
                    self.expanded_message = None;
                }
                self.error_notice = None;
                Some(thread_id)
            }
            Err(err) => {
                error!(%err, "failed to create thread");
                self.error_notice = Some(err.to_string());
                None
            }
        }
    }

    /// The active thread id, lazily creating and activating a thread
    /// when the user has none. `None` means the caller must abort with
    /// a notice; the store is left unchanged in that case.
    pub async fn ensure_thread_id(&mut self) -> Option<String> {
        if let Some(id) = self.store.active_thread_id() {
            return Some(id.to_string());
        }
        self.create_thread(true).await
    }

    pub async fn select_thread(&mut self, thread_id: &str) -> bool {
        let Some(eta_id) = self.require_identity("Please sign in to open a session.") else {
            return false;
        };

        if self.store.active_thread_id() != Some(thread_id) {
            // switching threads tears down any live voice reply
            self.close_voice();
        }
        self.store.set_active(Some(thread_id));
        self.expanded_message = None;

        self.loading_thread_id = Some(thread_id.to_string());
        let result = self.backend.fetch_thread(&eta_id, thread_id).await;
        self.loading_thread_id = None;

        // the user may have moved on while the fetch was in flight
        if self.store.active_thread_id() != Some(thread_id) {
            debug!(thread_id, "discarding stale thread fetch");
            return false;
        }

        match result {
            Ok(response) => {
                if let Some(raw) = response.thread {
                    self.store.upsert_from_server(&raw, Some(thread_id));
                }
                self.error_notice = None;
                true
            }
            Err(err) => {
                error!(%err, thread_id, "failed to open thread");
                self.error_notice = Some(err.to_string());
                false
            }
        }
    }

    // ─── Primary actions ────────────────────────────────────────────

    pub async fn dispatch_primary_action(&mut self) {
        match self.selected_action {
            ActionKind::Send => self.send().await,
            ActionKind::Notes => self.generate_notes().await,
            ActionKind::Practice => self.generate_practice().await,
            ActionKind::Voice => self.request_voice().await,
        }
    }

    pub async fn send(&mut self) {
        if self.pending.get(ActionKind::Send) {
            debug!("send refused: already pending");
            return;
        }
        let Some(eta_id) = self.require_identity("Please sign in to send messages.") else {
            return;
        };
        let trimmed = self.input.trim().to_string();
        if trimmed.is_empty() {
            self.error_notice = Some("Please enter a message to send.".to_string());
            return;
        }
        let Some(thread_id) = self.ensure_thread_id().await else {
            self.error_notice = Some(THREAD_UNAVAILABLE_NOTICE.to_string());
            return;
        };

        // reflect intent before the network round trip
        self.input.clear();
        self.expanded_message = None;
        self.error_notice = None;

        let message = Message::optimistic_user(trimmed.clone());
        let optimistic_id = message.optimistic_id.clone().unwrap_or_default();
        self.store.append_optimistic(&thread_id, message);

        self.pending.set(ActionKind::Send, true);
        self.speaking.begin_reply();

        let result = self
            .backend
            .send_message(&eta_id, &thread_id, &trimmed, self.persona)
            .await;

        self.pending.set(ActionKind::Send, false);
        self.speaking.end_reply(Instant::now());

        match result {
            Ok(response) => {
                let upserted = response
                    .thread
                    .as_ref()
                    .and_then(|raw| self.store.upsert_from_server(raw, Some(&thread_id)));
                if upserted.is_none() {
                    warn!(thread_id, "send succeeded but the echoed thread was unusable");
                    self.error_notice = Some(
                        "Your message was delivered, but the reply could not be displayed. \
                         Try reopening this session."
                            .to_string(),
                    );
                }
            }
            Err(err) => {
                error!(%err, thread_id, "failed to send message");
                self.error_notice = Some(err.to_string());
                self.store.rollback_optimistic(&thread_id, &optimistic_id);
            }
        }
    }

    pub async fn generate_notes(&mut self) {
        if self.pending.get(ActionKind::Notes) {
            debug!("notes refused: already pending");
            return;
        }
        let Some(eta_id) = self.require_identity("Please sign in to generate notes.") else {
            return;
        };
        let Some(thread_id) = self.ensure_thread_id().await else {
            self.error_notice = Some(THREAD_UNAVAILABLE_NOTICE.to_string());
            return;
        };

        self.pending.set(ActionKind::Notes, true);
        let result = self.backend.generate_notes(&eta_id, &thread_id).await;
        self.pending.set(ActionKind::Notes, false);

        match result {
            Ok(response) => {
                self.error_notice = None;
                if let Some(raw) = response.thread {
                    self.store.upsert_from_server(&raw, Some(&thread_id));
                } else if let Some(notes) = response.notes {
                    let message = Message::assistant_now(notes);
                    self.store.append_optimistic(&thread_id, message.clone());
                    self.expanded_message = Some(message);
                }
            }
            Err(err) => {
                error!(%err, "failed to generate notes");
                self.error_notice = Some(err.to_string());
            }
        }
    }

    pub async fn generate_practice(&mut self) {
        if self.pending.get(ActionKind::Practice) {
            debug!("practice refused: already pending");
            return;
        }
        let Some(eta_id) = self.require_identity("Please sign in to generate problems.") else {
            return;
        };
        let Some(thread_id) = self.ensure_thread_id().await else {
            self.error_notice = Some(THREAD_UNAVAILABLE_NOTICE.to_string());
            return;
        };

        let trimmed = self.input.trim();
        let prompt = if trimmed.is_empty() {
            DEFAULT_PRACTICE_PROMPT.to_string()
        } else {
            trimmed.to_string()
        };

        self.pending.set(ActionKind::Practice, true);
        let result = self
            .backend
            .generate_practice(&eta_id, &thread_id, &prompt)
            .await;
        self.pending.set(ActionKind::Practice, false);

        match result {
            Ok(response) => {
                self.error_notice = None;
                if let Some(raw) = response.thread {
                    self.store.upsert_from_server(&raw, Some(&thread_id));
                } else if let Some(problems) = response.practice_problems {
                    let message = Message::assistant_now(problems);
                    self.store.append_optimistic(&thread_id, message.clone());
                    self.expanded_message = Some(message);
                }
            }
            Err(err) => {
                error!(%err, "failed to generate practice problems");
                self.error_notice = Some(err.to_string());
            }
        }
    }

    pub async fn request_voice(&mut self) {
        if self.pending.get(ActionKind::Voice) {
            debug!("voice refused: already pending");
            return;
        }
        let Some(eta_id) = self.require_identity("Please sign in to request a voice response.")
        else {
            return;
        };
        let question = self.input.trim().to_string();
        if question.is_empty() {
            self.error_notice =
                Some("Please enter a question to request a voice response.".to_string());
            return;
        }

        // any prior reply is superseded before the new request goes out
        self.close_voice();

        let Some(thread_id) = self.ensure_thread_id().await else {
            self.error_notice = Some(THREAD_UNAVAILABLE_NOTICE.to_string());
            return;
        };

        self.pending.set(ActionKind::Voice, true);
        let result = self
            .backend
            .request_voice(&eta_id, &thread_id, &question, self.persona)
            .await;
        self.pending.set(ActionKind::Voice, false);

        match result {
            Ok(response) => {
                match VoiceReply::create(
                    &self.config.data_dir,
                    &response.audio,
                    response.animation.as_deref(),
                ) {
                    Ok(reply) => {
                        self.error_notice = None;
                        self.store
                            .append_optimistic(&thread_id, Message::assistant_now(VOICE_DELIVERED_MESSAGE));
                        self.voice.replace(reply);
                        self.selected_action = ActionKind::Voice;
                        self.expanded_message = Some(Message::assistant(VOICE_READY_MESSAGE));
                    }
                    Err(err) => {
                        error!(%err, "failed to store voice reply");
                        self.error_notice = Some(err.to_string());
                    }
                }
            }
            Err(err) => {
                error!(%err, "failed to generate voice response");
                self.error_notice = Some(err.to_string());
            }
        }
    }

    /// Independent of the four primary actions; only touches the thread
    /// model by way of the confirmation overlay.
    pub async fn upload_context(&mut self, file_name: &str, bytes: Vec<u8>) {
        if self.pending.upload {
            debug!("upload refused: already pending");
            return;
        }
        let Some(eta_id) = self.require_identity("Please sign in before uploading context.")
        else {
            return;
        };

        self.pending.upload = true;
        let result = self.backend.upload_context(&eta_id, file_name, bytes).await;
        self.pending.upload = false;

        match result {
            Ok(()) => {
                self.error_notice = None;
                self.expanded_message = Some(Message::assistant(UPLOAD_CONFIRMATION));
            }
            Err(err) => {
                error!(%err, "failed to upload context");
                self.error_notice = Some(err.to_string());
            }
        }
    }

    // ─── Voice playback events ──────────────────────────────────────

    /// User pressed play. Only valid with a reply in `Ready`.
    pub fn voice_play(&mut self) -> bool {
        if self.voice.play() {
            let animation = self
                .voice
                .reply()
                .map(|r| r.animation.clone())
                .unwrap_or_else(|| DEFAULT_ANIMATION.to_string());
            self.speaking.voice_started(&animation);
            true
        } else {
            false
        }
    }

    pub fn voice_pause(&mut self) {
        self.voice.pause();
        self.speaking.voice_stopped();
    }

    /// Playback reached the end: release the resource.
    pub fn voice_ended(&mut self) {
        self.voice.close();
        self.speaking.voice_stopped();
    }

    /// Explicit close, supersede, or teardown.
    pub fn close_voice(&mut self) {
        self.voice.close();
        self.speaking.voice_stopped();
    }

    /// Component teardown: release held resources synchronously.
    pub fn shutdown(&mut self) {
        self.close_voice();
        self.speaking.reset();
    }
}
