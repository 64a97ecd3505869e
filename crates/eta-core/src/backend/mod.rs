//! Collaborator seam for the remote ETA service.
//!
//! The dispatcher is generic over [`Backend`] so tests substitute a
//! scripted mock for the HTTP transport.

pub mod http;

pub use http::HttpBackend;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::models::{EtaProfile, Persona};

#[derive(Debug, Clone)]
pub struct SyncProfileRequest {
    pub name: String,
    pub email: Option<String>,
    pub auth_subject: String,
    /// Previously assigned id, seeding the session from local storage.
    pub eta_id: Option<String>,
}

/// Threads arrive as raw payloads; hydration happens client-side.
#[derive(Debug, Clone, Default)]
pub struct UserBundle {
    pub threads: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ThreadResponse {
    pub thread: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct NotesResponse {
    pub thread: Option<Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PracticeResponse {
    pub thread: Option<Value>,
    pub practice_problems: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VoiceResponse {
    /// MP3 bytes.
    pub audio: Vec<u8>,
    /// Animation hint from the `x-animation` response header.
    pub animation: Option<String>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn sync_profile(&self, request: SyncProfileRequest) -> Result<EtaProfile>;

    async fn fetch_user(&self, eta_id: &str) -> Result<UserBundle>;

    async fn create_thread(&self, eta_id: &str, title: Option<&str>) -> Result<ThreadResponse>;

    async fn fetch_thread(&self, eta_id: &str, chat_id: &str) -> Result<ThreadResponse>;

    async fn send_message(
        &self,
        eta_id: &str,
        chat_id: &str,
        message: &str,
        persona: Persona,
    ) -> Result<ThreadResponse>;

    async fn generate_notes(&self, eta_id: &str, chat_id: &str) -> Result<NotesResponse>;

    async fn generate_practice(
        &self,
        eta_id: &str,
        chat_id: &str,
        message: &str,
    ) -> Result<PracticeResponse>;

    async fn request_voice(
        &self,
        eta_id: &str,
        chat_id: &str,
        question: &str,
        persona: Persona,
    ) -> Result<VoiceResponse>;

    async fn upload_context(&self, eta_id: &str, file_name: &str, bytes: Vec<u8>) -> Result<()>;
}
