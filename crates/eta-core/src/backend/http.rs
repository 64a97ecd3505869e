use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    Backend, NotesResponse, PracticeResponse, SyncProfileRequest, ThreadResponse, UserBundle,
    VoiceResponse,
};
use crate::models::{EtaProfile, Persona};

/// Key under which the backend stores the user's primary id.
/// The spelling is the backend's, typo included.
const PRIMARY_KEY: &str = "ElectronincTeachingAssistantMaterialID";

/// reqwest client for the ETA backend.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check the status and surface the server's error body, the way
    /// the backend reports failures: a JSON `error`/`message` field
    /// when present, the raw body otherwise.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|data| {
                data.get("error")
                    .or_else(|| data.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or(body);
        anyhow::bail!("ETA backend error ({}): {}", status, message)
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach ETA backend at {path}"))?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse ETA backend response from {path}"))
    }

    fn thread_response(data: Value) -> ThreadResponse {
        ThreadResponse {
            thread: data.get("thread").filter(|t| !t.is_null()).cloned(),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sync_profile(&self, request: SyncProfileRequest) -> Result<EtaProfile> {
        let mut body = json!({
            "name": request.name,
            "email": request.email,
            "auth0_sub": request.auth_subject,
        });
        if let Some(ref eta_id) = request.eta_id {
            body["eta_id"] = json!(eta_id);
        }

        let data = self.post_json("/user/sync", body).await?;

        let user = data.get("user").filter(|u| !u.is_null()).cloned();
        let eta_id = data
            .get("eta_id")
            .or_else(|| data.get("etaId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                user.as_ref()
                    .and_then(|u| u.get(PRIMARY_KEY))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .or(request.eta_id);
        let upload_date = data
            .get("upload_date")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                user.as_ref()
                    .and_then(|u| u.get("UploadDate").or_else(|| u.get("uploadDate")))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });

        debug!(eta_id = eta_id.as_deref().unwrap_or("<none>"), "profile synced");
        Ok(EtaProfile {
            eta_id,
            upload_date,
            user,
        })
    }

    async fn fetch_user(&self, eta_id: &str) -> Result<UserBundle> {
        let response = self
            .client
            .get(self.url(&format!("/get-user/{eta_id}")))
            .send()
            .await
            .context("Failed to fetch user bundle")?;
        let data: Value = Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse user bundle")?;

        let threads = data
            .get("ChatHistory")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(UserBundle { threads })
    }

    async fn create_thread(&self, eta_id: &str, title: Option<&str>) -> Result<ThreadResponse> {
        let data = self
            .post_json(
                "/thread/create_chat_thread",
                json!({ "eta_id": eta_id, "title": title }),
            )
            .await?;
        Ok(Self::thread_response(data))
    }

    async fn fetch_thread(&self, eta_id: &str, chat_id: &str) -> Result<ThreadResponse> {
        let response = self
            .client
            .get(self.url("/thread/get_chat_thread/"))
            .query(&[("etaId", eta_id), ("chatId", chat_id)])
            .send()
            .await
            .context("Failed to fetch thread")?;
        let data: Value = Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse thread response")?;
        Ok(Self::thread_response(data))
    }

    async fn send_message(
        &self,
        eta_id: &str,
        chat_id: &str,
        message: &str,
        persona: Persona,
    ) -> Result<ThreadResponse> {
        let data = self
            .post_json(
                "/thread/add_message",
                json!({
                    "eta_id": eta_id,
                    "chatID": chat_id,
                    "message": message,
                    "persona": persona.id(),
                }),
            )
            .await?;
        Ok(Self::thread_response(data))
    }

    async fn generate_notes(&self, eta_id: &str, chat_id: &str) -> Result<NotesResponse> {
        let data = self
            .post_json(
                "/generate-notes",
                json!({ "eta_id": eta_id, "chatID": chat_id }),
            )
            .await?;
        Ok(NotesResponse {
            thread: data.get("thread").filter(|t| !t.is_null()).cloned(),
            notes: data.get("notes").and_then(Value::as_str).map(str::to_string),
        })
    }

    async fn generate_practice(
        &self,
        eta_id: &str,
        chat_id: &str,
        message: &str,
    ) -> Result<PracticeResponse> {
        let data = self
            .post_json(
                "/generate-practice-problems",
                json!({ "eta_id": eta_id, "chatID": chat_id, "message": message }),
            )
            .await?;
        Ok(PracticeResponse {
            thread: data.get("thread").filter(|t| !t.is_null()).cloned(),
            practice_problems: data
                .get("practice_problems")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    async fn request_voice(
        &self,
        eta_id: &str,
        chat_id: &str,
        question: &str,
        persona: Persona,
    ) -> Result<VoiceResponse> {
        let response = self
            .client
            .post(self.url("/voice-response"))
            .header("Accept", "audio/mpeg")
            .json(&json!({
                "eta_id": eta_id,
                "chatID": chat_id,
                "question": question,
                "persona": persona.id(),
            }))
            .send()
            .await
            .context("Failed to send voice request")?;
        let response = Self::check(response).await?;

        let animation = response
            .headers()
            .get("x-animation")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let audio = response
            .bytes()
            .await
            .context("Failed to read voice audio")?
            .to_vec();

        debug!(bytes = audio.len(), "voice response received");
        Ok(VoiceResponse { audio, animation })
    }

    async fn upload_context(&self, eta_id: &str, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .context("Failed to build upload part")?;
        let form = reqwest::multipart::Form::new()
            .text("eta_id", eta_id.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.url("/upload-context"))
            .multipart(form)
            .send()
            .await
            .context("Failed to upload context material")?;
        Self::check(response).await?;
        Ok(())
    }
}
