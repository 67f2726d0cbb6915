use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Client;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

const ERROR_BODY_MAX_LEN: usize = 200;

/// A single personalized message, already rendered.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("gmail request failed: {0}")]
    Transport(String),
    #[error("gmail rejected message: {0}")]
    Rejected(String),
}

/// Delegated mail-send capability. The dispatcher only sees this trait;
/// production wires in [`GmailMailer`], tests substitute a mock.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, access_token: &str, message: &OutgoingMessage) -> Result<(), SendError>;
}

/// Sends through the Gmail REST API on behalf of the user who granted the
/// bearer token. Gmail enforces its own per-account quotas, hence the
/// client-side batching upstream.
pub struct GmailMailer {
    client: Client,
    api_base: String,
}

impl GmailMailer {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl MailSender for GmailMailer {
    async fn send(&self, access_token: &str, message: &OutgoingMessage) -> Result<(), SendError> {
        let url = format!("{}/users/me/messages/send", self.api_base);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "raw": encode_raw_message(message) }))
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }
        let status = resp.status();
        let mut body = resp.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_MAX_LEN {
            body.truncate(ERROR_BODY_MAX_LEN);
        }
        Err(SendError::Rejected(format!("{status}: {body}")))
    }
}

/// Minimal RFC 822-style envelope in the base64url form the Gmail API
/// expects. Newlines in the body become `<br>` since the payload is sent
/// as HTML.
pub fn encode_raw_message(message: &OutgoingMessage) -> String {
    let mime = [
        format!("To: {}", message.to),
        format!("Subject: {}", message.subject),
        "Content-Type: text/html; charset=\"UTF-8\"".to_string(),
        String::new(),
        message.body.replace('\n', "<br>"),
    ]
    .join("\n");
    URL_SAFE_NO_PAD.encode(mime.as_bytes())
}
