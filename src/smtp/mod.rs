use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;

/// Sends the account-verification mail through the system SMTP account.
/// Best effort: a missing SMTP config or a transport failure is logged and
/// the signup/login flow carries on.
pub async fn send_verification_email(config: &Config, to: &str, token: &str) {
    let Some(smtp) = &config.smtp else {
        tracing::warn!(to = %to, "smtp not configured; skipping verification email");
        return;
    };

    let verification_url = format!("{}/verify-email?token={}", config.frontend_url, token);
    let body = format!(
        "<p>Please verify your email by clicking the following link:</p>\n\
         <a href=\"{verification_url}\">Verify Email</a>"
    );

    if let Err(e) = send_html(smtp, to, "Verify your email address", &body).await {
        tracing::error!(to = %to, error = %e, "verification email failed");
    }
}

async fn send_html(
    smtp: &crate::config::SmtpConfig,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), anyhow::Error> {
    let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
        .credentials(creds)
        .port(smtp.port)
        .build();

    let email = Message::builder()
        .from(smtp.from.parse()?)
        .to(to.parse()?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(body.to_string())?;

    mailer.send(email).await?;
    Ok(())
}
