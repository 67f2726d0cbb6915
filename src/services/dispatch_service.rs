use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::time::sleep;

use crate::db::now_epoch;
use crate::gmail::{MailSender, OutgoingMessage};
use crate::models::mail_log::{DeliveryStatus, NewMailLog};
use crate::services::csv_service::RecipientRow;
use crate::services::mail_log_service;
use crate::services::template;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_INTER_BATCH_DELAY_MS: u64 = 1000;

const UNKNOWN_RECIPIENT: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: Duration::from_millis(DEFAULT_INTER_BATCH_DELAY_MS),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailedRecipient {
    pub email: String,
    pub error: String,
}

/// Aggregated outcome of one dispatch job. `successful + failed == total`
/// and `failed_emails` carries one entry per failed row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_emails: Vec<FailedRecipient>,
}

/// Outcome of a single row, kept isolated until the whole batch settles.
enum RowOutcome {
    Sent {
        recipient: String,
        subject: String,
    },
    Failed {
        recipient: String,
        subject: String,
        error: String,
    },
}

/// Runs one mass-mail job: rows are chunked by `batch_size`, every chunk
/// is sent concurrently and fully settles before the next one starts, and
/// every chunk except the last is followed by an unconditional pause.
///
/// Row failures (missing email column, rejected send) are captured per
/// row and aggregated; the job itself always runs to completion. Exactly
/// one delivery record is written per row regardless of outcome, and a
/// failed record write is logged without affecting the job.
pub async fn dispatch(
    sender: &dyn MailSender,
    pool: &SqlitePool,
    user_id: &str,
    access_token: &str,
    subject_template: &str,
    body_template: &str,
    headers: &[String],
    rows: &[RecipientRow],
    opts: &DispatchOptions,
) -> DispatchReport {
    // first header containing "email" wins, even if several match
    let email_field = headers
        .iter()
        .find(|h| h.to_lowercase().contains("email"))
        .cloned();

    let total = rows.len();
    let mut successful = 0usize;
    let mut failed = 0usize;
    let mut failed_emails = Vec::new();

    let chunks: Vec<&[RecipientRow]> = rows.chunks(opts.batch_size.max(1)).collect();
    let chunk_count = chunks.len();

    for (index, chunk) in chunks.into_iter().enumerate() {
        let outcomes = join_all(chunk.iter().map(|row| {
            send_row(
                sender,
                access_token,
                subject_template,
                body_template,
                email_field.as_deref(),
                row,
            )
        }))
        .await;

        // single reduction over isolated per-row results
        for outcome in outcomes {
            let (recipient, subject, status, error) = match outcome {
                RowOutcome::Sent { recipient, subject } => {
                    (recipient, subject, DeliveryStatus::Success, String::new())
                }
                RowOutcome::Failed {
                    recipient,
                    subject,
                    error,
                } => (recipient, subject, DeliveryStatus::Failed, error),
            };

            let record = NewMailLog {
                user_id: user_id.to_string(),
                recipient: recipient.clone(),
                subject,
                status,
                error: error.clone(),
                sent_at: now_epoch(),
            };
            if let Err(e) = mail_log_service::append(pool, &record).await {
                tracing::error!(recipient = %record.recipient, error = %e, "failed to record delivery outcome");
            }

            match status {
                DeliveryStatus::Success => successful += 1,
                DeliveryStatus::Failed => {
                    failed += 1;
                    failed_emails.push(FailedRecipient {
                        email: recipient,
                        error,
                    });
                }
            }
        }

        if index + 1 < chunk_count {
            sleep(opts.inter_batch_delay).await;
        }
    }

    tracing::info!(user = %user_id, total, successful, failed, "mass mail dispatch completed");
    DispatchReport {
        total,
        successful,
        failed,
        failed_emails,
    }
}

async fn send_row(
    sender: &dyn MailSender,
    access_token: &str,
    subject_template: &str,
    body_template: &str,
    email_field: Option<&str>,
    row: &RecipientRow,
) -> RowOutcome {
    let subject = template::render(subject_template, row);

    let recipient = email_field
        .and_then(|field| row.get(field))
        .filter(|value| !value.is_empty());
    let Some(to) = recipient else {
        // no send attempt for rows without a usable address
        return RowOutcome::Failed {
            recipient: UNKNOWN_RECIPIENT.to_string(),
            subject,
            error: "no email address found".to_string(),
        };
    };

    let message = OutgoingMessage {
        to: to.clone(),
        subject: subject.clone(),
        body: template::render(body_template, row),
    };
    match sender.send(access_token, &message).await {
        Ok(()) => RowOutcome::Sent {
            recipient: message.to,
            subject,
        },
        Err(e) => RowOutcome::Failed {
            recipient: message.to,
            subject,
            error: e.to_string(),
        },
    }
}
