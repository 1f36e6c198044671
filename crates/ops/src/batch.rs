//! Queue batch intake

use crate::process::DonationProcessor;
use futures::future::join_all;
use patron_errors::{Error, UserFacingError};
use serde::{Deserialize, Serialize};

/// One queued message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    pub body: String,
}

/// A delivery of queued messages, as handed to a queue consumer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordResult {
    pub message_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Whether redelivering the message could succeed
    pub retryable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub results: Vec<RecordResult>,
}

impl BatchReport {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Fail the batch if any record failed, so the queue redelivers it
    ///
    /// # Errors
    ///
    /// Returns an error listing every failed record.
    pub fn ensure_success(self) -> Result<Self, Error> {
        if self.all_succeeded() {
            return Ok(self);
        }
        let failed: Vec<&RecordResult> = self.failures().collect();
        let detail = serde_json::to_string(&failed)?;
        Err(Error::internal(format!(
            "{} of {} records failed: {detail}",
            failed.len(),
            self.results.len()
        )))
    }
}

/// Process every message concurrently. Records share nothing but the lock
/// and ledger stores.
pub async fn process_batch(processor: &DonationProcessor, messages: &[QueueMessage]) -> BatchReport {
    let results = join_all(messages.iter().map(|message| async move {
        match processor.process(&message.body).await {
            Ok(_) => RecordResult {
                message_id: message.message_id.clone(),
                success: true,
                error: None,
                code: None,
                retryable: false,
            },
            Err(e) => RecordResult {
                message_id: message.message_id.clone(),
                success: false,
                error: Some(e.user_message().into_owned()),
                code: e.user_code().map(String::from),
                retryable: e.is_retryable(),
            },
        }
    }))
    .await;

    BatchReport { results }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_queue_batch() {
        let batch: QueueBatch = serde_json::from_str(
            r#"{"Records":[{"messageId":"m1","body":"{\"amount\":1000}","attributes":{}}]}"#,
        )
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].message_id, "m1");
    }

    #[test]
    fn ensure_success_lists_failures() {
        let report = BatchReport {
            results: vec![
                RecordResult {
                    message_id: "ok".into(),
                    success: true,
                    error: None,
                    code: None,
                    retryable: false,
                },
                RecordResult {
                    message_id: "bad".into(),
                    success: false,
                    error: Some("undefined organization id passed in".into()),
                    code: Some("validation.missing_org_id".into()),
                    retryable: false,
                },
            ],
        };
        let err = report.ensure_success().unwrap_err().to_string();
        assert!(err.contains("1 of 2 records failed"));
        assert!(err.contains("\"message_id\":\"bad\""));
    }
}
