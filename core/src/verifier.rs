use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::config::BlockConfig;
use crate::errors::RejectReason;
use crate::traits::GradePublisher;
use crate::types::{GradeEvent, MasteryReport, SharedSecret, TopicId, GRADE_EVENT_KIND, compute_signature, signatures_match};

/// Decide whether `report` is a genuine grade for `topic`.
///
/// Checks run in a fixed order and stop at the first failure:
/// presence of every field, relevance of the report to `topic`, then the
/// HMAC over the whole mastery map.
pub fn verify(secret: &SharedSecret, topic: &TopicId, report: &MasteryReport) -> Result<GradeEvent, RejectReason> {
    // 1) Presence
    let mastery = report.mastery.as_ref().filter(|m| !m.is_empty()).ok_or(RejectReason::MissingField("mastery"))?;
    let user_id = report.user_id.as_deref().filter(|u| !u.is_empty()).ok_or(RejectReason::MissingField("user_id"))?;
    let signature = report.signature.as_deref().filter(|s| !s.is_empty()).ok_or(RejectReason::MissingField("signature"))?;

    // 2) Relevance
    let value = *mastery
        .get(topic.as_str())
        .ok_or_else(|| RejectReason::TopicNotInReport(topic.to_string()))?;

    // 3) Signature over every entry, not just ours
    let expected = compute_signature(secret, user_id, mastery);
    if !signatures_match(&expected, signature) { return Err(RejectReason::SignatureMismatch); }

    Ok(GradeEvent::new(value))
}

/// One publish call as seen by [`InMemoryGradeBook`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedGrade {
    pub kind: String,
    pub event: GradeEvent,
}

/// Grade book kept in process memory, suitable for tests and single-process hosts.
#[derive(Default)]
pub struct InMemoryGradeBook {
    inner: Mutex<Vec<PublishedGrade>>,
}

impl InMemoryGradeBook {
    pub fn new() -> Self { Self::default() }

    /// Snapshot of everything published so far, oldest first.
    pub fn events(&self) -> Vec<PublishedGrade> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize { self.inner.lock().unwrap_or_else(PoisonError::into_inner).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl GradePublisher for InMemoryGradeBook {
    fn publish(&self, kind: &str, event: &GradeEvent) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PublishedGrade { kind: kind.to_string(), event: *event });
    }
}

/// Hands grades to the host through its log stream, one `info` record per grade.
///
/// Holds nothing in memory, so a long-running host can publish indefinitely.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingGradePublisher;

impl GradePublisher for TracingGradePublisher {
    fn publish(&self, kind: &str, event: &GradeEvent) {
        info!(target: "masterygate::grades", kind, value = event.value, max_value = event.max_value, "grade published");
    }
}

/// The block's grade handler: verifies inbound reports and publishes accepted grades.
///
/// Every rejection is swallowed here. Callers only ever learn whether a grade
/// was recorded, never why one was not.
pub struct GradeHandler {
    config: BlockConfig,
    publisher: Arc<dyn GradePublisher>,
}

impl GradeHandler {
    pub fn new(config: BlockConfig, publisher: Arc<dyn GradePublisher>) -> Self {
        info!(
            module_id = %config.module_id,
            key_len = config.shared_key.len(),
            "grade handler configured"
        );
        Self { config, publisher }
    }

    pub fn module_id(&self) -> &TopicId { &self.config.module_id }

    /// Verify a decoded report and publish it on success.
    pub fn handle_grade(&self, report: &MasteryReport) -> Option<GradeEvent> {
        match verify(&self.config.shared_key, &self.config.module_id, report) {
            Ok(event) => {
                info!(module_id = %self.config.module_id, value = event.value, "grade accepted");
                self.publisher.publish(GRADE_EVENT_KIND, &event);
                Some(event)
            }
            Err(reason) => {
                self.log_rejection(&reason);
                None
            }
        }
    }

    /// Decode a JSON body and handle it. Undecodable bodies are rejected like any other bad report.
    pub fn handle_grade_json(&self, body: impl AsRef<[u8]>) -> Option<GradeEvent> {
        match serde_json::from_slice::<MasteryReport>(body.as_ref()) {
            Ok(report) => self.handle_grade(&report),
            Err(e) => {
                self.log_rejection(&RejectReason::Malformed(e.to_string()));
                None
            }
        }
    }

    /// Same as [`Self::handle_grade_json`] for a body that is already parsed.
    pub fn handle_grade_value(&self, body: serde_json::Value) -> Option<GradeEvent> {
        match serde_json::from_value::<MasteryReport>(body) {
            Ok(report) => self.handle_grade(&report),
            Err(e) => {
                self.log_rejection(&RejectReason::Malformed(e.to_string()));
                None
            }
        }
    }

    /// Decline a request that never produced a readable body, e.g. one over the host's size limit.
    pub fn decline(&self, reason: RejectReason) -> Option<GradeEvent> {
        self.log_rejection(&reason);
        None
    }

    fn log_rejection(&self, reason: &RejectReason) {
        match reason {
            RejectReason::SignatureMismatch => {
                warn!(module_id = %self.config.module_id, %reason, "mastery report rejected")
            }
            _ => debug!(module_id = %self.config.module_id, %reason, "mastery report rejected"),
        }
    }
}
