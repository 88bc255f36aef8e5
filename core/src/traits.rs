use crate::types::GradeEvent;

/// Host grading collaborator. Implementers persist or display the grade;
/// the handler never retries a publish.
pub trait GradePublisher: Send + Sync {
    /// Record `event` under `kind` (always [`crate::GRADE_EVENT_KIND`] for mastery grades).
    fn publish(&self, kind: &str, event: &GradeEvent);
}
