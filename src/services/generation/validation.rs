use validator::Validate;

use crate::models::domain::CandidateQuestion;

/// Keeps only candidates that pass the validation gate. Rejected items are
/// logged and otherwise forgotten.
pub fn retain_well_formed(batch: Vec<CandidateQuestion>, stage: &str) -> Vec<CandidateQuestion> {
    let received = batch.len();

    let kept: Vec<CandidateQuestion> = batch
        .into_iter()
        .filter(|candidate| match candidate.validate() {
            Ok(()) => true,
            Err(err) => {
                log::debug!(
                    "Dropping malformed candidate from stage '{}' ({:?}): {}",
                    stage,
                    candidate.question,
                    err
                );
                false
            }
        })
        .collect();

    if kept.len() < received {
        log::debug!(
            "Stage '{}': {} of {} candidates passed validation",
            stage,
            kept.len(),
            received
        );
    }
    kept
}
