//! Punctuality classification for check-ins.
//!
//! Lateness is measured in whole minutes after the workplace's expected start
//! on the check-in's local calendar date. Seconds are truncated, so a check-in
//! 10 minutes 59 seconds late counts as 10 minutes.

use chrono::NaiveDateTime;

use crate::config::WorkplaceConfig;
use crate::models::Punctuality;

/// Classifies a local check-in time against the workplace's shift start.
///
/// * at or under `grace_minutes` late (including early): [`Punctuality::OnTime`]
/// * over grace, at or under `escalation_minutes`: [`Punctuality::Late`]
/// * over `escalation_minutes`: [`Punctuality::LateReasonRequired`]
pub fn classify_punctuality(local_check_in: NaiveDateTime, workplace: &WorkplaceConfig) -> Punctuality {
    let expected = local_check_in.date().and_time(workplace.expected_start);
    let minutes_late = (local_check_in - expected).num_minutes();

    if minutes_late <= workplace.grace_minutes {
        Punctuality::OnTime
    } else if minutes_late <= workplace.escalation_minutes {
        Punctuality::Late { minutes_late }
    } else {
        Punctuality::LateReasonRequired { minutes_late }
    }
}
