use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the millisecond precision S3 reports in listings.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
