/// Item and task primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Jobs are addressed by an opaque UUID assigned at submission.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
