/// Users, achievements and quests are keyed by PostgreSQL BIGSERIAL ids.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Experience points. Signed so that negative deltas can be detected and
/// rejected at the ledger boundary rather than wrapping.
pub type Xp = i64;

/// Subjects are identified by their slug (e.g. `"mathematics"`).
pub type SubjectId = String;
