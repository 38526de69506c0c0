//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` table, and each variant carries the
//! seeded name for rendering in API responses and webhook payloads.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up the enum variant for a database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Seeded lookup-table name, as rendered in API payloads.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Aggregate job status. A job starts `processing` and transitions to
    /// exactly one terminal status once every item is terminal.
    JobStatus {
        Processing = 1 => "processing",
        Completed = 2 => "completed",
        Failed = 3 => "failed",
    }
}

define_status_enum! {
    /// Per-item status. Transitions exactly once from `pending` to a
    /// terminal status and never reverts.
    ItemStatus {
        Pending = 1 => "pending",
        Processed = 2 => "processed",
        Failed = 3 => "failed",
    }
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl ItemStatus {
    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_ids_match_seed_data() {
        assert_eq!(JobStatus::Processing.id(), 1);
        assert_eq!(JobStatus::Completed.id(), 2);
        assert_eq!(JobStatus::Failed.id(), 3);
    }

    #[test]
    fn item_status_ids_match_seed_data() {
        assert_eq!(ItemStatus::Pending.id(), 1);
        assert_eq!(ItemStatus::Processed.id(), 2);
        assert_eq!(ItemStatus::Failed.id(), 3);
    }

    #[test]
    fn from_id_round_trips() {
        assert_eq!(JobStatus::from_id(2), Some(JobStatus::Completed));
        assert_eq!(ItemStatus::from_id(3), Some(ItemStatus::Failed));
        assert_eq!(JobStatus::from_id(99), None);
    }

    #[test]
    fn labels_match_seed_names() {
        assert_eq!(JobStatus::Processing.as_str(), "processing");
        assert_eq!(ItemStatus::Processed.as_str(), "processed");
    }

    #[test]
    fn terminality() {
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(!ItemStatus::Pending.is_terminal());
        assert!(ItemStatus::Failed.is_terminal());
    }
}
