//! Role-scoped visibility policy for record listings.
//!
//! Listing is filtered per role; single-record lookup by id deliberately is
//! not. Data-entry staff see their own entries, nurses see the whole review
//! queue, doctors and admins see only approved records.

use models::{Identity, PatientRecord, ReviewStatus, Role};
use uuid::Uuid;

/// Filter applied to a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    /// Only records entered by the given user.
    EnteredBy(Uuid),
    /// Every record, whatever its review state. Nurses work the full queue;
    /// the historical filter enumerated all states plus the legacy-absent
    /// case, which is the same thing.
    All,
    /// Only records whose review status is APPROVED.
    ApprovedOnly,
}

impl RecordFilter {
    pub fn matches(&self, record: &PatientRecord) -> bool {
        match self {
            RecordFilter::EnteredBy(user_id) => record.entered_by == *user_id,
            RecordFilter::All => true,
            RecordFilter::ApprovedOnly => record.review_status == ReviewStatus::Approved,
        }
    }
}

/// Resolves the listing filter for a requester. Infallible: Role is a closed
/// enum and deserialization already rejects anything outside it, so there is
/// no unknown-role case left to fail on.
pub fn list_filter(identity: &Identity) -> RecordFilter {
    match identity.role {
        Role::DataEntry => RecordFilter::EnteredBy(identity.user_id),
        Role::Nurse => RecordFilter::All,
        Role::Doctor | Role::Admin => RecordFilter::ApprovedOnly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn should_scope_data_entry_to_own_records() {
        let me = identity(Role::DataEntry);
        assert_eq!(list_filter(&me), RecordFilter::EnteredBy(me.user_id));
    }

    #[test]
    fn should_give_nurse_the_full_queue() {
        assert_eq!(list_filter(&identity(Role::Nurse)), RecordFilter::All);
    }

    #[test]
    fn should_restrict_doctor_and_admin_to_approved() {
        assert_eq!(
            list_filter(&identity(Role::Doctor)),
            RecordFilter::ApprovedOnly
        );
        assert_eq!(
            list_filter(&identity(Role::Admin)),
            RecordFilter::ApprovedOnly
        );
    }
}
