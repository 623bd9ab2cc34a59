//! University ID app: per-course student IDs submitted by learners
//!
//! Courses taught with a partner university ask learners for their
//! university ID and section. Instructors review the submitted IDs with
//! duplicates flagged.

pub mod conflicts;
pub mod features;
pub mod form;
pub mod model;

pub use conflicts::{mark_conflicts, mark_identifiers, normalize_identifier, MarkedUniversityId};
pub use features::{
    is_csv_export_enabled_on_course, is_feature_enabled, tab_is_enabled,
    university_id_is_required, Surface, Viewer,
};
pub use form::UniversityIdForm;
pub use model::UniversityId;
