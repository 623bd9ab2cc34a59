//! When the University ID app is active for a course and a viewer

use super::model::UniversityId;
use crate::catalog::CourseInfo;
use crate::config::Features;

/// Where the course tab list is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Learner-facing site
    Learner,
    /// Course authoring site
    Studio,
}

/// The signed-in user looking at a course
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub is_enrolled: bool,
    pub is_staff: bool,
}

pub fn is_feature_enabled(features: &Features) -> bool {
    features.university_app
}

/// IDs are added to grade exports only when both platform flags and the
/// course flag are on
pub fn is_csv_export_enabled_on_course(features: &Features, course: &CourseInfo) -> bool {
    is_feature_enabled(features) && features.university_csv_export && course.enable_university_id
}

/// The learner must submit an ID before continuing with the course
pub fn university_id_is_required(
    features: &Features,
    course: &CourseInfo,
    existing: Option<&UniversityId>,
) -> bool {
    is_feature_enabled(features) && course.enable_university_id && existing.is_none()
}

/// Whether the University ID tab is shown
pub fn tab_is_enabled(
    features: &Features,
    course: &CourseInfo,
    viewer: Option<&Viewer>,
    surface: Surface,
) -> bool {
    if !is_feature_enabled(features) || !course.enable_university_id {
        return false;
    }

    match (viewer, surface) {
        (None, Surface::Studio) => true,
        (None, Surface::Learner) => false,
        (Some(viewer), _) => viewer.is_enrolled || viewer.is_staff,
    }
}
