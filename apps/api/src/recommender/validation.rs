use serde::{Deserialize, Serialize};

use crate::recommender::profile::ProfileInput;

pub const GRADE_MISSING: &str = "Please fill in the Grade field.";
pub const GPA_MISSING: &str = "Please fill in the GPA field.";
pub const HOBBY_MISSING: &str = "Please fill in the Hobbies field.";

/// Error flags for the required fields, as of the last submit attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
    pub grade_error: bool,
    pub gpa_error: bool,
    pub hobby_error: bool,
}

impl ValidationState {
    pub fn passed(&self) -> bool {
        !(self.grade_error || self.gpa_error || self.hobby_error)
    }

    /// One help text per failing field, always in grade, gpa, hobby order.
    pub fn messages(&self) -> Vec<&'static str> {
        [
            (self.grade_error, GRADE_MISSING),
            (self.gpa_error, GPA_MISSING),
            (self.hobby_error, HOBBY_MISSING),
        ]
        .into_iter()
        .filter_map(|(failed, msg)| failed.then_some(msg))
        .collect()
    }
}

/// Checks the required fields: grade, gpa, hobby.
pub fn validate_profile(profile: &ProfileInput) -> ValidationState {
    ValidationState {
        grade_error: profile.grade.is_none(),
        gpa_error: profile.gpa.is_none(),
        hobby_error: profile.hobby.is_empty(),
    }
}
