//! Builds the natural-language prompt sent to the completion endpoint.

use crate::llm_client::prompts::{LIST_ONLY_INSTRUCTION, PROFILE_HEADER};
use crate::recommender::profile::ProfileInput;

/// Renders the profile into the recommendation prompt.
///
/// Grade, GPA, achievements and hobby are always present (achievements may be
/// blank). Location and major lines appear only when filled in. Values are
/// interpolated verbatim.
pub fn build_prompt(profile: &ProfileInput) -> String {
    let grade = profile.grade.map(|g| g.label()).unwrap_or_default();
    let gpa = profile.gpa.map(|b| b.label()).unwrap_or_default();

    let mut lines = vec![
        PROFILE_HEADER.to_string(),
        format!("- is in grade {grade}"),
        format!("- has a GPA of {gpa}"),
        format!(
            "- has the following academic achievements: {}",
            profile.achievements
        ),
        format!("- has a hobby/interest in: {}", profile.hobby),
    ];
    if !profile.location.is_empty() {
        lines.push(format!("- prefers a school at {}", profile.location));
    }
    if !profile.major.is_empty() {
        lines.push(format!("- would like to study {}", profile.major));
    }
    lines.push(LIST_ONLY_INSTRUCTION.to_string());

    lines.join("\n")
}
