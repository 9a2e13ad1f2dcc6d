// Prompt fragments sent to the completion endpoint.
// The recommender assembles them in recommender::prompt.

/// Opening line of every recommendation prompt.
pub const PROFILE_HEADER: &str = "The user:";

/// Closing instruction. The response parser relies on the model answering
/// with a plain comma-separated list.
pub const LIST_ONLY_INSTRUCTION: &str =
    "Please provide a list of college recommendations separated by commas with no other text.";
