use serde::{Deserialize, Serialize};

/// Per-request flags that adjust how much a signal is trusted.
///
/// Collaborators (or the caller) raise these; the weight engine reads them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceContext {
    /// The sport category looks like a placeholder rather than a real team.
    pub suspect_team_assignment: bool,
    /// More than one person in the photo.
    pub group_photo: bool,
    pub low_quality_photo: bool,
    /// The first name is used by both genders at similar rates.
    pub ambiguous_name: bool,
}

impl InferenceContext {
    /// OR two sets of flags together.
    #[inline]
    pub fn merge(self, other: InferenceContext) -> InferenceContext {
        InferenceContext {
            suspect_team_assignment: self.suspect_team_assignment || other.suspect_team_assignment,
            group_photo: self.group_photo || other.group_photo,
            low_quality_photo: self.low_quality_photo || other.low_quality_photo,
            ambiguous_name: self.ambiguous_name || other.ambiguous_name,
        }
    }
}
