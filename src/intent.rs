use crate::model::Intent;

/// Reserved completion the model emits when the user asks to keep the last idea.
pub const SAVE_INTENT_SENTINEL: &str = "SAVE_INTENT";

/// Decide what a raw completion asks the renderer to do.
///
/// Only [`Intent::Save`] or [`Intent::Generate`] come out of here; `Other` is
/// reserved for failures.
pub fn classify_intent(completion: &str) -> Intent {
    if completion.trim() == SAVE_INTENT_SENTINEL {
        Intent::Save
    } else {
        Intent::Generate
    }
}
