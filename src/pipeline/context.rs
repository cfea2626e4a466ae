//! Render context assembly

use crate::data::{GlobalData, Mapping};

/// Merge global data with a file's front-matter
///
/// Shallow merge: front-matter keys replace global keys of the same name,
/// nested values are never combined.
pub fn build_context(global: &GlobalData, front_matter: Option<&Mapping>) -> Mapping {
    let mut context = global.as_map().clone();
    if let Some(front_matter) = front_matter {
        for (key, value) in front_matter {
            context.insert(key.clone(), value.clone());
        }
    }
    context
}
