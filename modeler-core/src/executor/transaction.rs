//! Undo journal for a single plan execution

use tracing::{debug, info};

use crate::scene::Scene;

/// Everything a plan execution has added to the scene so far
///
/// Handlers record each object and modifier here as soon as the scene
/// accepts it, so a failure in any later step can undo it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepContext {
    /// Created object names, in creation order
    pub created_objects: Vec<String>,
    /// `(object, modifier)` pairs, in the order they were added
    pub added_modifiers: Vec<(String, String)>,
}

impl StepContext {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a created object
    pub fn record_object(&mut self, name: impl Into<String>) {
        self.created_objects.push(name.into());
    }

    /// Record a modifier added to an object
    pub fn record_modifier(&mut self, object: impl Into<String>, modifier: impl Into<String>) {
        self.added_modifiers.push((object.into(), modifier.into()));
    }

    /// Undo everything recorded, newest first
    ///
    /// Entries whose object or modifier is already gone are skipped, so this
    /// is safe to run against partially applied state. Never fails.
    pub fn rollback<S: Scene + ?Sized>(&self, scene: &mut S) {
        info!(
            objects = self.created_objects.len(),
            modifiers = self.added_modifiers.len(),
            "Rolling back plan changes"
        );

        for name in self.created_objects.iter().rev() {
            if scene.remove_object(name) {
                debug!(object = %name, "Removed object");
            } else {
                debug!(object = %name, "Object already gone, skipping");
            }
        }

        for (object, modifier) in self.added_modifiers.iter().rev() {
            if !scene.contains_object(object) || !scene.has_modifier(object, modifier) {
                continue;
            }
            if scene.remove_modifier(object, modifier) {
                debug!(object = %object, modifier = %modifier, "Removed modifier");
            }
        }
    }
}
