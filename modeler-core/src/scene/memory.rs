//! In-memory scene
//!
//! Stands in for a 3D host when previewing plans from the CLI and in tests.
//! Name collisions are resolved the way Blender does it, with a `.001`,
//! `.002`, ... suffix.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::{Modifier, Primitive, Scene, Transform};
use crate::materials::MaterialPreset;
use crate::{Error, Result};

/// What an object is made of
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Mesh created from a primitive
    Mesh { primitive: Primitive },
    /// Empty without geometry
    Empty,
}

/// A named modifier on an object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneModifier {
    pub name: String,
    pub modifier: Modifier,
}

/// An object living in a [`MemoryScene`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub transform: Transform,
    pub modifiers: Vec<SceneModifier>,
    /// Material slots, by material name
    pub materials: Vec<String>,
}

impl SceneObject {
    fn new(name: String, kind: ObjectKind, transform: Transform) -> Self {
        Self {
            name,
            kind,
            transform,
            modifiers: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// Look up a modifier by name
    pub fn modifier(&self, name: &str) -> Option<&Modifier> {
        self.modifiers
            .iter()
            .find(|m| m.name == name)
            .map(|m| &m.modifier)
    }
}

/// Scene kept entirely in memory
#[derive(Debug, Clone, Serialize)]
pub struct MemoryScene {
    objects: Vec<SceneObject>,
    materials: BTreeMap<String, MaterialPreset>,
    #[serde(skip)]
    available: bool,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    /// Create an empty, available scene
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            materials: BTreeMap::new(),
            available: true,
        }
    }

    /// Create a scene that refuses to run plans
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Look up an object by name
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    /// Names of all objects in creation order
    pub fn object_names(&self) -> Vec<&str> {
        self.objects.iter().map(|o| o.name.as_str()).collect()
    }

    /// Names of the modifiers on an object (empty if the object is missing)
    pub fn modifier_names(&self, object: &str) -> Vec<&str> {
        self.object(object)
            .map(|o| o.modifiers.iter().map(|m| m.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Material slots of an object (empty if the object is missing)
    pub fn materials_of(&self, object: &str) -> Vec<&str> {
        self.object(object)
            .map(|o| o.materials.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Look up a material by name
    pub fn material(&self, name: &str) -> Option<&MaterialPreset> {
        self.materials.get(name)
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn unique_object_name(&self, requested: &str) -> String {
        unique_name(requested, |candidate| self.object(candidate).is_some())
    }

    fn insert(&mut self, name: &str, kind: ObjectKind, transform: Transform) -> String {
        let name = self.unique_object_name(name);
        debug!(object = %name, "Adding object to scene");
        self.objects
            .push(SceneObject::new(name.clone(), kind, transform));
        name
    }
}

/// First of `base`, `base.001`, `base.002`, ... that is not taken
fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1u32..)
        .map(|n| format!("{}.{:03}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

impl Scene for MemoryScene {
    fn is_available(&self) -> bool {
        self.available
    }

    fn create_primitive(&mut self, name: &str, primitive: Primitive) -> Result<String> {
        if !primitive.is_valid() {
            return Err(Error::Scene(format!(
                "Invalid dimensions for {}: {:?}",
                name, primitive
            )));
        }
        Ok(self.insert(name, ObjectKind::Mesh { primitive }, Transform::default()))
    }

    fn create_empty(&mut self, name: &str, transform: Transform) -> Result<String> {
        Ok(self.insert(name, ObjectKind::Empty, transform))
    }

    fn contains_object(&self, name: &str) -> bool {
        self.object(name).is_some()
    }

    fn remove_object(&mut self, name: &str) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| o.name != name);
        before != self.objects.len()
    }

    fn add_modifier(&mut self, object: &str, name: &str, modifier: Modifier) -> Result<String> {
        let target = self
            .object_mut(object)
            .ok_or_else(|| Error::ObjectNotFound(object.to_string()))?;
        let name = unique_name(name, |candidate| target.modifier(candidate).is_some());
        target.modifiers.push(SceneModifier {
            name: name.clone(),
            modifier,
        });
        Ok(name)
    }

    fn has_modifier(&self, object: &str, modifier: &str) -> bool {
        self.object(object)
            .is_some_and(|o| o.modifier(modifier).is_some())
    }

    fn remove_modifier(&mut self, object: &str, modifier: &str) -> bool {
        let Some(target) = self.object_mut(object) else {
            return false;
        };
        let before = target.modifiers.len();
        target.modifiers.retain(|m| m.name != modifier);
        before != target.modifiers.len()
    }

    fn has_material(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    fn create_material(&mut self, name: &str, preset: &MaterialPreset) -> Result<String> {
        let name = unique_name(name, |candidate| self.materials.contains_key(candidate));
        self.materials.insert(name.clone(), *preset);
        Ok(name)
    }

    fn assign_material(&mut self, object: &str, material: &str) -> Result<()> {
        if !self.materials.contains_key(material) {
            return Err(Error::Scene(format!("Material '{}' does not exist", material)));
        }
        let target = self
            .object_mut(object)
            .ok_or_else(|| Error::ObjectNotFound(object.to_string()))?;
        if target.kind == ObjectKind::Empty {
            return Err(Error::Scene(format!(
                "Object '{}' has no geometry to take a material",
                object
            )));
        }
        match target.materials.first_mut() {
            Some(slot) => *slot = material.to_string(),
            None => target.materials.push(material.to_string()),
        }
        Ok(())
    }
}
