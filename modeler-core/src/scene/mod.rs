//! Host scene abstraction
//!
//! The executor talks to the 3D host only through [`Scene`], and only ever
//! refers to objects, modifiers and materials by name. The host owns every
//! object; names are the keys the executor keeps for rollback.

mod memory;

pub use memory::{MemoryScene, ObjectKind, SceneModifier, SceneObject};

use serde::{Deserialize, Serialize};

use crate::materials::MaterialPreset;
use crate::Result;

/// Mesh primitive with dimensions in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// Axis-aligned cube with edge length `size`
    Cube { size: f64 },
    /// UV sphere
    Sphere { radius: f64 },
    /// Cylinder along Z
    Cylinder { radius: f64, depth: f64 },
}

impl Primitive {
    /// Check that all dimensions are positive
    pub fn is_valid(&self) -> bool {
        match *self {
            Primitive::Cube { size } => size > 0.0,
            Primitive::Sphere { radius } => radius > 0.0,
            Primitive::Cylinder { radius, depth } => radius > 0.0 && depth > 0.0,
        }
    }
}

/// Object placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Location in meters
    pub location: [f64; 3],
    /// XYZ Euler rotation in radians
    pub rotation: [f64; 3],
}

impl Transform {
    /// Transform at the given location with no rotation
    pub fn at(location: [f64; 3]) -> Self {
        Self {
            location,
            rotation: [0.0; 3],
        }
    }

    /// Set the rotation about Z
    pub fn with_z_rotation(mut self, radians: f64) -> Self {
        self.rotation[2] = radians;
        self
    }
}

/// Boolean modifier operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOperation {
    Difference,
}

/// Non-destructive modifier attached to an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modifier {
    /// Boolean against another object
    Boolean {
        operation: BooleanOperation,
        object: String,
    },
    /// Array using an offset object
    Array { count: u32, offset_object: String },
    /// Edge bevel
    Bevel { width: f64, segments: u32 },
}

/// Operations the executor needs from a host scene
///
/// Methods that create things return the name the host actually assigned,
/// which may differ from the requested one when the host de-duplicates.
pub trait Scene {
    /// Whether the scene can accept operations
    fn is_available(&self) -> bool {
        true
    }

    /// Create a mesh primitive
    fn create_primitive(&mut self, name: &str, primitive: Primitive) -> Result<String>;

    /// Create an empty (geometry-less) object
    fn create_empty(&mut self, name: &str, transform: Transform) -> Result<String>;

    /// Check whether an object exists
    fn contains_object(&self, name: &str) -> bool;

    /// Unlink an object from the scene and delete it
    ///
    /// Returns false if there was no such object.
    fn remove_object(&mut self, name: &str) -> bool;

    /// Attach a modifier to an object
    fn add_modifier(&mut self, object: &str, name: &str, modifier: Modifier) -> Result<String>;

    /// Check whether an object carries a modifier
    fn has_modifier(&self, object: &str, modifier: &str) -> bool;

    /// Remove a modifier from an object
    ///
    /// Returns false if the object or modifier was not found.
    fn remove_modifier(&mut self, object: &str, modifier: &str) -> bool;

    /// Check whether a material exists
    fn has_material(&self, name: &str) -> bool;

    /// Create a material configured from a preset
    fn create_material(&mut self, name: &str, preset: &MaterialPreset) -> Result<String>;

    /// Put a material in the object's first slot, or append one if it has none
    fn assign_material(&mut self, object: &str, material: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_validity() {
        assert!(Primitive::Cube { size: 0.5 }.is_valid());
        assert!(!Primitive::Cube { size: 0.0 }.is_valid());
        assert!(!Primitive::Sphere { radius: -1.0 }.is_valid());
        assert!(!Primitive::Cylinder {
            radius: 1.0,
            depth: 0.0
        }
        .is_valid());
    }

    #[test]
    fn test_transform_builder() {
        let t = Transform::at([2.0, 0.0, 0.0]).with_z_rotation(1.5);
        assert_eq!(t.location, [2.0, 0.0, 0.0]);
        assert_eq!(t.rotation, [0.0, 0.0, 1.5]);
    }

    #[test]
    fn test_boolean_modifier_serializes_as_difference() {
        let modifier = Modifier::Boolean {
            operation: BooleanOperation::Difference,
            object: "AI_Cylinder".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&modifier).unwrap(),
            serde_json::json!({
                "type": "boolean",
                "operation": "difference",
                "object": "AI_Cylinder"
            })
        );
    }
}
