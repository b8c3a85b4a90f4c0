//! Per-operation handlers
//!
//! Each handler records every object it creates and every modifier it adds
//! in the [`StepContext`] before returning.

use std::f64::consts::TAU;

use tracing::debug;

use super::transaction::StepContext;
use crate::materials::{material_name, MaterialCatalog};
use crate::plan::{
    Operation, DEFAULT_BOX_NAME, DEFAULT_CYLINDER_NAME, DEFAULT_SPHERE_NAME,
};
use crate::scene::{BooleanOperation, Modifier, Primitive, Scene, Transform};
use crate::units::{Unit, UnitHint};
use crate::{Error, Result};

/// Modifier name used for boolean differences
pub const BOOLEAN_MODIFIER: &str = "AI_Boolean";
/// Modifier name used for radial arrays
pub const ARRAY_MODIFIER: &str = "AI_Array";
/// Modifier name used for bevels
pub const BEVEL_MODIFIER: &str = "AI_Bevel";

/// Everything a handler needs besides its own parameters
pub(super) struct HandlerEnv<'a, S: Scene + ?Sized> {
    pub scene: &'a mut S,
    pub catalog: &'a MaterialCatalog,
    pub ctx: &'a mut StepContext,
    /// Unit for lengths whose step carries none
    pub default_unit: Unit,
}

impl<S: Scene + ?Sized> HandlerEnv<'_, S> {
    fn meters(&self, value: f64, unit: &Option<UnitHint>) -> f64 {
        match unit {
            Some(hint) => hint.to_meters(value),
            None => self.default_unit.to_meters(value),
        }
    }

    fn require_object(&self, name: &str) -> Result<()> {
        if self.scene.contains_object(name) {
            Ok(())
        } else {
            Err(Error::ObjectNotFound(name.to_string()))
        }
    }

    fn create(&mut self, name: &str, primitive: Primitive) -> Result<()> {
        let assigned = self.scene.create_primitive(name, primitive)?;
        debug!(requested = %name, object = %assigned, ?primitive, "Created primitive");
        self.ctx.record_object(assigned);
        Ok(())
    }

    fn modify(&mut self, object: &str, name: &str, modifier: Modifier) -> Result<()> {
        let assigned = self.scene.add_modifier(object, name, modifier)?;
        debug!(object = %object, modifier = %assigned, "Added modifier");
        self.ctx.record_modifier(object, assigned);
        Ok(())
    }
}

/// Apply one typed operation to the scene
pub(super) fn apply<S: Scene + ?Sized>(op: &Operation, env: &mut HandlerEnv<'_, S>) -> Result<()> {
    match op {
        Operation::CreateBox { size, unit, name } => {
            let size = env.meters(*size, unit);
            let name = name.as_deref().unwrap_or(DEFAULT_BOX_NAME);
            env.create(name, Primitive::Cube { size })
        }
        Operation::CreateSphere { radius, unit, name } => {
            let radius = env.meters(*radius, unit);
            let name = name.as_deref().unwrap_or(DEFAULT_SPHERE_NAME);
            env.create(name, Primitive::Sphere { radius })
        }
        Operation::CreateCylinder {
            radius,
            depth,
            unit,
            name,
        } => {
            let radius = env.meters(*radius, unit);
            let depth = env.meters(*depth, unit);
            let name = name.as_deref().unwrap_or(DEFAULT_CYLINDER_NAME);
            env.create(name, Primitive::Cylinder { radius, depth })
        }
        Operation::BooleanSubtract { target, cutter } => boolean_subtract(env, target, cutter),
        Operation::RadialArray {
            source,
            count,
            radius,
            unit,
        } => {
            let radius = env.meters(*radius, unit);
            radial_array(env, source, *count, radius)
        }
        Operation::Bevel {
            target,
            width,
            unit,
            segments,
        } => {
            env.require_object(target)?;
            let width = env.meters(*width, unit);
            let modifier = Modifier::Bevel {
                width,
                segments: at_least_one(*segments),
            };
            env.modify(target, BEVEL_MODIFIER, modifier)
        }
        Operation::SetMaterial { target, preset } => set_material(env, target, preset),
    }
}

fn boolean_subtract<S: Scene + ?Sized>(
    env: &mut HandlerEnv<'_, S>,
    target: &str,
    cutter: &str,
) -> Result<()> {
    env.require_object(target)?;
    env.require_object(cutter)?;
    let modifier = Modifier::Boolean {
        operation: BooleanOperation::Difference,
        object: cutter.to_string(),
    };
    env.modify(target, BOOLEAN_MODIFIER, modifier)
}

fn radial_array<S: Scene + ?Sized>(
    env: &mut HandlerEnv<'_, S>,
    source: &str,
    count: i64,
    radius: f64,
) -> Result<()> {
    env.require_object(source)?;
    let count = at_least_one(count);

    // Each copy is offset by the anchor's transform, so rotating the anchor
    // by one step of the circle fans the copies out around the origin.
    let transform = Transform::at([radius, 0.0, 0.0]).with_z_rotation(TAU / f64::from(count));
    let anchor = env
        .scene
        .create_empty(&format!("{}_RadialEmpty", source), transform)?;
    env.ctx.record_object(anchor.clone());

    let modifier = Modifier::Array {
        count,
        offset_object: anchor,
    };
    env.modify(source, ARRAY_MODIFIER, modifier)
}

fn set_material<S: Scene + ?Sized>(
    env: &mut HandlerEnv<'_, S>,
    target: &str,
    preset_name: &str,
) -> Result<()> {
    env.require_object(target)?;
    let preset = env.catalog.get(preset_name)?;

    let mut material = material_name(preset_name);
    if !env.scene.has_material(&material) {
        material = env.scene.create_material(&material, preset)?;
        debug!(material = %material, preset = %preset_name, "Created material");
    }

    env.scene.assign_material(target, &material)
}

fn at_least_one(value: i64) -> u32 {
    u32::try_from(value.max(1)).unwrap_or(u32::MAX)
}
