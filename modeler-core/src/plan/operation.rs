//! Strongly typed operations and the conversion boundary to wire steps
//!
//! The executor never dispatches on raw parameter maps. Every [`Step`] is
//! first converted into an [`Operation`], which is where unknown tags and
//! missing or malformed parameters surface as errors.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use super::types::{Params, Step};
use crate::units::UnitHint;
use crate::{Error, Result};

/// Default object name for boxes
pub const DEFAULT_BOX_NAME: &str = "AI_Cube";
/// Default object name for spheres
pub const DEFAULT_SPHERE_NAME: &str = "AI_Sphere";
/// Default object name for cylinders
pub const DEFAULT_CYLINDER_NAME: &str = "AI_Cylinder";

/// Closed set of operation tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    AddCube,
    AddSphere,
    AddCylinder,
    BooleanDifference,
    ArrayRadial,
    Bevel,
    SetMaterial,
}

impl OpKind {
    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::AddCube => "ADD_CUBE",
            OpKind::AddSphere => "ADD_SPHERE",
            OpKind::AddCylinder => "ADD_CYLINDER",
            OpKind::BooleanDifference => "BOOLEAN_DIFFERENCE",
            OpKind::ArrayRadial => "ARRAY_RADIAL",
            OpKind::Bevel => "BEVEL",
            OpKind::SetMaterial => "SET_MATERIAL",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ADD_CUBE" => Ok(OpKind::AddCube),
            "ADD_SPHERE" => Ok(OpKind::AddSphere),
            "ADD_CYLINDER" => Ok(OpKind::AddCylinder),
            "BOOLEAN_DIFFERENCE" => Ok(OpKind::BooleanDifference),
            "ARRAY_RADIAL" => Ok(OpKind::ArrayRadial),
            "BEVEL" => Ok(OpKind::Bevel),
            "SET_MATERIAL" => Ok(OpKind::SetMaterial),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

/// A modeling operation with its typed parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Add a box with edge length `size`
    CreateBox {
        size: f64,
        unit: Option<UnitHint>,
        name: Option<String>,
    },
    /// Add a UV sphere
    CreateSphere {
        radius: f64,
        unit: Option<UnitHint>,
        name: Option<String>,
    },
    /// Add a cylinder along Z
    CreateCylinder {
        radius: f64,
        depth: f64,
        unit: Option<UnitHint>,
        name: Option<String>,
    },
    /// Boolean difference of `cutter` from `target`
    BooleanSubtract { target: String, cutter: String },
    /// Radial array of `source` around an anchor at `radius`
    RadialArray {
        source: String,
        count: i64,
        radius: f64,
        unit: Option<UnitHint>,
    },
    /// Bevel modifier on `target`
    Bevel {
        target: String,
        width: f64,
        unit: Option<UnitHint>,
        segments: i64,
    },
    /// Assign a material preset to `target`
    SetMaterial { target: String, preset: String },
}

impl Operation {
    /// Tag of this operation
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::CreateBox { .. } => OpKind::AddCube,
            Operation::CreateSphere { .. } => OpKind::AddSphere,
            Operation::CreateCylinder { .. } => OpKind::AddCylinder,
            Operation::BooleanSubtract { .. } => OpKind::BooleanDifference,
            Operation::RadialArray { .. } => OpKind::ArrayRadial,
            Operation::Bevel { .. } => OpKind::Bevel,
            Operation::SetMaterial { .. } => OpKind::SetMaterial,
        }
    }

    /// Decode a wire step into a typed operation
    pub fn from_step(step: &Step) -> Result<Self> {
        let kind: OpKind = step.op.parse()?;
        let params = ParamReader {
            kind,
            params: &step.params,
        };

        let op = match kind {
            OpKind::AddCube => Operation::CreateBox {
                size: params.required_f64("size")?,
                unit: params.unit()?,
                name: params.optional_str("name")?,
            },
            OpKind::AddSphere => Operation::CreateSphere {
                radius: params.required_f64("radius")?,
                unit: params.unit()?,
                name: params.optional_str("name")?,
            },
            OpKind::AddCylinder => Operation::CreateCylinder {
                radius: params.required_f64("radius")?,
                depth: params.required_f64("depth")?,
                unit: params.unit()?,
                name: params.optional_str("name")?,
            },
            OpKind::BooleanDifference => Operation::BooleanSubtract {
                target: params.required_str("target")?,
                cutter: params.required_str("cutter")?,
            },
            OpKind::ArrayRadial => Operation::RadialArray {
                source: params.required_str("source")?,
                count: params.optional_i64("count")?.unwrap_or(6),
                radius: params.optional_f64("radius")?.unwrap_or(1.0),
                unit: params.unit()?,
            },
            OpKind::Bevel => Operation::Bevel {
                target: params.required_str("target")?,
                width: params.optional_f64("width")?.unwrap_or(0.01),
                unit: params.unit()?,
                segments: params.optional_i64("segments")?.unwrap_or(2),
            },
            OpKind::SetMaterial => Operation::SetMaterial {
                target: params.required_str("target")?,
                preset: params.required_str("preset")?,
            },
        };

        Ok(op)
    }

    /// Encode this operation as a wire step
    pub fn into_step(self, notes: Option<&str>) -> Step {
        let kind = self.kind();
        let mut params = Params::new();

        match self {
            Operation::CreateBox { size, unit, name } => {
                params.insert("size".into(), json!(size));
                insert_unit(&mut params, unit);
                insert_opt(&mut params, "name", name);
            }
            Operation::CreateSphere { radius, unit, name } => {
                params.insert("radius".into(), json!(radius));
                insert_unit(&mut params, unit);
                insert_opt(&mut params, "name", name);
            }
            Operation::CreateCylinder {
                radius,
                depth,
                unit,
                name,
            } => {
                params.insert("radius".into(), json!(radius));
                params.insert("depth".into(), json!(depth));
                insert_unit(&mut params, unit);
                insert_opt(&mut params, "name", name);
            }
            Operation::BooleanSubtract { target, cutter } => {
                params.insert("target".into(), json!(target));
                params.insert("cutter".into(), json!(cutter));
            }
            Operation::RadialArray {
                source,
                count,
                radius,
                unit,
            } => {
                params.insert("source".into(), json!(source));
                params.insert("count".into(), json!(count));
                params.insert("radius".into(), json!(radius));
                insert_unit(&mut params, unit);
            }
            Operation::Bevel {
                target,
                width,
                unit,
                segments,
            } => {
                params.insert("target".into(), json!(target));
                params.insert("width".into(), json!(width));
                insert_unit(&mut params, unit);
                params.insert("segments".into(), json!(segments));
            }
            Operation::SetMaterial { target, preset } => {
                params.insert("target".into(), json!(target));
                params.insert("preset".into(), json!(preset));
            }
        }

        Step {
            op: kind.as_str().to_string(),
            params,
            notes: notes.map(str::to_string),
        }
    }
}

fn insert_unit(params: &mut Params, unit: Option<UnitHint>) {
    if let Some(unit) = unit {
        params.insert("units".into(), json!(unit.as_str()));
    }
}

fn insert_opt(params: &mut Params, key: &str, value: Option<String>) {
    if let Some(value) = value {
        params.insert(key.into(), json!(value));
    }
}

/// Typed accessors over a raw parameter map
struct ParamReader<'a> {
    kind: OpKind,
    params: &'a Params,
}

impl ParamReader<'_> {
    fn missing(&self, key: &str) -> Error {
        Error::MissingParameter {
            operation: self.kind.to_string(),
            key: key.to_string(),
        }
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> Error {
        Error::InvalidParameter {
            operation: self.kind.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    fn optional_f64(&self, key: &str) -> Result<Option<f64>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match number {
            Some(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(self.invalid(key, format!("expected a number, got {}", value))),
        }
    }

    fn required_f64(&self, key: &str) -> Result<f64> {
        self.optional_f64(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_i64(&self, key: &str) -> Result<Option<i64>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        if let Some(n) = value.as_i64() {
            return Ok(Some(n));
        }
        // Floats and numeric strings truncate toward zero
        self.optional_f64(key)
            .map_err(|_| self.invalid(key, format!("expected an integer, got {}", value)))
            .map(|n| n.map(|f| f.trunc() as i64))
    }

    fn optional_str(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(key, format!("expected a string, got {}", other))),
        }
    }

    fn required_str(&self, key: &str) -> Result<String> {
        self.optional_str(key)?.ok_or_else(|| self.missing(key))
    }

    fn unit(&self) -> Result<Option<UnitHint>> {
        let value = self.get("units").or_else(|| self.get("unit"));
        match value {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(UnitHint::parse(s))),
            Some(other) => Err(self.invalid("units", format!("expected a string, got {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;

    fn step(op: &str, params: Value) -> Step {
        let Value::Object(map) = params else {
            panic!("params must be an object");
        };
        Step::new(op, map)
    }

    #[test]
    fn test_unknown_operation() {
        let err = Operation::from_step(&step("EXTRUDE", json!({}))).unwrap_err();
        assert!(matches!(err, Error::UnknownOperation(ref op) if op == "EXTRUDE"));
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = Operation::from_step(&step("ADD_CYLINDER", json!({ "radius": 1 }))).unwrap_err();
        match err {
            Error::MissingParameter { operation, key } => {
                assert_eq!(operation, "ADD_CYLINDER");
                assert_eq!(key, "depth");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_target_counts_as_missing() {
        let err = Operation::from_step(&step("BEVEL", json!({ "target": "" }))).unwrap_err();
        assert!(matches!(err, Error::MissingParameter { .. }));
    }

    #[test]
    fn test_invalid_number() {
        let err = Operation::from_step(&step("ADD_CUBE", json!({ "size": "big" }))).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref key, .. } if key == "size"));
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let op = Operation::from_step(&step(
            "ARRAY_RADIAL",
            json!({ "source": "A", "count": "4", "radius": "2.5" }),
        ))
        .unwrap();
        assert_eq!(
            op,
            Operation::RadialArray {
                source: "A".to_string(),
                count: 4,
                radius: 2.5,
                unit: None,
            }
        );
    }

    #[test]
    fn test_defaults_applied() {
        let op = Operation::from_step(&step("BEVEL", json!({ "target": "A" }))).unwrap();
        assert_eq!(
            op,
            Operation::Bevel {
                target: "A".to_string(),
                width: 0.01,
                unit: None,
                segments: 2,
            }
        );

        let op = Operation::from_step(&step("ARRAY_RADIAL", json!({ "source": "A" }))).unwrap();
        assert!(matches!(op, Operation::RadialArray { count: 6, .. }));
    }

    #[test]
    fn test_unit_key_alias() {
        let op = Operation::from_step(&step("ADD_CUBE", json!({ "size": 5, "unit": "mm" }))).unwrap();
        assert!(matches!(
            op,
            Operation::CreateBox { unit: Some(UnitHint::Known(Unit::Millimeter)), .. }
        ));
    }

    #[test]
    fn test_into_step_decodes_back() {
        let op = Operation::CreateCylinder {
            radius: 0.25,
            depth: 1.0,
            unit: Some(UnitHint::Known(Unit::Centimeter)),
            name: Some("Pipe".to_string()),
        };
        let wire = op.clone().into_step(Some("pipe"));
        assert_eq!(wire.op, "ADD_CYLINDER");
        assert_eq!(wire.params["units"], json!("CM"));
        assert_eq!(wire.notes.as_deref(), Some("pipe"));
        assert_eq!(Operation::from_step(&wire).unwrap(), op);
    }
}
