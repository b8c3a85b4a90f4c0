//! Planner response validation
//!
//! The service may return the plan at the top level or wrapped as
//! `{"plan": {...}}`. Only the shape is checked here; unknown operation
//! tags and missing step parameters are left to the executor so that they
//! fail (and roll back) at the step where they occur.

use modeler_core::plan::Params;
use modeler_core::{Plan, Step, Unit};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Parse and validate a plan from JSON text
pub fn decode_plan_str(text: &str) -> Result<Plan> {
    let value: Value = serde_json::from_str(text)?;
    decode_plan(value)
}

/// Validate a planner response and turn it into a [`Plan`]
pub fn decode_plan(value: Value) -> Result<Plan> {
    let mut object = into_object(value, "response")?;
    if matches!(object.get("plan"), Some(Value::Object(_))) {
        if let Some(inner) = object.remove("plan") {
            object = into_object(inner, "plan")?;
        }
    }

    let id = match object.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        Some(_) => return Err(Error::Validation("'id' must be a string or number".to_string())),
        None => return Err(missing("id")),
    };
    let prompt = required_string(&object, "prompt")?;

    let units = object
        .get("units")
        .or_else(|| object.get("unit"))
        .ok_or_else(|| missing("units"))?;
    let units = units
        .as_str()
        .ok_or_else(|| Error::Validation("'units' must be a string".to_string()))?
        .parse::<Unit>()
        .map_err(|e| Error::Validation(e.to_string()))?;

    let steps = match object.remove("steps") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(Error::Validation("'steps' must be an array".to_string())),
        None => return Err(missing("steps")),
    };
    let steps = steps
        .into_iter()
        .enumerate()
        .map(|(i, item)| decode_step(i + 1, item))
        .collect::<Result<Vec<_>>>()?;

    Ok(Plan {
        id,
        prompt,
        units,
        steps,
    })
}

fn decode_step(index: usize, value: Value) -> Result<Step> {
    let invalid = |reason: &str| Error::Validation(format!("step {}: {}", index, reason));

    let mut object = match value {
        Value::Object(map) => map,
        _ => return Err(invalid("must be an object")),
    };

    let op = match object.get("op") {
        Some(Value::String(op)) if !op.trim().is_empty() => op.trim().to_string(),
        Some(Value::String(_)) => return Err(invalid("'op' is empty")),
        Some(_) => return Err(invalid("'op' must be a string")),
        None => return Err(invalid("missing 'op'")),
    };

    let params: Params = match object.remove("params") {
        Some(Value::Object(params)) => params,
        Some(Value::Array(_)) => return Err(invalid("'params' must be an object, not an array")),
        Some(_) => return Err(invalid("'params' must be an object")),
        None => return Err(invalid("missing 'params'")),
    };

    let notes = match object.remove("notes") {
        None | Some(Value::Null) => None,
        Some(Value::String(notes)) => Some(notes),
        Some(_) => return Err(invalid("'notes' must be a string")),
    };

    Ok(Step { op, params, notes })
}

fn into_object(value: Value, what: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::Validation(format!("{} must be a JSON object", what))),
    }
}

fn required_string(object: &Map<String, Value>, key: &str) -> Result<String> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::Validation(format!("'{}' must be a string", key))),
        None => Err(missing(key)),
    }
}

fn missing(key: &str) -> Error {
    Error::Validation(format!("missing '{}'", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_json() -> Value {
        json!({
            "id": "p-1",
            "prompt": "a cube",
            "units": "CM",
            "steps": [
                {"op": "ADD_CUBE", "params": {"size": 50}, "notes": "base"},
                {"op": "BEVEL", "params": {"target": "AI_Cube"}}
            ]
        })
    }

    #[test]
    fn test_decode_top_level() {
        let plan = decode_plan(plan_json()).unwrap();
        assert_eq!(plan.id, "p-1");
        assert_eq!(plan.prompt, "a cube");
        assert_eq!(plan.units, Unit::Centimeter);
        assert_eq!(plan.ops(), vec!["ADD_CUBE", "BEVEL"]);
        assert_eq!(plan.steps[0].notes.as_deref(), Some("base"));
        assert_eq!(plan.steps[1].notes, None);
        assert_eq!(plan.steps[0].params["size"], json!(50));
    }

    #[test]
    fn test_decode_wrapped() {
        let plan = decode_plan(json!({ "plan": plan_json() })).unwrap();
        assert_eq!(plan.id, "p-1");
        assert_eq!(plan.steps.len(), 2);
    }

    #[test]
    fn test_unit_alias_key() {
        let mut value = plan_json();
        let units = value.as_object_mut().unwrap().remove("units").unwrap();
        value["unit"] = units;
        assert_eq!(decode_plan(value).unwrap().units, Unit::Centimeter);
    }

    #[test]
    fn test_numeric_id_accepted() {
        let mut value = plan_json();
        value["id"] = json!(42);
        assert_eq!(decode_plan(value).unwrap().id, "42");

        let mut value = plan_json();
        value["id"] = json!(["p-1"]);
        assert!(matches!(decode_plan(value), Err(Error::Validation(_))));
    }

    #[test]
    fn test_missing_top_level_keys() {
        for key in ["id", "prompt", "units", "steps"] {
            let mut value = plan_json();
            value.as_object_mut().unwrap().remove(key);
            let err = decode_plan(value).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{}: {:?}", key, err);
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn test_invalid_units_rejected() {
        let mut value = plan_json();
        value["units"] = json!("furlong");
        assert!(matches!(decode_plan(value), Err(Error::Validation(_))));
    }

    #[test]
    fn test_params_array_rejected() {
        let mut value = plan_json();
        value["steps"][0]["params"] = json!([1, 2, 3]);
        let err = decode_plan(value).unwrap_err();
        assert!(err.to_string().contains("step 1"));
    }

    #[test]
    fn test_empty_op_rejected() {
        let mut value = plan_json();
        value["steps"][1]["op"] = json!("  ");
        let err = decode_plan(value).unwrap_err();
        assert!(err.to_string().contains("step 2"));

        let mut value = plan_json();
        value["steps"][1]["op"] = json!(7);
        assert!(decode_plan(value).is_err());
    }

    #[test]
    fn test_unknown_op_passes_validation() {
        let mut value = plan_json();
        value["steps"][0]["op"] = json!("ADD_TORUS");
        let plan = decode_plan(value).unwrap();
        assert_eq!(plan.steps[0].op, "ADD_TORUS");
    }

    #[test]
    fn test_non_object_response() {
        assert!(matches!(decode_plan(json!([1])), Err(Error::Validation(_))));
        assert!(matches!(decode_plan_str("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_decode_str() {
        let plan = decode_plan_str(&plan_json().to_string()).unwrap();
        assert_eq!(plan.units, Unit::Centimeter);
    }
}
