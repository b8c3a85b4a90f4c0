//! Rule-based prompt compiler
//!
//! Turns a short free-text prompt into a [`Plan`] by keyword and number
//! matching only. Steps are emitted in a fixed order (primitives, array,
//! bevel, boolean, material) so later steps can refer to objects created by
//! earlier ones.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::plan::{
    OpKind, Operation, Plan, Step, DEFAULT_BOX_NAME, DEFAULT_CYLINDER_NAME, DEFAULT_SPHERE_NAME,
};
use crate::units::{Unit, UnitHint};

const BOX_KEYWORDS: &[&str] = &["cube", "box", "立方", "正方体"];
const SPHERE_KEYWORDS: &[&str] = &["sphere", "ball", "球"];
const CYLINDER_KEYWORDS: &[&str] = &["cylinder", "圆柱"];
const ARRAY_KEYWORDS: &[&str] = &["radial", "array", "阵列"];
const BEVEL_KEYWORDS: &[&str] = &["bevel", "chamfer", "倒角"];
const BOOLEAN_KEYWORDS: &[&str] = &["hole", "boolean", "subtract", "挖", "孔", "布尔"];

/// Material keywords in priority order; the first group that matches wins
const MATERIAL_KEYWORDS: &[(&[&str], &str)] = &[
    (&["metal", "金属"], "metal_brushed"),
    (&["plastic", "塑料"], "plastic"),
    (&["wood", "木"], "wood"),
];

const RADIAL_ARRAY_COUNT: i64 = 8;
const BEVEL_WIDTH_RATIO: f64 = 0.05;
const BEVEL_SEGMENTS: i64 = 3;

/// A number followed by a unit token found in a prompt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub unit: Unit,
}

fn dimension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Latin units are captured as a whole word so "3 metal" is not "3 m"
        Regex::new(r"(\d+(?:\.\d+)?)\s*([a-z]+|毫米|厘米|米)")
            .expect("dimension pattern is valid")
    })
}

/// Find every `<number><unit>` in the prompt, in order of appearance
///
/// The unit may be an abbreviation (`cm`) or a spelled-out word
/// (`meters`, `centimetre`). Numbers followed by any other word are skipped.
pub fn extract_dimensions(prompt: &str) -> Vec<Dimension> {
    let normalized = prompt.to_lowercase();

    dimension_pattern()
        .captures_iter(&normalized)
        .filter_map(|caps| {
            let unit = Unit::from_alias(&caps[2])?;
            let value = caps[1].parse::<f64>().ok()?;
            Some(Dimension { value, unit })
        })
        .collect()
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn has_op(steps: &[Step], kind: OpKind) -> bool {
    steps.iter().any(|s| s.op == kind.as_str())
}

/// Pick the material preset a prompt asks for, if any
pub fn match_material(prompt: &str) -> Option<&'static str> {
    let normalized = prompt.to_lowercase();
    MATERIAL_KEYWORDS
        .iter()
        .find(|(keywords, _)| contains_any(&normalized, keywords))
        .map(|(_, preset)| *preset)
}

/// Compile a prompt into a plan
///
/// Never fails: a prompt with no recognizable keywords yields an empty plan.
/// Apart from the plan id the output depends only on the inputs.
pub fn compile(prompt: &str, default_unit: Unit) -> Plan {
    let normalized = prompt.to_lowercase();

    let (size, size_unit) = match extract_dimensions(prompt).first() {
        Some(dim) => (dim.value, dim.unit),
        None => (1.0, default_unit),
    };
    let unit = || Some(UnitHint::Known(size_unit));

    let mut steps: Vec<Step> = Vec::new();
    let mut last_object: Option<&str> = None;

    if contains_any(&normalized, BOX_KEYWORDS) {
        last_object = Some(DEFAULT_BOX_NAME);
        steps.push(
            Operation::CreateBox {
                size,
                unit: unit(),
                name: Some(DEFAULT_BOX_NAME.to_string()),
            }
            .into_step(Some("base cube")),
        );
    }

    if contains_any(&normalized, SPHERE_KEYWORDS) {
        last_object = Some(DEFAULT_SPHERE_NAME);
        steps.push(
            Operation::CreateSphere {
                radius: size / 2.0,
                unit: unit(),
                name: Some(DEFAULT_SPHERE_NAME.to_string()),
            }
            .into_step(Some("sphere")),
        );
    }

    if contains_any(&normalized, CYLINDER_KEYWORDS) {
        last_object = Some(DEFAULT_CYLINDER_NAME);
        steps.push(
            Operation::CreateCylinder {
                radius: size / 2.0,
                depth: size,
                unit: unit(),
                name: Some(DEFAULT_CYLINDER_NAME.to_string()),
            }
            .into_step(Some("cylinder")),
        );
    }

    let implicit_target = last_object.unwrap_or(DEFAULT_BOX_NAME).to_string();

    if contains_any(&normalized, ARRAY_KEYWORDS) {
        steps.push(
            Operation::RadialArray {
                source: implicit_target.clone(),
                count: RADIAL_ARRAY_COUNT,
                radius: size,
                unit: unit(),
            }
            .into_step(Some("radial array")),
        );
    }

    if contains_any(&normalized, BEVEL_KEYWORDS) {
        steps.push(
            Operation::Bevel {
                target: implicit_target.clone(),
                width: size * BEVEL_WIDTH_RATIO,
                unit: unit(),
                segments: BEVEL_SEGMENTS,
            }
            .into_step(Some("bevel edges")),
        );
    }

    if contains_any(&normalized, BOOLEAN_KEYWORDS) {
        if !has_op(&steps, OpKind::AddCube) {
            steps.insert(
                0,
                Operation::CreateBox {
                    size,
                    unit: unit(),
                    name: Some(DEFAULT_BOX_NAME.to_string()),
                }
                .into_step(Some("boolean base")),
            );
        }

        if !has_op(&steps, OpKind::AddCylinder) {
            steps.push(
                Operation::CreateCylinder {
                    radius: size / 4.0,
                    depth: size,
                    unit: unit(),
                    name: Some(DEFAULT_CYLINDER_NAME.to_string()),
                }
                .into_step(Some("boolean cutter")),
            );
        }

        steps.push(
            Operation::BooleanSubtract {
                target: DEFAULT_BOX_NAME.to_string(),
                cutter: DEFAULT_CYLINDER_NAME.to_string(),
            }
            .into_step(Some("boolean difference")),
        );
    }

    if let Some(preset) = match_material(prompt) {
        steps.push(
            Operation::SetMaterial {
                target: implicit_target,
                preset: preset.to_string(),
            }
            .into_step(Some("material preset")),
        );
    }

    let plan = Plan::new(prompt, default_unit).with_steps(steps);
    debug!(plan_id = %plan.id, ops = ?plan.ops(), "Compiled prompt");
    plan
}

/// Offline planner backed by [`compile`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesPlanner;

impl RulesPlanner {
    /// Create a rules planner
    pub fn new() -> Self {
        Self
    }

    /// Generate a plan for a prompt
    pub fn generate_plan(&self, prompt: &str, units: Unit) -> Plan {
        compile(prompt, units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn position(plan: &Plan, op: OpKind) -> usize {
        plan.steps
            .iter()
            .position(|s| s.op == op.as_str())
            .unwrap_or_else(|| panic!("{} not in {:?}", op, plan.ops()))
    }

    fn step_of(plan: &Plan, op: OpKind) -> &Step {
        &plan.steps[position(plan, op)]
    }

    #[test]
    fn test_box_with_hole_and_metal() {
        let plan = compile("制作一个50cm的金属立方体并挖孔", Unit::Centimeter);

        let cube = position(&plan, OpKind::AddCube);
        let cylinder = position(&plan, OpKind::AddCylinder);
        let boolean = position(&plan, OpKind::BooleanDifference);
        let material = position(&plan, OpKind::SetMaterial);
        assert!(cube < cylinder && cylinder < boolean && boolean < material);

        let boolean = step_of(&plan, OpKind::BooleanDifference);
        assert_eq!(boolean.params["target"], json!(DEFAULT_BOX_NAME));
        assert_eq!(boolean.params["cutter"], json!(DEFAULT_CYLINDER_NAME));

        let material = step_of(&plan, OpKind::SetMaterial);
        assert_eq!(material.params["preset"], json!("metal_brushed"));
        assert_eq!(material.params["target"], json!(DEFAULT_BOX_NAME));

        let cube = step_of(&plan, OpKind::AddCube);
        assert_eq!(cube.params["size"], json!(50.0));
        assert_eq!(cube.params["units"], json!("CM"));

        // Cutter cylinder is a quarter of the size hint
        let cutter = step_of(&plan, OpKind::AddCylinder);
        assert_eq!(cutter.params["radius"], json!(12.5));
        assert_eq!(cutter.params["depth"], json!(50.0));
    }

    #[test]
    fn test_array_and_bevel() {
        let plan = compile("create a radial array of cylinders with bevel", Unit::Meter);
        assert_eq!(plan.ops(), vec!["ADD_CYLINDER", "ARRAY_RADIAL", "BEVEL"]);

        let array = step_of(&plan, OpKind::ArrayRadial);
        assert_eq!(array.params["source"], json!(DEFAULT_CYLINDER_NAME));
        assert_eq!(array.params["count"], json!(8));
        assert_eq!(array.params["radius"], json!(1.0));

        let bevel = step_of(&plan, OpKind::Bevel);
        assert_eq!(bevel.params["target"], json!(DEFAULT_CYLINDER_NAME));
        assert_eq!(bevel.params["segments"], json!(3));
        assert_eq!(bevel.params["width"], json!(0.05));
        assert_eq!(bevel.params["units"], json!("M"));
    }

    #[test]
    fn test_no_keywords_yields_empty_plan() {
        let plan = compile("hello there", Unit::Meter);
        assert!(plan.is_empty());
        assert_eq!(plan.prompt, "hello there");
        assert_eq!(plan.units, Unit::Meter);
    }

    #[test]
    fn test_deterministic_steps() {
        let prompt = "a 20mm wooden sphere and a box with chamfer";
        let a = compile(prompt, Unit::Millimeter);
        let b = compile(prompt, Unit::Millimeter);
        assert_eq!(a.steps, b.steps);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_multiple_primitives_in_fixed_order() {
        let plan = compile("a sphere on a cube next to a cylinder, plastic", Unit::Meter);
        assert_eq!(
            plan.ops(),
            vec!["ADD_CUBE", "ADD_SPHERE", "ADD_CYLINDER", "SET_MATERIAL"]
        );
        // Last detected primitive becomes the implicit target
        let material = step_of(&plan, OpKind::SetMaterial);
        assert_eq!(material.params["target"], json!(DEFAULT_CYLINDER_NAME));
        assert_eq!(material.params["preset"], json!("plastic"));
    }

    #[test]
    fn test_boolean_without_primitives_inserts_both() {
        let plan = compile("drill a hole", Unit::Meter);
        assert_eq!(
            plan.ops(),
            vec!["ADD_CUBE", "ADD_CYLINDER", "BOOLEAN_DIFFERENCE"]
        );
    }

    #[test]
    fn test_boolean_inserts_box_at_front() {
        let plan = compile("sphere with a hole, bevel it", Unit::Meter);
        assert_eq!(
            plan.ops(),
            vec![
                "ADD_CUBE",
                "ADD_SPHERE",
                "BEVEL",
                "ADD_CYLINDER",
                "BOOLEAN_DIFFERENCE"
            ]
        );
        assert_eq!(
            step_of(&plan, OpKind::Bevel).params["target"],
            json!(DEFAULT_SPHERE_NAME)
        );
    }

    #[test]
    fn test_modifier_defaults_to_cube_name() {
        let plan = compile("bevel", Unit::Meter);
        assert_eq!(plan.ops(), vec!["BEVEL"]);
        assert_eq!(plan.steps[0].params["target"], json!(DEFAULT_BOX_NAME));
    }

    #[test]
    fn test_material_priority() {
        assert_eq!(match_material("wood and metal"), Some("metal_brushed"));
        assert_eq!(match_material("塑料木头"), Some("plastic"));
        assert_eq!(match_material("Wooden"), Some("wood"));
        assert_eq!(match_material("stone"), None);
    }

    #[test]
    fn test_sphere_radius_is_half_size() {
        let plan = compile("2m ball", Unit::Centimeter);
        let sphere = step_of(&plan, OpKind::AddSphere);
        assert_eq!(sphere.params["radius"], json!(1.0));
        assert_eq!(sphere.params["units"], json!("M"));
    }

    #[test]
    fn test_default_size_uses_default_unit() {
        let plan = compile("cube", Unit::Millimeter);
        let cube = step_of(&plan, OpKind::AddCube);
        assert_eq!(cube.params["size"], json!(1.0));
        assert_eq!(cube.params["units"], json!("MM"));
    }

    #[test]
    fn test_extract_dimensions() {
        let dims = extract_dimensions("A 12.5CM box, 30 mm hole and 2米 base");
        assert_eq!(
            dims,
            vec![
                Dimension {
                    value: 12.5,
                    unit: Unit::Centimeter
                },
                Dimension {
                    value: 30.0,
                    unit: Unit::Millimeter
                },
                Dimension {
                    value: 2.0,
                    unit: Unit::Meter
                },
            ]
        );
    }

    #[test]
    fn test_extract_dimensions_chinese_units() {
        let dims = extract_dimensions("直径5厘米，高80毫米");
        assert_eq!(dims[0].unit, Unit::Centimeter);
        assert_eq!(dims[1].unit, Unit::Millimeter);
        assert_eq!(dims[1].value, 80.0);
    }

    #[test]
    fn test_extract_dimensions_skips_words() {
        // "3 metal" is not three meters
        let dims = extract_dimensions("3 metal rods of 40cm");
        assert_eq!(
            dims,
            vec![Dimension {
                value: 40.0,
                unit: Unit::Centimeter
            }]
        );
    }

    #[test]
    fn test_extract_dimensions_spelled_out_units() {
        let dims = extract_dimensions("2 meter base, 30 millimeters thick, 10 cms wide, 4 Centimetres");
        assert_eq!(
            dims,
            vec![
                Dimension {
                    value: 2.0,
                    unit: Unit::Meter
                },
                Dimension {
                    value: 30.0,
                    unit: Unit::Millimeter
                },
                Dimension {
                    value: 10.0,
                    unit: Unit::Centimeter
                },
                Dimension {
                    value: 4.0,
                    unit: Unit::Centimeter
                },
            ]
        );
    }

    #[test]
    fn test_first_real_unit_wins_after_skipped_word() {
        let plan = compile("3 metal cubes of 5 meters", Unit::Centimeter);
        let cube = step_of(&plan, OpKind::AddCube);
        assert_eq!(cube.params["size"], json!(5.0));
        assert_eq!(cube.params["units"], json!("M"));
    }

    #[test]
    fn test_spelled_out_meter_cube() {
        let plan = compile("a 2 meter cube", Unit::Centimeter);
        let cube = step_of(&plan, OpKind::AddCube);
        assert_eq!(cube.params["size"], json!(2.0));
        assert_eq!(cube.params["units"], json!("M"));
    }
}
