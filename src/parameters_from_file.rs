//! Supports reading arm and solver parameters from YAML files (optional)

use std::path::Path;
use std::sync::Arc;

use yaml_rust2::{Yaml, YamlLoader};

use crate::chain::{ArmSide, DhChain, DhLink};
use crate::differencing::Differencing;
use crate::kinematic_traits::Transform;
use crate::parameter_error::ParameterError;
use crate::parameters::{ArmParameters, SolverParameters};
use crate::tripod::TripodParameters;
use crate::utils::{homogeneous_transform_defect, orthonormalize};

fn load_document(contents: &str) -> Result<Yaml, ParameterError> {
    let mut docs = YamlLoader::load_from_str(contents)
        .map_err(|e| ParameterError::ParseError(format!("{}", e)))?;
    if docs.is_empty() {
        return Err(ParameterError::ParseError("empty YAML document".to_string()));
    }
    Ok(docs.swap_remove(0))
}

fn section<'a>(doc: &'a Yaml, name: &str) -> Result<&'a Yaml, ParameterError> {
    let node = &doc[name];
    if node.is_badvalue() {
        return Err(ParameterError::MissingField(name.to_string()));
    }
    Ok(node)
}

/// Integers are accepted where reals are expected.
fn as_number(node: &Yaml) -> Option<f64> {
    match node {
        Yaml::Integer(i) => Some(*i as f64),
        _ => node.as_f64(),
    }
}

fn number(parent: &Yaml, field: &str) -> Result<f64, ParameterError> {
    let node = &parent[field];
    if node.is_badvalue() {
        return Err(ParameterError::MissingField(field.to_string()));
    }
    let value = as_number(node).ok_or_else(|| ParameterError::InvalidValue {
        field: field.to_string(),
        reason: format!("expected a number, found {:?}", node),
    })?;
    if !value.is_finite() {
        return Err(ParameterError::InvalidValue { field: field.to_string(), reason: "must be finite".to_string() });
    }
    Ok(value)
}

fn optional_number(parent: &Yaml, field: &str, default: f64) -> Result<f64, ParameterError> {
    if parent[field].is_badvalue() { Ok(default) } else { number(parent, field) }
}

fn optional_bool(parent: &Yaml, field: &str, default: bool) -> Result<bool, ParameterError> {
    let node = &parent[field];
    if node.is_badvalue() {
        return Ok(default);
    }
    node.as_bool().ok_or_else(|| ParameterError::InvalidValue {
        field: field.to_string(),
        reason: format!("expected true or false, found {:?}", node),
    })
}

/// Row-major 4x4 transform given as 16 numbers. Identity when absent.
fn transform(parent: &Yaml, field: &str) -> Result<Transform, ParameterError> {
    let node = &parent[field];
    if node.is_badvalue() {
        return Ok(Transform::identity());
    }
    let values = node.as_vec().ok_or_else(|| ParameterError::InvalidValue {
        field: field.to_string(),
        reason: "expected a list of 16 numbers".to_string(),
    })?;
    if values.len() != 16 {
        return Err(ParameterError::InvalidLength { expected: 16, found: values.len() });
    }
    let mut numbers = Vec::with_capacity(16);
    for value in values {
        numbers.push(as_number(value).ok_or_else(|| ParameterError::InvalidValue {
            field: field.to_string(),
            reason: format!("not a number: {:?}", value),
        })?);
    }
    let t = Transform::from_row_slice(&numbers);
    if let Some(defect) = homogeneous_transform_defect(&t) {
        return Err(ParameterError::InvalidValue { field: field.to_string(), reason: defect });
    }
    Ok(orthonormalize(&t))
}

fn tripod(node: &Yaml) -> Result<TripodParameters, ParameterError> {
    let radius = number(node, "radius")?;
    let l_min = number(node, "l_min")?;
    let l_max = number(node, "l_max")?;
    let alpha_max = number(node, "alpha_max")?;
    if radius <= 0.0 {
        return Err(ParameterError::InvalidValue { field: "radius".to_string(), reason: "must be positive".to_string() });
    }
    if l_min > l_max {
        return Err(ParameterError::InvalidValue {
            field: "l_min".to_string(),
            reason: format!("{} exceeds l_max {}", l_min, l_max),
        });
    }
    Ok(TripodParameters::new(radius, l_min, l_max, alpha_max))
}

/// DH link with angles in degrees.
fn link(node: &Yaml) -> Result<DhLink, ParameterError> {
    let min = number(node, "min")?;
    let max = number(node, "max")?;
    if min > max {
        return Err(ParameterError::InvalidValue {
            field: "min".to_string(),
            reason: format!("{} exceeds max {}", min, max),
        });
    }
    Ok(DhLink::new(
        optional_number(node, "a", 0.0)?,
        optional_number(node, "d", 0.0)?,
        optional_number(node, "alpha", 0.0)?.to_radians(),
        optional_number(node, "offset", 0.0)?.to_radians(),
        min.to_radians(),
        max.to_radians(),
    ))
}

fn upper_arm(arm: &Yaml) -> Result<DhChain, ParameterError> {
    let chain = &arm["upper_arm"];
    if chain.is_badvalue() {
        let side = match arm["side"].as_str() {
            None | Some("right") => ArmSide::Right,
            Some("left") => ArmSide::Left,
            Some(other) => {
                return Err(ParameterError::InvalidValue {
                    field: "side".to_string(),
                    reason: format!("expected left or right, found {}", other),
                });
            }
        };
        return Ok(DhChain::upper_arm(side));
    }

    let links = section(chain, "links")?
        .as_vec()
        .ok_or_else(|| ParameterError::InvalidValue { field: "links".to_string(), reason: "expected a list".to_string() })?
        .iter()
        .map(link)
        .collect::<Result<Vec<_>, _>>()?;
    if links.is_empty() {
        return Err(ParameterError::InvalidLength { expected: 1, found: 0 });
    }
    Ok(DhChain::with_head_and_tail(links, transform(chain, "h0")?, transform(chain, "hn")?))
}

impl SolverParameters {
    /// Read solver parameters from the `solver` section of a YAML file:
    /// ```yaml
    /// solver:
    ///   full_pose: true
    ///   can_heave: false
    ///   differencing: central
    ///   tol: 1.0e-6
    ///   constr_tol: 1.0e-5
    ///   max_iter: 500
    ///   torso_heave: 0.1
    ///   lower_arm_heave: 0.01
    ///   weight_postural_torso: 0.0
    ///   weight_postural_upper_arm: 0.0
    /// ```
    /// Every field is optional and defaults to [`SolverParameters::default`].
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let doc = load_document(contents)?;
        let node = section(&doc, "solver")?;
        let defaults = SolverParameters::default();

        let differencing = match &node["differencing"] {
            Yaml::BadValue => defaults.differencing,
            value => {
                let name = value.as_str().unwrap_or_default();
                Differencing::from_name(name).ok_or_else(|| ParameterError::InvalidValue {
                    field: "differencing".to_string(),
                    reason: format!("expected forward or central, found {:?}", value),
                })?
            }
        };

        let max_iter = match &node["max_iter"] {
            Yaml::BadValue => defaults.max_iter,
            Yaml::Integer(i) if *i >= 0 => *i as usize,
            value => {
                return Err(ParameterError::InvalidValue {
                    field: "max_iter".to_string(),
                    reason: format!("expected a non-negative integer, found {:?}", value),
                });
            }
        };

        let parameters = SolverParameters {
            full_pose: optional_bool(node, "full_pose", defaults.full_pose)?,
            can_heave: optional_bool(node, "can_heave", defaults.can_heave)?,
            differencing,
            tol: optional_number(node, "tol", defaults.tol)?,
            constr_tol: optional_number(node, "constr_tol", defaults.constr_tol)?,
            max_iter,
            torso_heave: optional_number(node, "torso_heave", defaults.torso_heave)?,
            lower_arm_heave: optional_number(node, "lower_arm_heave", defaults.lower_arm_heave)?,
            weight_postural_torso: optional_number(node, "weight_postural_torso", defaults.weight_postural_torso)?,
            weight_postural_upper_arm: optional_number(
                node, "weight_postural_upper_arm", defaults.weight_postural_upper_arm)?,
        };

        for (field, value) in [("tol", parameters.tol), ("constr_tol", parameters.constr_tol)] {
            if value <= 0.0 {
                return Err(ParameterError::InvalidValue { field: field.to_string(), reason: "must be positive".to_string() });
            }
        }
        Ok(parameters)
    }
}

impl ArmParameters {
    /// Read the arm from the `arm` section of a YAML file:
    /// ```yaml
    /// arm:
    ///   torso: { radius: 0.09, l_min: 0.0, l_max: 0.17, alpha_max: 30.0 }
    ///   lower_arm: { radius: 0.018, l_min: 0.0, l_max: 0.03, alpha_max: 35.0 }
    ///   t0: [1, 0, 0, 0,  0, 1, 0, 0,  0, 0, 1, 0.5,  0, 0, 0, 1]
    ///   tn: [1, 0, 0, 0,  0, 1, 0, 0,  0, 0, 1, 0.06, 0, 0, 0, 1]
    ///   side: left
    /// ```
    /// Transforms are row-major and default to the identity. Without an `upper_arm`
    /// section, the reference chain of the given `side` (right by default) is used.
    /// An explicit chain lists DH links with angles in degrees:
    /// ```yaml
    ///   upper_arm:
    ///     h0: [1, 0, 0, 0,  0, 1, 0, 0,  0, 0, 1, 0.25,  0, 0, 0, 1]
    ///     links:
    ///       - { a: 0.0, d: 0.0, alpha: -90.0, offset: 0.0, min: -90.0, max: 30.0 }
    /// ```
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let doc = load_document(contents)?;
        let arm = section(&doc, "arm")?;
        Ok(ArmParameters {
            torso: tripod(section(arm, "torso")?)?,
            upper_arm: Arc::new(upper_arm(arm)?),
            lower_arm: tripod(section(arm, "lower_arm")?)?,
            t0: transform(arm, "t0")?,
            tn: transform(arm, "tn")?,
        })
    }
}
