//! Skill parameter signatures.
//!
//! Skills describe their input with a JSON Schema object. Only a flat set of
//! named `string` / `integer` properties is meaningful to agentmesh: a
//! property typed `"integer"` becomes an integer argument, anything else a
//! string argument. [`SkillSignature`] interprets the schema once and then
//! validates the LLM's arguments before each dispatch.

use agentmesh_core::error::ToolError;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Integer,
}

impl ArgKind {
    fn schema_type(self) -> &'static str {
        match self {
            ArgKind::String => "string",
            ArgKind::Integer => "integer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
    pub required: bool,
    pub description: Option<String>,
}

/// A validated argument value, serialized as a bare JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    String(String),
    Integer(i64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillSignature {
    args: Vec<ArgSpec>,
}

impl SkillSignature {
    /// Interpret a skill's `parameters` schema.
    ///
    /// Unknown shapes degrade gracefully: a schema without `properties`
    /// yields an empty signature, and `required` names that are not declared
    /// properties are ignored.
    pub fn from_parameters(parameters: &serde_json::Value) -> Self {
        let required: Vec<&str> = parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default();

        let args = parameters
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| ArgSpec {
                        name: name.clone(),
                        kind: match prop.get("type").and_then(|t| t.as_str()) {
                            Some("integer") => ArgKind::Integer,
                            _ => ArgKind::String,
                        },
                        required: required.contains(&name.as_str()),
                        description: prop
                            .get("description")
                            .and_then(|d| d.as_str())
                            .map(String::from),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { args }
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// The normalized JSON Schema advertised to the LLM.
    pub fn to_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for arg in &self.args {
            let mut prop = serde_json::json!({ "type": arg.kind.schema_type() });
            if let Some(description) = &arg.description {
                prop["description"] = serde_json::json!(description);
            }
            properties.insert(arg.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check and coerce the LLM's arguments.
    ///
    /// Undeclared arguments are dropped. A non-object input is treated as
    /// an empty argument set.
    pub fn validate(
        &self,
        arguments: &serde_json::Value,
    ) -> Result<BTreeMap<String, ArgValue>, ToolError> {
        let empty = serde_json::Map::new();
        let given = arguments.as_object().unwrap_or(&empty);
        let mut out = BTreeMap::new();

        for arg in &self.args {
            let value = match given.get(&arg.name) {
                None | Some(serde_json::Value::Null) => {
                    if arg.required {
                        return Err(ToolError::InvalidArguments(format!(
                            "missing required argument '{}'",
                            arg.name
                        )));
                    }
                    continue;
                }
                Some(v) => v,
            };

            let coerced = match arg.kind {
                ArgKind::String => coerce_string(value),
                ArgKind::Integer => coerce_integer(value),
            }
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!(
                    "argument '{}' must be {}, got {value}",
                    arg.name,
                    arg.kind.schema_type()
                ))
            })?;

            out.insert(arg.name.clone(), coerced);
        }

        Ok(out)
    }
}

fn coerce_string(value: &serde_json::Value) -> Option<ArgValue> {
    match value {
        serde_json::Value::String(s) => Some(ArgValue::String(s.clone())),
        serde_json::Value::Number(n) => Some(ArgValue::String(n.to_string())),
        serde_json::Value::Bool(b) => Some(ArgValue::String(b.to_string())),
        _ => None,
    }
}

fn coerce_integer(value: &serde_json::Value) -> Option<ArgValue> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(whole_number))
            .map(ArgValue::Integer),
        serde_json::Value::String(s) => s.trim().parse().ok().map(ArgValue::Integer),
        _ => None,
    }
}

/// `3.0` is an integer; `3.5` is not.
fn whole_number(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn risk_signature() -> SkillSignature {
        SkillSignature::from_parameters(&json!({
            "type": "object",
            "properties": {
                "supplier_name": { "type": "string", "description": "Supplier to assess" },
                "country": { "type": "string" },
                "horizon_days": { "type": "integer" }
            },
            "required": ["supplier_name", "country"]
        }))
    }

    #[test]
    fn interprets_types_and_required() {
        let sig = risk_signature();
        let horizon = sig.args().iter().find(|a| a.name == "horizon_days").unwrap();
        assert_eq!(horizon.kind, ArgKind::Integer);
        assert!(!horizon.required);
        let supplier = sig.args().iter().find(|a| a.name == "supplier_name").unwrap();
        assert!(supplier.required);
        assert_eq!(supplier.description.as_deref(), Some("Supplier to assess"));
    }

    #[test]
    fn unknown_types_become_strings() {
        let sig = SkillSignature::from_parameters(&json!({
            "type": "object",
            "properties": { "qty": { "type": "number" }, "tags": { "type": "array" } }
        }));
        assert!(sig.args().iter().all(|a| a.kind == ArgKind::String));
    }

    #[test]
    fn missing_properties_is_empty_signature() {
        let sig = SkillSignature::from_parameters(&json!({ "type": "object" }));
        assert!(sig.args().is_empty());
        assert!(sig.validate(&json!({"anything": 1})).unwrap().is_empty());
    }

    #[test]
    fn missing_required_argument_fails() {
        let err = risk_signature()
            .validate(&json!({ "supplier_name": "Acme" }))
            .unwrap_err();
        assert!(err.to_string().contains("missing required argument 'country'"));
    }

    #[test]
    fn null_required_argument_fails() {
        assert!(risk_signature()
            .validate(&json!({ "supplier_name": "Acme", "country": null }))
            .is_err());
    }

    #[test]
    fn coerces_and_drops_extras() {
        let args = risk_signature()
            .validate(&json!({
                "supplier_name": "Acme",
                "country": 49,
                "horizon_days": "30",
                "verbose": true
            }))
            .unwrap();
        assert_eq!(args["country"], ArgValue::String("49".into()));
        assert_eq!(args["horizon_days"], ArgValue::Integer(30));
        assert!(!args.contains_key("verbose"));
    }

    #[test]
    fn non_numeric_integer_rejected() {
        let err = risk_signature()
            .validate(&json!({ "supplier_name": "Acme", "country": "DE", "horizon_days": "soon" }))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn whole_floats_are_integers() {
        let args = risk_signature()
            .validate(&json!({ "supplier_name": "Acme", "country": "DE", "horizon_days": 30.0 }))
            .unwrap();
        assert_eq!(args["horizon_days"], ArgValue::Integer(30));

        let err = risk_signature()
            .validate(&json!({ "supplier_name": "Acme", "country": "DE", "horizon_days": 30.5 }))
            .unwrap_err();
        assert!(err.to_string().contains("'horizon_days' must be integer"));
    }

    #[test]
    fn object_for_string_rejected() {
        assert!(risk_signature()
            .validate(&json!({ "supplier_name": {"n": 1}, "country": "DE" }))
            .is_err());
    }

    #[test]
    fn validated_args_serialize_as_plain_json() {
        let args = risk_signature()
            .validate(&json!({ "supplier_name": "Acme", "country": "DE", "horizon_days": 7 }))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({ "supplier_name": "Acme", "country": "DE", "horizon_days": 7 })
        );
    }

    #[test]
    fn normalized_schema() {
        let schema = risk_signature().to_schema();
        assert_eq!(schema["properties"]["horizon_days"]["type"], "integer");
        assert_eq!(schema["properties"]["supplier_name"]["description"], "Supplier to assess");
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
    }
}
