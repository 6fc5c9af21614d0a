use std::collections::HashMap;

use serde_json::Value;

use crate::executor::ToolError;

#[derive(Debug, Clone)]
pub struct ToolDef {
    pub id: &'static str,
    pub description: &'static str,
    pub schema: schemars::Schema,
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    #[must_use]
    pub fn from_definitions(tools: Vec<ToolDef>) -> Self {
        Self { tools }
    }

    #[must_use]
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// Check `params` against the top-level object schema of tool `id`.
    ///
    /// Required properties must be present and non-null, present properties
    /// must match their declared JSON type, and undeclared keys are rejected
    /// when the schema sets `additionalProperties: false`.
    ///
    /// # Errors
    ///
    /// `ToolError::UnknownTool` if `id` is not registered,
    /// `ToolError::InvalidParams` describing the first violation otherwise.
    pub fn validate<S: std::hash::BuildHasher>(
        &self,
        id: &str,
        params: &HashMap<String, Value, S>,
    ) -> Result<(), ToolError> {
        let tool = self
            .find(id)
            .ok_or_else(|| ToolError::UnknownTool(id.to_owned()))?;
        let Some(schema) = tool.schema.as_object() else {
            return Ok(());
        };

        let empty = serde_json::Map::new();
        let props = match schema.get("properties") {
            Some(Value::Object(props)) => props,
            _ => &empty,
        };

        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        for name in required {
            if params.get(name).is_none_or(Value::is_null) {
                return Err(invalid(format!("missing required parameter `{name}`")));
            }
        }

        let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));
        for (name, value) in params {
            let Some(prop) = props.get(name) else {
                if closed {
                    return Err(invalid(format!("unknown parameter `{name}`")));
                }
                continue;
            };
            let allowed = allowed_types(prop);
            if !allowed.is_empty() && !allowed.iter().any(|ty| type_matches(ty, value)) {
                return Err(invalid(format!(
                    "parameter `{name}` must be {}",
                    allowed.join(" or ")
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> ToolError {
    ToolError::InvalidParams { message }
}

/// Declared JSON types of a property. Handles `"type": "T"`,
/// `"type": ["T", "null"]`, and `"anyOf": [{"type": ...}, ...]`.
fn allowed_types(prop: &Value) -> Vec<&str> {
    let Some(obj) = prop.as_object() else {
        return Vec::new();
    };
    match obj.get("type") {
        Some(Value::String(ty)) => vec![ty.as_str()],
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
        _ => obj
            .get("anyOf")
            .and_then(Value::as_array)
            .map(|variants| {
                variants
                    .iter()
                    .filter_map(|v| v.get("type")?.as_str())
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn type_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    #[allow(dead_code)]
    struct LookupParams {
        /// Employee ID
        employee_id: String,
        limit: Option<u32>,
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::from_definitions(vec![
            ToolDef {
                id: "lookup",
                description: "Look up an employee",
                schema: schemars::schema_for!(LookupParams),
            },
            ToolDef {
                id: "strict",
                description: "Closed schema",
                schema: schemars::json_schema!({
                    "type": "object",
                    "properties": { "flag": { "type": "boolean" } },
                    "additionalProperties": false
                }),
            },
        ])
    }

    fn params(v: Value) -> HashMap<String, Value> {
        v.as_object().unwrap().clone().into_iter().collect()
    }

    #[test]
    fn find_registered_tool() {
        let r = registry();
        assert_eq!(r.tools().len(), 2);
        assert_eq!(r.find("lookup").unwrap().description, "Look up an employee");
        assert!(r.find("missing").is_none());
    }

    #[test]
    fn valid_params_pass() {
        let r = registry();
        r.validate("lookup", &params(json!({"employeeId": "EMP001"})))
            .unwrap();
        r.validate("lookup", &params(json!({"employeeId": "EMP001", "limit": 3})))
            .unwrap();
        r.validate("lookup", &params(json!({"employeeId": "EMP001", "limit": null})))
            .unwrap();
    }

    #[test]
    fn missing_required_rejected() {
        let err = registry().validate("lookup", &params(json!({}))).unwrap_err();
        assert!(err.to_string().contains("employeeId"));
        let err = registry()
            .validate("lookup", &params(json!({"employeeId": null})))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams { .. }));
    }

    #[test]
    fn wrong_type_rejected() {
        let err = registry()
            .validate("lookup", &params(json!({"employeeId": 42})))
            .unwrap_err();
        assert!(err.to_string().contains("must be string"));
        assert!(
            registry()
                .validate("lookup", &params(json!({"employeeId": "E", "limit": "ten"})))
                .is_err()
        );
    }

    #[test]
    fn extra_keys_only_rejected_by_closed_schemas() {
        let r = registry();
        r.validate("lookup", &params(json!({"employeeId": "E", "note": "x"})))
            .unwrap();
        let err = r.validate("strict", &params(json!({"other": 1}))).unwrap_err();
        assert!(err.to_string().contains("unknown parameter"));
    }

    #[test]
    fn unknown_tool_rejected() {
        let err = registry().validate("nope", &HashMap::new()).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref id) if id == "nope"));
    }
}
