//! Validate tool call arguments against JSON Schema before execution.

/// Validate tool arguments against a JSON Schema.
///
/// Performs top-level validation: schema type check, required field presence,
/// property types, string enum membership and array length bounds. Returns
/// `Ok(())` when valid, `Err(message)` describing the first violation found.
pub fn validate_arguments(
    args: &serde_json::Value,
    schema: &serde_json::Value,
) -> Result<(), String> {
    if let Some(schema_type) = schema.get("type").and_then(|v| v.as_str()) {
        if schema_type == "object" && !args.is_object() {
            return Err(format!(
                "expected object arguments, got {}",
                json_type_name(args)
            ));
        }
    }

    if let (Some(required), Some(obj)) = (
        schema.get("required").and_then(|v| v.as_array()),
        args.as_object(),
    ) {
        for field in required {
            if let Some(name) = field.as_str() {
                if obj.get(name).map_or(true, |v| v.is_null()) {
                    return Err(format!("missing required field '{name}'"));
                }
            }
        }
    }

    if let (Some(properties), Some(obj)) = (
        schema.get("properties").and_then(|v| v.as_object()),
        args.as_object(),
    ) {
        for (key, value) in obj {
            if value.is_null() {
                continue;
            }
            if let Some(prop_schema) = properties.get(key) {
                validate_property(key, value, prop_schema)?;
            }
        }
    }

    Ok(())
}

fn validate_property(
    key: &str,
    value: &serde_json::Value,
    prop_schema: &serde_json::Value,
) -> Result<(), String> {
    if let Some(expected_type) = prop_schema.get("type").and_then(|v| v.as_str()) {
        if !value_matches_type(value, expected_type) {
            return Err(format!(
                "field '{}' expected type '{}', got {}",
                key,
                expected_type,
                json_type_name(value)
            ));
        }
    }

    if let Some(allowed) = prop_schema.get("enum").and_then(|v| v.as_array()) {
        if !allowed.contains(value) {
            let options = allowed
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(format!("field '{key}' must be one of: {options}"));
        }
    }

    if let Some(items) = value.as_array() {
        let min = prop_schema.get("minItems").and_then(|v| v.as_u64());
        let max = prop_schema.get("maxItems").and_then(|v| v.as_u64());
        let len = items.len() as u64;
        if min.is_some_and(|min| len < min) || max.is_some_and(|max| len > max) {
            return Err(format!("field '{key}' has {len} items, outside the allowed range"));
        }
        if let Some(item_type) = prop_schema
            .get("items")
            .and_then(|i| i.get("type"))
            .and_then(|t| t.as_str())
        {
            if let Some(bad) = items.iter().find(|item| !value_matches_type(item, item_type)) {
                return Err(format!(
                    "field '{}' items expected type '{}', got {}",
                    key,
                    item_type,
                    json_type_name(bad)
                ));
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
