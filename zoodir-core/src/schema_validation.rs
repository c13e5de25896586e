use serde_json::{json, Value};

/// Validate data against a JSON Schema.
/// Returns Ok(()) if valid, otherwise every violation with its location.
pub fn validate_against_schema(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let compiled = jsonschema::validator_for(schema)
        .map_err(|e| vec![format!("Schema compilation error: {}", e)])?;

    let errors: Vec<String> = compiled
        .iter_errors(data)
        .map(|error| {
            let path_str = error.instance_path.to_string();
            let location = if path_str.is_empty() {
                "root".to_string()
            } else {
                path_str
            };
            format!("{} at {}", error, location)
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// JSON Schema for a CMS `pettingZoo` document
pub fn petting_zoo_schema() -> Value {
    let price = json!({"type": "number", "minimum": 0});

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "pettingZoo",
        "type": "object",
        "required": ["name", "slug"],
        "properties": {
            "_id": {"type": "string"},
            "name": {"type": "string", "minLength": 1},
            "slug": {
                "type": "object",
                "required": ["current"],
                "properties": {
                    "current": {"type": "string", "minLength": 1}
                }
            },
            "description": {"type": "string"},
            "location": {
                "type": "object",
                "required": ["lat", "lng"],
                "properties": {
                    "lat": {"type": "number", "minimum": -90, "maximum": 90},
                    "lng": {"type": "number", "minimum": -180, "maximum": 180}
                }
            },
            "address": {"type": "string"},
            "phone": {"type": "string"},
            "website": {"type": "string"},
            "zooType": {"type": "string"},
            "operatingHours": {
                "type": "object",
                "additionalProperties": {"type": "string"}
            },
            "admissionPrice": {
                "type": "object",
                "properties": {
                    "adult": price,
                    "child": price,
                    "senior": price
                }
            },
            "mainImage": {"$ref": "#/definitions/image"},
            "images": {"type": "array", "items": {"$ref": "#/definitions/image"}},
            "animals": {"type": "array", "items": {"type": "object"}},
            "amenities": {"type": "array", "items": {"type": "object"}},
            "reviews": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["rating"],
                    "properties": {
                        "rating": {"type": "number", "minimum": 1, "maximum": 5},
                        "reviewText": {"type": "string", "minLength": 10, "maxLength": 1000},
                        "isApproved": {"type": "boolean"}
                    }
                }
            }
        },
        "definitions": {
            "image": {
                "type": "object",
                "required": ["asset"],
                "properties": {
                    "asset": {"type": "object"},
                    "alt": {"type": "string"}
                }
            }
        }
    })
}
