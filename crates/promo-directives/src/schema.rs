//! Config schema validation

use crate::config::Config;
use crate::error::ValidationError;
use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;

const HELM_UPDATE_IMAGE_SCHEMA: &str = include_str!("../schemas/helm-update-image-config.json");

static HELM_UPDATE_IMAGE_VALIDATOR: Lazy<Result<JSONSchema, String>> =
    Lazy::new(|| compile(HELM_UPDATE_IMAGE_SCHEMA));

fn compile(source: &str) -> Result<JSONSchema, String> {
    let schema: Value = serde_json::from_str(source).map_err(|e| e.to_string())?;
    JSONSchema::compile(&schema).map_err(|e| e.to_string())
}

/// Validate raw helm-update-image config
///
/// # Errors
/// Returns every violation found, not only the first
pub fn validate_config(step: &str, config: &Config) -> Result<(), ValidationError> {
    let schema = HELM_UPDATE_IMAGE_VALIDATOR
        .as_ref()
        .map_err(|e| ValidationError::new(step, vec![format!("(root): invalid schema: {e}")]))?;

    let instance = Value::Object(config.clone());
    let problems: Vec<String> = match schema.validate(&instance) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|e| format!("{}: {}", location(&e.instance_path.to_string()), message(&e)))
            .collect(),
    };
    Err(ValidationError::new(step, problems))
}

/// `/images/0/key` becomes `images.0.key`; the document itself is `(root)`
fn location(pointer: &str) -> String {
    let dotted = pointer.trim_start_matches('/').replace('/', ".");
    if dotted.is_empty() {
        "(root)".to_string()
    } else {
        dotted
    }
}

fn message(error: &jsonschema::ValidationError<'_>) -> String {
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            format!("{} is required", property.as_str().unwrap_or_default())
        }
        ValidationErrorKind::MinLength { limit } => {
            format!("String length must be greater than or equal to {limit}")
        }
        ValidationErrorKind::MinItems { limit } => {
            format!("Array must have at least {limit} items")
        }
        ValidationErrorKind::OneOfNotValid | ValidationErrorKind::OneOfMultipleValid => {
            "Must validate one and only one schema".to_string()
        }
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STEP: &str = "helm-update-image";

    fn problems(value: Value) -> Vec<String> {
        let Value::Object(config) = value else {
            panic!("config must be an object");
        };
        match validate_config(STEP, &config) {
            Ok(()) => Vec::new(),
            Err(e) => e.problems,
        }
    }

    fn assert_reports(value: Value, expected: &[&str]) {
        let found = problems(value);
        for problem in expected {
            assert!(
                found.iter().any(|p| p == problem),
                "missing {problem:?} in {found:?}"
            );
        }
    }

    #[test]
    fn schema_compiles() {
        assert!(HELM_UPDATE_IMAGE_VALIDATOR.is_ok());
    }

    #[test]
    fn path_and_images_required() {
        assert_reports(
            json!({}),
            &["(root): path is required", "(root): images is required"],
        );
    }

    #[test]
    fn path_empty() {
        assert_reports(
            json!({"path": ""}),
            &["path: String length must be greater than or equal to 1"],
        );
    }

    #[test]
    fn images_empty() {
        assert_reports(
            json!({"images": []}),
            &["images: Array must have at least 1 items"],
        );
    }

    #[test]
    fn entry_key_and_value_required() {
        assert_reports(
            json!({"images": [{}]}),
            &["images.0: key is required", "images.0: value is required"],
        );
    }

    #[test]
    fn entry_key_empty() {
        assert_reports(
            json!({"images": [{"key": ""}]}),
            &["images.0.key: String length must be greater than or equal to 1"],
        );
    }

    #[test]
    fn image_with_literal_value_is_rejected() {
        assert_reports(
            json!({"images": [{"image": "fake-image", "key": "fake-key", "value": "fake-value"}]}),
            &["images.0: Must validate one and only one schema"],
        );
    }

    #[test]
    fn kitchen_sink_is_valid() {
        let found = problems(json!({
            "path": "fake-path",
            "images": [
                {"image": "fake-image", "key": "fake-key-0", "value": "ImageAndTag"},
                {
                    "image": "fake-image",
                    "key": "fake-key-1",
                    "value": "ImageAndTag",
                    "fromOrigin": {"kind": "Warehouse", "name": "fake-name"}
                },
                {"key": "fake-key-2", "value": "fake-value"},
                {"image": "", "key": "fake-key-3", "value": "fake-value"}
            ]
        }));
        assert!(found.is_empty(), "unexpected problems: {found:?}");
    }

    #[test]
    fn location_formatting() {
        assert_eq!(location(""), "(root)");
        assert_eq!(location("/images/0/key"), "images.0.key");
    }
}
