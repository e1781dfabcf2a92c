//! Argument checks against an operation's declared variables

use twinbase_core::model::{Element, ElementKind};
use twinbase_core::{Result, TwinError};

/// Check supplied inputs against the declared input variables
///
/// Every argument must name a declared variable and have its model type.
/// A property whose value type differs from the declared one is rebuilt
/// from the declaration with its value coerced into the declared type.
/// Declared inputs that were not supplied are not an error.
///
/// # Errors
/// * `ParameterNotFound` - If an argument names no declared input
/// * `ModelTypeMismatch` - If an argument's kind differs from its declaration
/// * `ValueCoercion` - If a property value does not fit the declared type
pub fn validate_input_arguments(declared: &[Element], arguments: &[Element]) -> Result<Vec<Element>> {
    arguments
        .iter()
        .map(|argument| {
            let name = argument.id_short().unwrap_or_default();
            let declaration = declared
                .iter()
                .find(|d| d.id_short() == Some(name))
                .ok_or_else(|| TwinError::ParameterNotFound {
                    parameter: name.to_string(),
                })?;
            conform(declaration, argument)
        })
        .collect()
}

fn conform(declaration: &Element, argument: &Element) -> Result<Element> {
    if declaration.model_type() != argument.model_type() {
        return Err(TwinError::ModelTypeMismatch {
            expected: declaration.model_type().to_string(),
            actual: argument.model_type().to_string(),
        });
    }

    match (&declaration.kind, &argument.kind) {
        (
            ElementKind::Property {
                value_type: declared_type,
                ..
            },
            ElementKind::Property {
                value_type, value, ..
            },
        ) if declared_type != value_type => {
            let mut rebuilt = declaration.skeleton();
            if let Some(value) = value {
                rebuilt.set_value(value.clone())?;
            }
            Ok(rebuilt)
        }
        _ => Ok(argument.clone()),
    }
}

/// Fresh output arguments: the declared outputs with values cleared
pub fn output_skeleton(declared_outputs: &[Element]) -> Vec<Element> {
    declared_outputs.iter().map(Element::skeleton).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use twinbase_core::model::{DataType, ModelType};

    fn declared() -> Vec<Element> {
        vec![Element::property("Count", DataType::Int, json!(null))]
    }

    #[test]
    fn test_matching_argument_passes_through() {
        let args = vec![Element::property("Count", DataType::Int, json!(4))];
        let checked = validate_input_arguments(&declared(), &args).unwrap();
        assert_eq!(checked, args);
    }

    #[test]
    fn test_mismatched_value_type_is_coerced() {
        let args = vec![Element::property("Count", DataType::String, json!("24"))];
        let checked = validate_input_arguments(&declared(), &args).unwrap();
        assert_eq!(checked[0].value(), Some(json!(24)));
        assert!(matches!(
            checked[0].kind,
            ElementKind::Property {
                value_type: DataType::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_uncoercible_value_rejected() {
        let args = vec![Element::property("Count", DataType::String, json!("many"))];
        assert!(matches!(
            validate_input_arguments(&declared(), &args),
            Err(TwinError::ValueCoercion { .. })
        ));
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let args = vec![Element::property("Other", DataType::Int, json!(1))];
        assert!(matches!(
            validate_input_arguments(&declared(), &args),
            Err(TwinError::ParameterNotFound { parameter }) if parameter == "Other"
        ));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let args = vec![Element::collection("Count")];
        assert!(matches!(
            validate_input_arguments(&declared(), &args),
            Err(TwinError::ModelTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_output_skeleton_clears_values() {
        let outputs = vec![
            Element::property("Result", DataType::Double, json!(1.5)),
            Element::list("Series", ModelType::Property),
        ];
        let skeleton = output_skeleton(&outputs);
        assert_eq!(skeleton.len(), 2);
        assert_eq!(skeleton[0].id_short(), Some("Result"));
        assert_eq!(skeleton[0].value(), None);
        assert_eq!(skeleton[1].model_type(), ModelType::SubmodelElementList);
    }
}
