use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::error::AiError;

/// Types Claude can be asked to return as a forced tool call.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Tool `input_schema` for this type. Nested types are inlined by schemars
    /// since Claude does not follow `#/definitions/...` references.
    fn tool_schema() -> serde_json::Value {
        let root = SchemaSettings::draft07()
            .with(|settings| {
                settings.inline_subschemas = true;
                settings.meta_schema = None;
            })
            .into_generator()
            .into_root_schema_for::<Self>();

        let mut value = serde_json::to_value(root).unwrap_or_default();
        if let serde_json::Value::Object(map) = &mut value {
            map.remove("title");
            let no_definitions = map
                .get("definitions")
                .and_then(|d| d.as_object())
                .is_some_and(|d| d.is_empty());
            if no_definitions {
                map.remove("definitions");
            }
        }
        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Deserialize a tool call's `input` into the requested type.
pub(crate) fn parse_tool_input<T: StructuredOutput>(input: &serde_json::Value) -> Result<T, AiError> {
    Ok(T::deserialize(input)?)
}
