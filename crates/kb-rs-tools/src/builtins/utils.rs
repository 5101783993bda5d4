//! Utility helpers shared by built-in tools.

use crate::ToolError;
use kb_rs_memory::MemoryType;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse JSON args into a typed struct for tool calls.
pub(super) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

/// Reject empty or whitespace-only string arguments.
pub(super) fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::InvalidArguments(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(value)
}

/// Parse an optional memory type used as a filter or explicit assignment.
///
/// An empty string means no type. Unknown names are rejected.
pub(super) fn parse_memory_type(value: Option<&str>) -> Result<Option<MemoryType>, ToolError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name
            .parse::<MemoryType>()
            .map(Some)
            .map_err(|err| ToolError::InvalidArguments(err.to_string())),
    }
}

/// JSON schema fragment listing the memory type names.
pub(super) fn memory_type_schema(description: &str) -> Value {
    let names: Vec<&str> = MemoryType::ALL.iter().map(|kind| kind.as_str()).collect();
    serde_json::json!({
        "type": "string",
        "enum": names,
        "description": description,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_memory_type, require_text};
    use crate::ToolError;
    use kb_rs_memory::MemoryType;
    use pretty_assertions::assert_eq;

    #[test]
    fn memory_type_parsing() {
        assert_eq!(parse_memory_type(None).expect("none"), None);
        assert_eq!(parse_memory_type(Some(" ")).expect("blank"), None);
        assert_eq!(
            parse_memory_type(Some("general")).expect("general"),
            Some(MemoryType::General)
        );
        assert!(matches!(
            parse_memory_type(Some("snippets")),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("memory_id", "  ").is_err());
        assert_eq!(require_text("memory_id", "abc").expect("text"), "abc");
    }
}
