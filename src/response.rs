//! Racerd response records and the response mapper.
//!
//! Maps racerd's completion and definition JSON into the host's
//! candidate and go-to-location records. The mapper is a pure transform;
//! a 204 "no content" response maps to an empty candidate list, never an
//! absent one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Raw completion record as racerd returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RacerdCompletion {
    /// Insertion text.
    #[serde(default)]
    pub text: String,

    /// Kind tag (e.g. "Function", "Struct").
    #[serde(default)]
    pub kind: String,

    /// Context string shown in the completion menu.
    #[serde(default)]
    pub context: String,

    /// Path of the defining file, when known.
    #[serde(default)]
    pub file_path: String,

    /// 1-based line of the definition, 0 when unknown.
    #[serde(default)]
    pub line: u32,

    /// 0-based column of the definition, 0 when unknown.
    #[serde(default)]
    pub column: u32,
}

/// Raw definition record as racerd returns it. Column is 0-based.
#[derive(Debug, Clone, Deserialize)]
pub struct RacerdDefinition {
    /// Path of the defining file.
    pub file_path: String,

    /// 1-based line of the definition.
    pub line: u32,

    /// 0-based column of the definition.
    pub column: u32,
}

/// Optional source location attached to a candidate.
///
/// Each sub-field is populated independently, and only when the
/// corresponding racerd field is a non-empty string or non-zero number.
/// A legitimately-zero line or column therefore reads as absent; this
/// mirrors the wire behavior hosts already depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Path of the defining file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,

    /// 1-based line number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_num: Option<u32>,

    /// 1-based column number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_num: Option<u32>,
}

impl Location {
    /// Returns true when no sub-field is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filepath.is_none() && self.line_num.is_none() && self.column_num.is_none()
    }
}

/// A normalized completion candidate for the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// The text to insert when accepting this candidate.
    pub insertion_text: String,

    /// Kind tag, copied verbatim from racerd.
    pub kind: String,

    /// Context string shown next to the candidate.
    pub extra_menu_info: String,

    /// Source location, attached only when racerd reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// A resolved go-to-definition location for the host. 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoToLocation {
    /// Path of the defining file.
    pub filepath: String,

    /// 1-based line number.
    pub line_num: u32,

    /// 1-based column number.
    pub column_num: u32,
}

/// Maps a raw `/list_completions` response into host candidates.
///
/// `None` (the 204 case) maps to an empty list. Text, kind, and context
/// are copied verbatim; the location is attached per the truthiness
/// rules on [`Location`].
pub fn to_candidates(raw: Option<Value>) -> Result<Vec<Candidate>> {
    let Some(value) = raw else {
        return Ok(Vec::new());
    };

    let completions: Vec<RacerdCompletion> = serde_json::from_value(value)?;
    Ok(completions.iter().map(to_candidate).collect())
}

/// Maps one raw completion record into a host candidate.
#[must_use]
pub fn to_candidate(completion: &RacerdCompletion) -> Candidate {
    Candidate {
        insertion_text: completion.text.clone(),
        kind: completion.kind.clone(),
        extra_menu_info: completion.context.clone(),
        location: location_of(completion),
    }
}

/// Builds the optional location for a completion record.
///
/// The racerd wire format has no presence flags, so each sub-field is
/// gated on its own value being truthy. Column is converted from
/// 0-based to 1-based when attached.
fn location_of(completion: &RacerdCompletion) -> Option<Location> {
    let mut location = Location::default();

    if !completion.file_path.is_empty() {
        location.filepath = Some(completion.file_path.clone());
    }
    if completion.line != 0 {
        location.line_num = Some(completion.line);
    }
    if completion.column != 0 {
        location.column_num = Some(completion.column + 1);
    }

    if location.is_empty() { None } else { Some(location) }
}

/// Maps a raw `/find_definition` response into a host location.
///
/// Converts the 0-based column to 1-based. Any failure is wrapped in
/// [`Error::Navigation`]; the cause stays on the source chain and the
/// display string is the single user-facing message.
pub fn to_definition(raw: Value) -> Result<GoToLocation> {
    let definition: RacerdDefinition =
        serde_json::from_value(raw).map_err(|e| Error::from(e).into_navigation())?;

    Ok(GoToLocation {
        filepath: definition.file_path,
        line_num: definition.line,
        column_num: definition.column + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_no_content_maps_to_empty_list() {
        let candidates = to_candidates(None).expect("map");
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_candidate_fields_copied_verbatim() {
        let raw = json!([{
            "text": "push",
            "kind": "Function",
            "context": "fn push(&mut self, value: T)",
            "file_path": "vec.rs",
            "line": 10,
            "column": 7
        }]);
        let candidates = to_candidates(Some(raw)).expect("map");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].insertion_text, "push");
        assert_eq!(candidates[0].kind, "Function");
        assert_eq!(candidates[0].extra_menu_info, "fn push(&mut self, value: T)");
        assert_eq!(
            candidates[0].location,
            Some(Location {
                filepath: Some("vec.rs".to_string()),
                line_num: Some(10),
                column_num: Some(8),
            })
        );
    }

    #[test]
    fn test_mapping_is_a_fixed_point_for_display_fields() {
        let completion = RacerdCompletion {
            text: "iter".to_string(),
            kind: "Method".to_string(),
            context: "fn iter(&self)".to_string(),
            ..RacerdCompletion::default()
        };
        let first = to_candidate(&completion);
        let again = to_candidate(&RacerdCompletion {
            text: first.insertion_text.clone(),
            kind: first.kind.clone(),
            context: first.extra_menu_info.clone(),
            ..RacerdCompletion::default()
        });
        assert_eq!(first, again);
    }

    #[test]
    fn test_location_absent_when_all_fields_falsy() {
        let raw = json!([{
            "text": "x",
            "kind": "Variable",
            "context": "",
            "file_path": "",
            "line": 0,
            "column": 0
        }]);
        let candidates = to_candidates(Some(raw)).expect("map");
        assert_eq!(candidates[0].location, None);
    }

    #[test]
    fn test_zero_line_is_dropped_independently() {
        let raw = json!([{
            "text": "x",
            "kind": "Variable",
            "context": "",
            "file_path": "lib.rs",
            "line": 0,
            "column": 4
        }]);
        let candidates = to_candidates(Some(raw)).expect("map");
        let location = candidates[0].location.clone().expect("location");
        assert_eq!(location.filepath, Some("lib.rs".to_string()));
        assert_eq!(location.line_num, None);
        assert_eq!(location.column_num, Some(5));
    }

    #[test]
    fn test_zero_column_is_dropped_independently() {
        let raw = json!([{
            "text": "x",
            "kind": "Variable",
            "context": "",
            "file_path": "lib.rs",
            "line": 3,
            "column": 0
        }]);
        let candidates = to_candidates(Some(raw)).expect("map");
        let location = candidates[0].location.clone().expect("location");
        assert_eq!(location.line_num, Some(3));
        assert_eq!(location.column_num, None);
    }

    #[test]
    fn test_definition_converts_column_to_one_based() {
        let raw = json!({"file_path": "b.rs", "line": 10, "column": 3});
        let location = to_definition(raw).expect("map");
        assert_eq!(
            location,
            GoToLocation {
                filepath: "b.rs".to_string(),
                line_num: 10,
                column_num: 4,
            }
        );
    }

    #[test]
    fn test_definition_failure_is_navigation_error() {
        let error = to_definition(Value::Null).expect_err("null has no definition");
        assert_eq!(error.to_string(), "Can't jump to definition.");
        assert!(std::error::Error::source(&error).is_some());
    }

    proptest! {
        #[test]
        fn prop_definition_column_is_incremented(line in 1u32..1_000_000, column in 0u32..1_000_000) {
            let raw = json!({"file_path": "b.rs", "line": line, "column": column});
            let location = to_definition(raw).expect("map");
            prop_assert_eq!(location.line_num, line);
            prop_assert_eq!(location.column_num, column + 1);
        }
    }
}
