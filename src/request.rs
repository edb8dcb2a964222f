//! Host request model and the request translator.
//!
//! Converts the host's completion request (1-based cursor, per-file
//! buffer map) into the wire shape racerd expects (0-based column,
//! buffer list). The translation is a pure transform with no validation
//! of line or column bounds; racerd reports out-of-range positions
//! itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Full in-memory contents of one open buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    /// The buffer contents, verbatim.
    pub contents: String,
}

/// A completion or navigation request as the host sends it.
///
/// Line and column are 1-based. `file_data` carries every currently
/// open buffer keyed by path; keys are unique and order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Path of the file the cursor is in.
    pub filepath: String,

    /// Contents of every open buffer, keyed by path.
    #[serde(default)]
    pub file_data: BTreeMap<String, FileData>,

    /// 1-based line number of the cursor.
    pub line_num: u32,

    /// 1-based column number of the cursor.
    pub column_num: u32,
}

impl CompletionRequest {
    /// Returns true for the empty request used as a liveness ping.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filepath.is_empty() && self.file_data.is_empty()
    }
}

/// One buffer record on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffer {
    /// Path of the buffer.
    pub file_path: String,

    /// The buffer contents, verbatim.
    pub contents: String,
}

/// The request shape racerd expects.
///
/// Line stays 1-based; column is 0-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RacerdRequest {
    /// All open buffers.
    pub buffers: Vec<Buffer>,

    /// 1-based line number.
    pub line: u32,

    /// 0-based column number.
    pub column: u32,

    /// Path of the file the cursor is in.
    pub file_path: String,
}

/// Translates a host request into racerd's wire shape.
///
/// An empty request translates to an empty wire request. Note the empty
/// shape never reaches the wire: liveness pings post their own
/// `{"ping": true}` body, so the all-default struct serializing with
/// explicit empty fields (rather than as `{}`) is not observable by
/// racerd. Otherwise every open buffer is copied verbatim, the column
/// is converted from 1-based to 0-based, and line and file path pass
/// through unchanged.
#[must_use]
pub fn translate(request: &CompletionRequest) -> RacerdRequest {
    if request.is_empty() {
        return RacerdRequest::default();
    }

    let buffers = request
        .file_data
        .iter()
        .map(|(path, data)| Buffer {
            file_path: path.clone(),
            contents: data.contents.clone(),
        })
        .collect();

    RacerdRequest {
        buffers,
        line: request.line_num,
        column: request.column_num.saturating_sub(1),
        file_path: request.filepath.clone(),
    }
}
