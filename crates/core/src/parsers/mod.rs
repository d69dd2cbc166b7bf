pub mod jprofiler;
pub mod json;

use crate::model::CallTree;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("jprofiler: {0}")]
    JProfiler(#[from] jprofiler::XmlParseError),
    #[error("json: {0}")]
    Json(#[from] json::JsonParseError),
}

/// Auto-detect the call-tree format and parse it.
///
/// Input opening with `{` is the serde form of [`CallTree`]; anything else
/// is handed to the JProfiler XML reader.
pub fn parse_auto(data: &[u8]) -> Result<CallTree, ParseError> {
    let first = data.iter().find(|b| !b.is_ascii_whitespace());

    // JSON: no XML export starts with a brace, so JSON errors are reported as such.
    if first == Some(&b'{') {
        return Ok(json::parse_json(data)?);
    }

    // JProfiler XML: `<?xml ...?>` prolog or a bare `<tree>` element.
    Ok(jprofiler::parse_jprofiler_xml(data)?)
}
