//! Box array persistence
//!
//! Two on-disk formats are supported:
//!
//! - a JSON document, `{"version": 1, "boxes": [{"x","y","w","h"} | null, ...]}`
//! - the plain-text `.ba` box array format:
//!
//! ```text
//!
//! Boxa Version 2
//! Number of boxes = 2
//!   Box[0]: x = 10, y = 20, w = 30, h = 40
//!   Box[1]: x = 0, y = 0, w = 0, h = 0
//! ```
//!
//! The text format has no notion of a missing slot: a zero-size box reads as
//! missing and a missing slot is written as a zero-size box.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::boxa::{BoundingBox, BoxArray, BoxSlot};

/// Current JSON document version
pub const JSON_FORMAT_VERSION: u32 = 1;

/// Text format version written by `to_bytes`
pub const TEXT_FORMAT_VERSION: u32 = 2;

const TEXT_HEADER: &str = "Boxa Version";
const TEXT_COUNT: &str = "Number of boxes =";

/// Error type for box array persistence
#[derive(Debug, Error)]
pub enum BoxIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),
}

pub type Result<T> = std::result::Result<T, BoxIoError>;

/// Serialized box array format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxFormat {
    Json,
    Text,
}

impl BoxFormat {
    /// `.json` files are JSON, everything else is the text format
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => BoxFormat::Json,
            _ => BoxFormat::Text,
        }
    }

    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            BoxFormat::Json => "json",
            BoxFormat::Text => "ba",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BoxArrayDocument {
    version: u32,
    boxes: Vec<Option<BoundingBox>>,
}

/// Serialize a box array
pub fn to_bytes(boxes: &BoxArray, format: BoxFormat) -> Result<Vec<u8>> {
    match format {
        BoxFormat::Json => {
            let doc = BoxArrayDocument {
                version: JSON_FORMAT_VERSION,
                boxes: boxes.slots().iter().map(|s| s.as_box().copied()).collect(),
            };
            Ok(serde_json::to_vec_pretty(&doc)?)
        }
        BoxFormat::Text => Ok(write_text(boxes).into_bytes()),
    }
}

/// Deserialize a box array
pub fn from_bytes(bytes: &[u8], format: BoxFormat) -> Result<BoxArray> {
    match format {
        BoxFormat::Json => {
            let doc: BoxArrayDocument = serde_json::from_slice(bytes)?;
            if doc.version != JSON_FORMAT_VERSION {
                return Err(BoxIoError::UnsupportedVersion(doc.version));
            }
            Ok(doc.boxes.into_iter().map(BoxSlot::from).collect())
        }
        BoxFormat::Text => {
            let text = std::str::from_utf8(bytes).map_err(|e| BoxIoError::Parse {
                line: 0,
                message: format!("not UTF-8: {}", e),
            })?;
            parse_text(text)
        }
    }
}

/// Read a box array, picking the format from the extension
pub fn read_boxa(path: &Path) -> Result<BoxArray> {
    let bytes = std::fs::read(path)?;
    from_bytes(&bytes, BoxFormat::from_path(path))
}

/// Write a box array, picking the format from the extension
pub fn write_boxa(path: &Path, boxes: &BoxArray) -> Result<()> {
    let bytes = to_bytes(boxes, BoxFormat::from_path(path))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn write_text(boxes: &BoxArray) -> String {
    let mut out = format!(
        "\n{} {}\n{} {}\n",
        TEXT_HEADER,
        TEXT_FORMAT_VERSION,
        TEXT_COUNT,
        boxes.len()
    );
    for (i, slot) in boxes.slots().iter().enumerate() {
        let b = slot.as_box().copied().unwrap_or_default();
        out.push_str(&format!(
            "  Box[{}]: x = {}, y = {}, w = {}, h = {}\n",
            i,
            b.x(),
            b.y(),
            b.width(),
            b.height()
        ));
    }
    out
}

fn parse_text(text: &str) -> Result<BoxArray> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (line, header) = lines.next().ok_or(BoxIoError::Parse {
        line: 0,
        message: "empty input".to_string(),
    })?;
    let version: u32 = header
        .strip_prefix(TEXT_HEADER)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| parse_error(line, "expected 'Boxa Version <n>'"))?;
    if version != TEXT_FORMAT_VERSION {
        return Err(BoxIoError::UnsupportedVersion(version));
    }

    let (line, count_line) = lines
        .next()
        .ok_or_else(|| parse_error(line, "missing box count"))?;
    let count: usize = count_line
        .strip_prefix(TEXT_COUNT)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| parse_error(line, "expected 'Number of boxes = <n>'"))?;

    let mut last_line = line;
    let mut slots = Vec::with_capacity(count);
    for expected in 0..count {
        let (line, entry) = lines.next().ok_or_else(|| {
            parse_error(
                last_line + 1,
                &format!("expected {} boxes, found {}", count, expected),
            )
        })?;
        last_line = line;
        let b = parse_box_line(entry, expected).map_err(|m| parse_error(line, &m))?;
        slots.push(if b.width() == 0 || b.height() == 0 {
            BoxSlot::Missing
        } else {
            BoxSlot::valid(b)
        });
    }

    if let Some((line, _)) = lines.next() {
        return Err(parse_error(line, "trailing content after last box"));
    }

    Ok(BoxArray::new(slots))
}

/// Parse `Box[i]: x = X, y = Y, w = W, h = H`
fn parse_box_line(entry: &str, expected: usize) -> std::result::Result<BoundingBox, String> {
    let rest = entry
        .strip_prefix("Box[")
        .ok_or_else(|| "expected 'Box[<i>]:'".to_string())?;
    let (index, fields) = rest
        .split_once("]:")
        .ok_or_else(|| "expected 'Box[<i>]:'".to_string())?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| format!("bad box index '{}'", index))?;
    if index != expected {
        return Err(format!("expected box index {}, found {}", expected, index));
    }

    let mut values = [None::<i64>; 4];
    for field in fields.split(',') {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| format!("bad field '{}'", field.trim()))?;
        let slot = match key.trim() {
            "x" => 0,
            "y" => 1,
            "w" => 2,
            "h" => 3,
            other => return Err(format!("unknown field '{}'", other)),
        };
        values[slot] = Some(
            value
                .trim()
                .parse()
                .map_err(|_| format!("bad value '{}'", value.trim()))?,
        );
    }

    let get = |i: usize, name: &str| values[i].ok_or_else(|| format!("missing field '{}'", name));
    let (x, y, w, h) = (get(0, "x")?, get(1, "y")?, get(2, "w")?, get(3, "h")?);

    let x = i32::try_from(x).map_err(|_| format!("x out of range: {}", x))?;
    let y = i32::try_from(y).map_err(|_| format!("y out of range: {}", y))?;
    let w = u32::try_from(w).map_err(|_| format!("w must be non-negative: {}", w))?;
    let h = u32::try_from(h).map_err(|_| format!("h must be non-negative: {}", h))?;
    Ok(BoundingBox::new(x, y, w, h))
}

fn parse_error(line: usize, message: &str) -> BoxIoError {
    BoxIoError::Parse {
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> BoxArray {
        BoxArray::new(vec![
            BoxSlot::valid(BoundingBox::new(10, 20, 30, 40)),
            BoxSlot::Missing,
            BoxSlot::valid(BoundingBox::new(-3, 0, 7, 9)),
        ])
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(BoxFormat::from_path(Path::new("a.json")), BoxFormat::Json);
        assert_eq!(BoxFormat::from_path(Path::new("a.JSON")), BoxFormat::Json);
        assert_eq!(BoxFormat::from_path(Path::new("boxap1.ba")), BoxFormat::Text);
        assert_eq!(BoxFormat::from_path(Path::new("noext")), BoxFormat::Text);
    }

    #[test]
    fn test_text_layout() {
        let text = String::from_utf8(to_bytes(&sample(), BoxFormat::Text).unwrap()).unwrap();
        assert!(text.starts_with("\nBoxa Version 2\nNumber of boxes = 3\n"));
        assert!(text.contains("  Box[1]: x = 0, y = 0, w = 0, h = 0\n"));
        assert!(text.contains("  Box[2]: x = -3, y = 0, w = 7, h = 9\n"));
    }

    #[test]
    fn test_text_missing_slots_survive() {
        let bytes = to_bytes(&sample(), BoxFormat::Text).unwrap();
        let back = from_bytes(&bytes, BoxFormat::Text).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_json_keeps_zero_size_boxes() {
        let boxa = BoxArray::from_boxes([BoundingBox::new(1, 1, 0, 5)]);
        let bytes = to_bytes(&boxa, BoxFormat::Json).unwrap();
        let back = from_bytes(&bytes, BoxFormat::Json).unwrap();
        assert_eq!(back.valid_count(), 1);

        let text = to_bytes(&boxa, BoxFormat::Text).unwrap();
        assert_eq!(from_bytes(&text, BoxFormat::Text).unwrap().valid_count(), 0);
    }

    #[test]
    fn test_json_null_is_missing() {
        let json = br#"{"version":1,"boxes":[{"x":0,"y":0,"w":5,"h":6},null]}"#;
        let boxa = from_bytes(json, BoxFormat::Json).unwrap();
        assert_eq!(boxa.len(), 2);
        assert_eq!(boxa.slot(1), Some(&BoxSlot::Missing));
    }

    #[test]
    fn test_json_version_checked() {
        let json = br#"{"version":9,"boxes":[]}"#;
        assert!(matches!(
            from_bytes(json, BoxFormat::Json),
            Err(BoxIoError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_text_parse_errors() {
        let cases: [(&str, usize); 5] = [
            ("Boxes 2\n", 1),
            ("Boxa Version 2\nNumber of boxes = x\n", 2),
            ("Boxa Version 2\nNumber of boxes = 2\n  Box[0]: x = 1, y = 2, w = 3, h = 4\n", 4),
            ("Boxa Version 2\nNumber of boxes = 1\n  Box[0]: x = 1, y = 2, w = -3, h = 4\n", 3),
            ("Boxa Version 2\nNumber of boxes = 1\n  Box[1]: x = 1, y = 2, w = 3, h = 4\n", 3),
        ];
        for (text, line) in cases {
            match from_bytes(text.as_bytes(), BoxFormat::Text) {
                Err(BoxIoError::Parse { line: l, .. }) => assert_eq!(l, line, "{}", text),
                other => panic!("expected parse error for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_text_unsupported_version() {
        let text = "Boxa Version 7\nNumber of boxes = 0\n";
        assert!(matches!(
            from_bytes(text.as_bytes(), BoxFormat::Text),
            Err(BoxIoError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_read_write_files() {
        let tmpdir = tempfile::tempdir().unwrap();
        for name in ["boxes.json", "boxes.ba"] {
            let path: PathBuf = tmpdir.path().join(name);
            write_boxa(&path, &sample()).unwrap();
            assert_eq!(read_boxa(&path).unwrap(), sample());
        }
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_boxa(Path::new("/nonexistent/boxes.ba")).unwrap_err();
        assert!(matches!(err, BoxIoError::Io(_)));
    }
}
