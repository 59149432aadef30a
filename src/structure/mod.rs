//! Order-insensitive comparison of associative file contents.
//!
//! Config and translation files are serialized key/value trees (PHP files
//! returning an array, or JSON documents). Two files that hold the same pairs
//! in a different key order differ byte-wise but are the same structure.
//! Both formats are parsed into [`Node`]; maps are kept in a `BTreeMap`, so
//! every nesting level is sorted by key and `==` is a deep, order-insensitive
//! equality.

mod php;

pub use php::parse_php_array;

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing PHP open tag")]
    NoOpenTag,

    #[error("File does not return a value")]
    NoReturn,

    #[error("Unsupported statement: {0}")]
    Unsupported(String),

    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Illegal array key: {0}")]
    IllegalKey(String),

    #[error("Top-level value is not an associative structure")]
    NotAStructure,
}

/// Serialization formats with an associative representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    /// `<?php return [...];`
    PhpArray,
    /// JSON object or array
    Json,
}

impl StructureFormat {
    /// Pick the format from a file extension
    pub fn for_path(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".json") {
            Some(StructureFormat::Json)
        } else if lower.ends_with(".php") && !lower.ends_with(".blade.php") {
            Some(StructureFormat::PhpArray)
        } else {
            None
        }
    }
}

/// Array key. PHP folds canonical integer strings (`"8"`) into integer keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
    /// Key given by an expression that cannot be evaluated statically
    Expr(String),
}

impl Key {
    pub fn from_string(s: &str) -> Self {
        match canonical_int(s) {
            Some(n) => Key::Int(n),
            None => Key::Str(s.to_string()),
        }
    }
}

/// Parsed value
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Source text of an expression (function call, constant, ...),
    /// whitespace-insensitive
    Expr(String),
    Map(BTreeMap<Key, Node>),
}

impl Node {
    pub fn is_map(&self) -> bool {
        matches!(self, Node::Map(_))
    }
}

/// Parse raw content in the given format into a key-sorted tree.
///
/// Fails with [`ParseError::NotAStructure`] when the top-level value is not a
/// map or list.
pub fn parse_structure(raw: &str, format: StructureFormat) -> Result<Node, ParseError> {
    let node = match format {
        StructureFormat::PhpArray => parse_php_array(raw)?,
        StructureFormat::Json => {
            let value: Value = serde_json::from_str(raw)?;
            from_json(value)
        }
    };

    if node.is_map() {
        Ok(node)
    } else {
        Err(ParseError::NotAStructure)
    }
}

/// Compare two raw contents as structures.
///
/// Returns `None` when either side cannot be parsed; the caller keeps its
/// byte-level verdict in that case.
pub fn structurally_equal(vendor_raw: &str, local_raw: &str, format: StructureFormat) -> Option<bool> {
    let vendor = match parse_structure(vendor_raw, format) {
        Ok(node) => node,
        Err(e) => {
            debug!(error = %e, "Vendor content is not a comparable structure");
            return None;
        }
    };
    let local = match parse_structure(local_raw, format) {
        Ok(node) => node,
        Err(e) => {
            debug!(error = %e, "Local content is not a comparable structure");
            return None;
        }
    };

    Some(vendor == local)
}

fn from_json(value: Value) -> Node {
    match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Node::Int(i),
            None => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Node::Str(s),
        Value::Array(items) => Node::Map(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::Int(i as i64), from_json(v)))
                .collect(),
        ),
        Value::Object(map) => Node::Map(
            map.into_iter()
                .map(|(k, v)| (Key::from_string(&k), from_json(v)))
                .collect(),
        ),
    }
}

/// Integer value of a string PHP would use as an integer array key
fn canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_path() {
        assert_eq!(StructureFormat::for_path("lang/en.json"), Some(StructureFormat::Json));
        assert_eq!(StructureFormat::for_path("config/app.php"), Some(StructureFormat::PhpArray));
        assert_eq!(StructureFormat::for_path("views/a.blade.php"), None);
        assert_eq!(StructureFormat::for_path("README.md"), None);
    }

    #[test]
    fn test_key_from_string_folds_integers() {
        assert_eq!(Key::from_string("8"), Key::Int(8));
        assert_eq!(Key::from_string("-3"), Key::Int(-3));
        assert_eq!(Key::from_string("08"), Key::Str("08".to_string()));
        assert_eq!(Key::from_string("-0"), Key::Str("-0".to_string()));
        assert_eq!(Key::from_string("1.5"), Key::Str("1.5".to_string()));
        assert_eq!(Key::from_string(""), Key::Str(String::new()));
    }

    #[test]
    fn test_json_key_order_is_ignored() {
        let vendor = r#"{"a": "1", "b": {"x": 1, "y": [1, 2]}}"#;
        let local = r#"{
            "b": {"y": [1, 2], "x": 1},
            "a": "1"
        }"#;
        assert_eq!(structurally_equal(vendor, local, StructureFormat::Json), Some(true));
    }

    #[test]
    fn test_json_list_order_matters() {
        let vendor = r#"{"a": [1, 2]}"#;
        let local = r#"{"a": [2, 1]}"#;
        assert_eq!(structurally_equal(vendor, local, StructureFormat::Json), Some(false));
    }

    #[test]
    fn test_json_value_difference() {
        assert_eq!(
            structurally_equal(r#"{"a": "x"}"#, r#"{"a": "y"}"#, StructureFormat::Json),
            Some(false)
        );
    }

    #[test]
    fn test_unparseable_is_not_applicable() {
        assert_eq!(
            structurally_equal(r#"{"a": 1}"#, "{not json", StructureFormat::Json),
            None
        );
        assert_eq!(structurally_equal("\"text\"", "\"text\"", StructureFormat::Json), None);
    }

    #[test]
    fn test_php_key_order_is_ignored() {
        let vendor = "<?php\n\nreturn [\n    'name' => 'Horizon',\n    'path' => 'horizon',\n];\n";
        let local = "<?php\nreturn [\n    'path' => 'horizon', // moved\n    'name' => 'Horizon',\n];";
        assert_eq!(structurally_equal(vendor, local, StructureFormat::PhpArray), Some(true));
    }

    #[test]
    fn test_php_and_json_agree_on_integer_keys() {
        let php = parse_structure("<?php return ['10' => 'a', 'b'];", StructureFormat::PhpArray)
            .expect("php parses");
        let json = parse_structure(r#"{"11": "b", "10": "a"}"#, StructureFormat::Json)
            .expect("json parses");
        assert_eq!(php, json);
    }
}
