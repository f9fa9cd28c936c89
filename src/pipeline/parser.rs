//! Raw access to survey source records.
//!
//! Records arrive as loosely-typed JSON. Everything here reads through
//! `serde_json::Value` so that an unexpected shape in one field degrades to a
//! missing value instead of rejecting the whole export.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Keys every source record must carry. Presence is checked, not non-nullness.
pub const REQUIRED_FIELDS: [&str; 4] = ["id", "ra", "dec", "score"];

/// Why a single record could not become a source row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Basic identity and position of a source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceMetadata {
    pub id: String,
    pub ra: f64,
    pub dec: f64,
    pub redshift: Option<f64>,
    pub score: Option<f64>,
    pub is_transient: Option<bool>,
}

/// Load the sources JSON file. The top level must be an array.
pub fn load_json(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_sources(&content).with_context(|| format!("Failed to load {}", path.display()))
}

/// Parse an in-memory sources document. The top level must be an array.
pub fn parse_sources(content: &str) -> Result<Vec<Value>> {
    let data: Value = serde_json::from_str(content).context("Invalid JSON")?;
    match data {
        Value::Array(records) => Ok(records),
        other => bail!(
            "Expected top-level JSON value to be a list, found {}",
            kind_of(&other)
        ),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_object(obj: &Value) -> Result<&Map<String, Value>, ParseError> {
    obj.as_object().ok_or(ParseError::NotAnObject)
}

/// Check the minimal required fields of a source record.
pub fn validate_source(obj: &Value) -> Result<(), ParseError> {
    let map = as_object(obj)?;

    for field in REQUIRED_FIELDS {
        if !map.contains_key(field) {
            return Err(ParseError::MissingField(field));
        }
    }

    if source_id(obj).is_none() {
        let reason = match &map["id"] {
            Value::String(_) => "empty string".to_string(),
            other => format!("expected a string or integer, found {}", kind_of(other)),
        };
        return Err(ParseError::InvalidField { field: "id", reason });
    }

    for field in ["ra", "dec"] {
        if number(map.get(field)).is_none() {
            return Err(ParseError::InvalidField {
                field,
                reason: format!("expected a number, found {}", kind_of(&map[field])),
            });
        }
    }

    Ok(())
}

/// The join key shared by both output tables.
///
/// String ids are trimmed; a blank string is no key at all.
pub fn source_id(obj: &Value) -> Option<String> {
    match obj.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Extract basic metadata from a validated source record.
pub fn parse_metadata(obj: &Value) -> Result<SourceMetadata, ParseError> {
    validate_source(obj)?;

    // validate_source guarantees id, ra and dec are usable
    let id = source_id(obj).ok_or(ParseError::MissingField("id"))?;
    let ra = number(obj.get("ra")).ok_or(ParseError::MissingField("ra"))?;
    let dec = number(obj.get("dec")).ok_or(ParseError::MissingField("dec"))?;

    Ok(SourceMetadata {
        id,
        ra,
        dec,
        redshift: number(obj.get("redshift")),
        score: number(obj.get("score")),
        is_transient: boolean(obj.get("transient")),
    })
}

/// Astrophysical class label from TNS information, if classified.
pub fn parse_label(obj: &Value) -> Option<String> {
    let name = obj.get("tns_info")?.get("object_type")?.get("name");
    string(name)
}

/// The TNS block when it is a proper object.
pub fn tns_info(obj: &Value) -> Option<&Map<String, Value>> {
    obj.get("tns_info").and_then(Value::as_object)
}

fn tns_list<'a>(obj: &'a Value, key: &str) -> &'a [Value] {
    tns_info(obj)
        .and_then(|tns| tns.get(key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Raw photometry entries under `tns_info.photometry`.
pub fn parse_photometry(obj: &Value) -> &[Value] {
    tns_list(obj, "photometry")
}

/// Raw spectra entries under `tns_info.spectra`.
pub fn parse_spectra(obj: &Value) -> &[Value] {
    tns_list(obj, "spectra")
}

/// A finite number, from a JSON number or a numeric string.
pub fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A JSON boolean; any other type counts as missing.
pub fn boolean(value: Option<&Value>) -> Option<bool> {
    value?.as_bool()
}

/// A non-empty JSON string.
pub fn string(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({"id": "ZTF21abc", "ra": 10.5, "dec": -3.25, "score": 0.9})
    }

    #[test]
    fn test_parse_sources_requires_array() {
        let err = parse_sources(r#"{"id": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("Expected top-level JSON value to be a list"));
        assert!(parse_sources("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_sources_invalid_json() {
        let err = parse_sources("[{").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let obj = json!({"id": "a", "ra": 1.0, "dec": 2.0});
        assert_eq!(
            validate_source(&obj),
            Err(ParseError::MissingField("score"))
        );
        assert_eq!(
            validate_source(&json!({})),
            Err(ParseError::MissingField("id"))
        );
    }

    #[test]
    fn test_validate_null_score_is_present() {
        let obj = json!({"id": "a", "ra": 1.0, "dec": 2.0, "score": null});
        assert!(validate_source(&obj).is_ok());
        assert_eq!(parse_metadata(&obj).unwrap().score, None);
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert_eq!(validate_source(&json!([1, 2])), Err(ParseError::NotAnObject));
    }

    #[test]
    fn test_validate_rejects_bad_position() {
        let obj = json!({"id": "a", "ra": "north", "dec": 2.0, "score": 1});
        match validate_source(&obj) {
            Err(ParseError::InvalidField { field, .. }) => assert_eq!(field, "ra"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_source_id_accepts_integers() {
        assert_eq!(source_id(&json!({"id": 42})), Some("42".to_string()));
        assert_eq!(source_id(&json!({"id": 4.2})), None);
        assert_eq!(source_id(&json!({"id": "  "})), None);
        assert_eq!(source_id(&json!({"id": null})), None);
    }

    #[test]
    fn test_source_id_trims_padding() {
        assert_eq!(source_id(&json!({"id": " ZTF1 "})), Some("ZTF1".to_string()));
        let row = parse_metadata(&json!({"id": "\tZTF1\n", "ra": 1.0, "dec": 2.0, "score": 0.1}))
            .unwrap();
        assert_eq!(row.id, "ZTF1");
    }

    #[test]
    fn test_validate_blank_id() {
        for id in ["", "   "] {
            let obj = json!({"id": id, "ra": 1.0, "dec": 2.0, "score": 0.1});
            assert_eq!(
                validate_source(&obj),
                Err(ParseError::InvalidField {
                    field: "id",
                    reason: "empty string".to_string(),
                })
            );
        }
        let obj = json!({"id": [1], "ra": 1.0, "dec": 2.0, "score": 0.1});
        match validate_source(&obj) {
            Err(ParseError::InvalidField { reason, .. }) => {
                assert_eq!(reason, "expected a string or integer, found an array")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_metadata() {
        let mut obj = minimal();
        obj["redshift"] = json!("0.034");
        obj["transient"] = json!(true);
        let meta = parse_metadata(&obj).unwrap();
        assert_eq!(meta.id, "ZTF21abc");
        assert_eq!(meta.ra, 10.5);
        assert_eq!(meta.dec, -3.25);
        assert_eq!(meta.redshift, Some(0.034));
        assert_eq!(meta.score, Some(0.9));
        assert_eq!(meta.is_transient, Some(true));
    }

    #[test]
    fn test_parse_label_chain() {
        assert_eq!(parse_label(&minimal()), None);

        let mut obj = minimal();
        obj["tns_info"] = Value::Null;
        assert_eq!(parse_label(&obj), None);

        obj["tns_info"] = json!({"object_type": null});
        assert_eq!(parse_label(&obj), None);

        obj["tns_info"] = json!({"object_type": {"name": "SN Ia"}});
        assert_eq!(parse_label(&obj), Some("SN Ia".to_string()));
    }

    #[test]
    fn test_parse_collections_tolerate_wrong_shapes() {
        let mut obj = minimal();
        assert!(parse_photometry(&obj).is_empty());

        obj["tns_info"] = json!({"photometry": {"jd": 1.0}, "spectra": null});
        assert!(parse_photometry(&obj).is_empty());
        assert!(parse_spectra(&obj).is_empty());

        obj["tns_info"] = json!({"photometry": [{"jd": 1.0}], "spectra": [{"id": 3}]});
        assert_eq!(parse_photometry(&obj).len(), 1);
        assert_eq!(parse_spectra(&obj).len(), 1);
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(number(Some(&json!(1))), Some(1.0));
        assert_eq!(number(Some(&json!(" 2.5 "))), Some(2.5));
        assert_eq!(number(Some(&json!("NaN"))), None);
        assert_eq!(number(Some(&json!("inf"))), None);
        assert_eq!(number(Some(&json!(true))), None);
        assert_eq!(boolean(Some(&json!("true"))), None);
        assert_eq!(boolean(Some(&json!(false))), Some(false));
        assert_eq!(string(Some(&json!(""))), None);
        assert_eq!(string(Some(&json!("ztfg"))), Some("ztfg".to_string()));
    }
}
