//! Shareable-state codec.
//!
//! A record set is serialized to canonical JSON and compressed with the
//! LZ-String "encoded URI component" transform. The output alphabet
//! (`A-Za-z0-9+-$`) survives a URL fragment untouched, and tokens are
//! interchangeable with those produced by the browser build of the viewer.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ShareLimits;
use crate::data::{ProductRecord, RecordSet};
use crate::errors::TransferError;

/// Opaque, URL-fragment-safe encoding of a full record set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShareToken(String);

impl ShareToken {
    /// Token text as it appears after `#data=`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (the alphabet is ASCII).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length token.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the token, returning its text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical text form of a record set (also the persisted form).
///
/// `extra` entries keyed by fixed-schema headers are left out so every key
/// appears once and the text parses back.
pub fn to_canonical_json(records: &RecordSet) -> Result<String, TransferError> {
    let json = if records.iter().any(ProductRecord::has_shadowed_extras) {
        let cleaned: RecordSet = records
            .iter()
            .cloned()
            .map(|mut record| {
                let dropped = record.strip_schema_extras();
                if dropped > 0 {
                    warn!(
                        "[salesdeck:codec] dropping {dropped} extra column(s) shadowed by fixed fields on '{}'",
                        record.name
                    );
                }
                record
            })
            .collect();
        serde_json::to_string(&cleaned)
    } else {
        serde_json::to_string(records)
    };
    json.map_err(|err| TransferError::Schema(format!("failed to serialize records: {err}")))
}

/// Parse canonical text back into a record set.
///
/// Text that is not JSON is a decode failure; JSON of the wrong shape is a
/// schema failure.
pub fn from_canonical_json(text: &str) -> Result<RecordSet, TransferError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| TransferError::Decode(format!("payload is not valid JSON: {err}")))?;
    records_from_value(value)
}

fn records_from_value(value: Value) -> Result<RecordSet, TransferError> {
    let Value::Array(items) = value else {
        return Err(TransferError::Schema(format!(
            "expected an array of records, found {}",
            json_kind(&value)
        )));
    };
    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(TransferError::Schema(format!(
                "record {idx} is {}, expected an object",
                json_kind(&item)
            )));
        }
        let record = serde_json::from_value(item)
            .map_err(|err| TransferError::Schema(format!("record {idx}: {err}")))?;
        records.push(record);
    }
    Ok(RecordSet::new(records))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Encode a record set into a share token.
pub fn export(records: &RecordSet, limits: ShareLimits) -> Result<ShareToken, TransferError> {
    let json = to_canonical_json(records)?;
    let token = lz_str::compress_to_encoded_uri_component(json.as_str());
    check_limit(token.len(), limits)?;
    debug!(
        "[salesdeck:codec] exported {} records ({} json bytes -> {} token chars)",
        records.len(),
        json.len(),
        token.len()
    );
    Ok(ShareToken(token))
}

/// Decode a share token back into a record set.
pub fn import(token: &str, limits: ShareLimits) -> Result<RecordSet, TransferError> {
    if token.is_empty() {
        return Err(TransferError::Decode("token is empty".into()));
    }
    check_limit(token.len(), limits)?;
    let wide = lz_str::decompress_from_encoded_uri_component(token)
        .ok_or_else(|| TransferError::Decode("token could not be decompressed".into()))?;
    let json = String::from_utf16(&wide)
        .map_err(|err| TransferError::Decode(format!("decompressed text is not UTF-16: {err}")))?;
    if json.is_empty() {
        return Err(TransferError::Decode("token decompressed to nothing".into()));
    }
    let records = from_canonical_json(&json)?;
    debug!(
        "[salesdeck:codec] imported {} records from {} token chars",
        records.len(),
        token.len()
    );
    Ok(records)
}

/// Decode the legacy `?data=` payload: percent-encoded JSON, no compression.
///
/// `payload` is the query value after URL form-decoding; it is percent-decoded
/// once more, matching how legacy links were produced.
pub fn import_legacy(payload: &str) -> Result<RecordSet, TransferError> {
    let json = urlencoding::decode(payload)
        .map_err(|err| TransferError::Decode(format!("invalid percent-encoding: {err}")))?;
    from_canonical_json(&json)
}

fn check_limit(len: usize, limits: ShareLimits) -> Result<(), TransferError> {
    match limits.max_token_len {
        Some(limit) if len > limit => Err(TransferError::TokenTooLarge { len, limit }),
        _ => Ok(()),
    }
}
