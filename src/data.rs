use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::constants::schema::{
    COL_COLD_CALL, COL_COMMON_USES, COL_CUSTOMER_PROFILES, COL_DEFINITION, COL_EMAIL_SEQUENCES,
    COL_EXPLANATION, COL_NAME, COL_OBJECTIONS, COL_POSITIONING, COL_REBUTTALS, COL_URL,
    PROFILE_DELIMITER,
};
use crate::errors::TransferError;
use crate::utils::{contains_ignore_case, render_number, split_list};

pub use crate::types::{ColumnName, ProductName};

/// Plain-text cell value.
///
/// Deserializes from JSON strings, numbers, and booleans so payloads produced by
/// browser exports (where numeric cells stay numeric) still load; always
/// serializes as a string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellText(String);

impl CellText {
    /// Wrap cell text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Cell text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the cell text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CellText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CellText {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CellText {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for CellText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct CellTextVisitor;

impl<'de> Visitor<'de> for CellTextVisitor {
    type Value = CellText;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a text, number, or boolean cell value")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<CellText, E> {
        Ok(CellText::new(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<CellText, E> {
        Ok(CellText(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<CellText, E> {
        Ok(CellText(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<CellText, E> {
        Ok(CellText(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<CellText, E> {
        Ok(CellText(render_number(value)))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<CellText, E> {
        Ok(CellText(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for CellText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellTextVisitor)
    }
}

fn required_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    CellText::deserialize(deserializer).map(CellText::into_inner)
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<CellText>::deserialize(deserializer).map(|cell| cell.map(CellText::into_inner))
}

/// One product entry.
///
/// Field order here is the canonical serialization order. Columns outside the
/// fixed schema are kept in `extra`, in source order, after the fixed fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product page link.
    #[serde(
        rename = "Product URL",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub url: Option<String>,
    /// Display name; also the selection key.
    #[serde(rename = "Product Name", deserialize_with = "required_text")]
    pub name: ProductName,
    /// One-line definition.
    #[serde(
        rename = "Definition (Simple)",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub definition: Option<String>,
    /// Long-form explanation.
    #[serde(
        rename = "Expanded Explanation",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub explanation: Option<String>,
    /// Typical applications.
    #[serde(
        rename = "Common Uses",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub common_uses: Option<String>,
    /// Comma-joined list; see [`ProductRecord::customer_profiles`].
    #[serde(
        rename = "Common Customer Profiles",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub customer_profiles: Option<String>,
    /// Competitive positioning notes.
    #[serde(
        rename = "Positioning (vs Competitors)",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub positioning: Option<String>,
    /// Cold call script body.
    #[serde(
        rename = "Cold Call Script",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub cold_call_script: Option<String>,
    /// First cold email.
    #[serde(
        rename = "Cold Email - Sequence 1",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub email_sequence_1: Option<String>,
    /// Second cold email.
    #[serde(
        rename = "Cold Email - Sequence 2",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub email_sequence_2: Option<String>,
    /// Third cold email.
    #[serde(
        rename = "Cold Email - Sequence 3",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub email_sequence_3: Option<String>,
    /// Fourth cold email.
    #[serde(
        rename = "Cold Email - Sequence 4",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub email_sequence_4: Option<String>,
    /// Fifth cold email.
    #[serde(
        rename = "Cold Email - Sequence 5",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub email_sequence_5: Option<String>,
    /// Expected customer objections.
    #[serde(
        rename = "Possible Customer Objections",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub objections: Option<String>,
    /// Rebuttals to the objections.
    #[serde(
        rename = "Rebuttals to Objections",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub rebuttals: Option<String>,
    /// Columns outside the fixed schema, in source order.
    ///
    /// Keys must not be fixed-schema headers (see [`is_schema_column`]); such
    /// entries are shadowed by the typed fields and dropped on serialization
    /// by [`crate::codec::to_canonical_json`].
    #[serde(flatten)]
    pub extra: IndexMap<ColumnName, CellText>,
}

impl ProductRecord {
    /// Create a record with only a name set.
    pub fn named(name: impl Into<ProductName>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// True when `extra` holds a key that collides with a typed field.
    pub fn has_shadowed_extras(&self) -> bool {
        self.extra.keys().any(|column| is_schema_column(column))
    }

    /// Drop `extra` entries keyed by fixed-schema headers; returns how many were removed.
    pub fn strip_schema_extras(&mut self) -> usize {
        let before = self.extra.len();
        self.extra.retain(|column, _| !is_schema_column(column));
        before - self.extra.len()
    }

    /// Build a record from `header -> cell text` pairs.
    ///
    /// Known headers fill the typed fields; everything else lands in `extra`.
    pub fn from_cells(mut cells: IndexMap<ColumnName, String>) -> Result<Self, TransferError> {
        let name = take(&mut cells, COL_NAME).ok_or_else(|| {
            TransferError::Schema(format!("record is missing required column '{COL_NAME}'"))
        })?;
        let url = take(&mut cells, COL_URL);
        let definition = take(&mut cells, COL_DEFINITION);
        let explanation = take(&mut cells, COL_EXPLANATION);
        let common_uses = take(&mut cells, COL_COMMON_USES);
        let customer_profiles = take(&mut cells, COL_CUSTOMER_PROFILES);
        let positioning = take(&mut cells, COL_POSITIONING);
        let cold_call_script = take(&mut cells, COL_COLD_CALL);
        let [e1, e2, e3, e4, e5] = COL_EMAIL_SEQUENCES.map(|column| take(&mut cells, column));
        let objections = take(&mut cells, COL_OBJECTIONS);
        let rebuttals = take(&mut cells, COL_REBUTTALS);
        let extra = cells
            .into_iter()
            .map(|(column, value)| (column, CellText(value)))
            .collect();
        Ok(Self {
            url,
            name,
            definition,
            explanation,
            common_uses,
            customer_profiles,
            positioning,
            cold_call_script,
            email_sequence_1: e1,
            email_sequence_2: e2,
            email_sequence_3: e3,
            email_sequence_4: e4,
            email_sequence_5: e5,
            objections,
            rebuttals,
            extra,
        })
    }

    /// Cold email bodies in send order.
    pub fn email_sequences(&self) -> [Option<&str>; 5] {
        [
            self.email_sequence_1.as_deref(),
            self.email_sequence_2.as_deref(),
            self.email_sequence_3.as_deref(),
            self.email_sequence_4.as_deref(),
            self.email_sequence_5.as_deref(),
        ]
    }

    /// Customer profiles split out of the comma-joined column.
    pub fn customer_profiles(&self) -> Vec<String> {
        self.customer_profiles
            .as_deref()
            .map(|text| split_list(text, PROFILE_DELIMITER))
            .unwrap_or_default()
    }

    /// Look up any column by its header text.
    pub fn field(&self, column: &str) -> Option<&str> {
        let [e1, e2, e3, e4, e5] = self.email_sequences();
        match column {
            COL_URL => self.url.as_deref(),
            COL_NAME => Some(self.name.as_str()),
            COL_DEFINITION => self.definition.as_deref(),
            COL_EXPLANATION => self.explanation.as_deref(),
            COL_COMMON_USES => self.common_uses.as_deref(),
            COL_CUSTOMER_PROFILES => self.customer_profiles.as_deref(),
            COL_POSITIONING => self.positioning.as_deref(),
            COL_COLD_CALL => self.cold_call_script.as_deref(),
            COL_OBJECTIONS => self.objections.as_deref(),
            COL_REBUTTALS => self.rebuttals.as_deref(),
            other => match COL_EMAIL_SEQUENCES.iter().position(|col| *col == other) {
                Some(0) => e1,
                Some(1) => e2,
                Some(2) => e3,
                Some(3) => e4,
                Some(_) => e5,
                None => self.extra.get(other).map(CellText::as_str),
            },
        }
    }

    /// True when the name or short definition contains `term` (case-insensitive).
    pub fn matches(&self, term: &str) -> bool {
        contains_ignore_case(&self.name, term)
            || self
                .definition
                .as_deref()
                .is_some_and(|definition| contains_ignore_case(definition, term))
    }
}

/// True for headers that map to a typed [`ProductRecord`] field.
pub fn is_schema_column(column: &str) -> bool {
    [
        COL_URL,
        COL_NAME,
        COL_DEFINITION,
        COL_EXPLANATION,
        COL_COMMON_USES,
        COL_CUSTOMER_PROFILES,
        COL_POSITIONING,
        COL_COLD_CALL,
        COL_OBJECTIONS,
        COL_REBUTTALS,
    ]
    .contains(&column)
        || COL_EMAIL_SEQUENCES.contains(&column)
}

fn take(cells: &mut IndexMap<ColumnName, String>, column: &str) -> Option<String> {
    cells.shift_remove(column)
}

/// Ordered product list, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<ProductRecord>,
}

impl RecordSet {
    /// Wrap records, keeping their order.
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    /// A set with no records.
    pub const fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in order.
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Iterate records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ProductRecord> {
        self.records.iter()
    }

    /// Record at `index`.
    pub fn get(&self, index: usize) -> Option<&ProductRecord> {
        self.records.get(index)
    }

    /// First record, the default selection.
    pub fn first(&self) -> Option<&ProductRecord> {
        self.records.first()
    }

    /// Index of the first record named `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|record| record.name == name)
    }

    /// Records whose name or definition contains `term`, in set order.
    pub fn search<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a ProductRecord> + 'a {
        self.records.iter().filter(move |record| record.matches(term))
    }

    /// Consume the set, returning its records.
    pub fn into_inner(self) -> Vec<ProductRecord> {
        self.records
    }
}

impl From<Vec<ProductRecord>> for RecordSet {
    fn from(records: Vec<ProductRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<ProductRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = ProductRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ProductRecord;
    type IntoIter = std::slice::Iter<'a, ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
