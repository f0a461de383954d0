//! Booking record, batch and anomaly report models.
//!
//! Field slots distinguish a well-formed value from the failure shapes seen
//! in booking files: the empty string, an explicit `null` and an absent key.
//! The serialized form mirrors the flat JSON written by the pipeline, so
//! integers stay integers, failures stay `""` and a hand-written `null`
//! is written back as `null`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Values that can occupy a [`Field`].
///
/// Implementors report whether a present value should still be treated as
/// blank. Only text has such a value (the empty string).
pub trait FieldValue {
    /// Returns true when the value carries no content.
    fn is_blank_value(&self) -> bool {
        false
    }
}

impl FieldValue for u64 {}
impl FieldValue for u32 {}

impl FieldValue for String {
    fn is_blank_value(&self) -> bool {
        self.is_empty()
    }
}

/// A single field slot of a booking record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field<T> {
    /// A present value
    Value(T),
    /// Present but empty (`""`)
    Empty,
    /// Present as `null`
    Null,
    /// Key absent
    Missing,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T: FieldValue> Field<T> {
    /// Returns true for empty or missing slots.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Value(value) => value.is_blank_value(),
            Self::Empty | Self::Null | Self::Missing => true,
        }
    }
}

impl<T> Field<T> {
    /// Returns true when the key was absent from the source.
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the present value, if any.
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Empty | Self::Null | Self::Missing => None,
        }
    }
}

impl Field<String> {
    /// Builds a text slot, mapping `""` to [`Field::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Value(value)
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Empty => serializer.serialize_str(""),
            Self::Null | Self::Missing => serializer.serialize_none(),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::String(s) if s.is_empty() => Ok(Self::Empty),
            other => T::deserialize(other)
                .map(Self::Value)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// The five required fields of a booking, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum BookingField {
    BookingId,
    ListingId,
    UserId,
    BookingTime,
    Status,
}

impl BookingField {
    /// All required fields in declaration order.
    pub const ALL: [Self; 5] = [
        Self::BookingId,
        Self::ListingId,
        Self::UserId,
        Self::BookingTime,
        Self::Status,
    ];

    /// Field name as it appears in booking files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookingId => "booking_id",
            Self::ListingId => "listing_id",
            Self::UserId => "user_id",
            Self::BookingTime => "booking_time",
            Self::Status => "status",
        }
    }

    /// The violation raised when this field is absent or empty.
    pub const fn missing_violation(self) -> Violation {
        match self {
            Self::BookingId => Violation::MissingBookingId,
            Self::ListingId => Violation::MissingListingId,
            Self::UserId => Violation::MissingUserId,
            Self::BookingTime => Violation::MissingBookingTime,
            Self::Status => Violation::MissingStatus,
        }
    }
}

impl fmt::Display for BookingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted booking statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Cancelled,
}

/// Status values emitted when the generator corrupts a status field.
pub const MALFORMED_STATUSES: [&str; 3] = ["unknown", "", "error"];

impl BookingStatus {
    /// Every accepted status.
    pub const ALL: [Self; 3] = [Self::Confirmed, Self::Pending, Self::Cancelled];

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the accepted statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized booking status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A single booking entry.
///
/// Keys outside the five booking fields are rejected on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookingRecord {
    /// Sequential booking number, starting at 1
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub booking_id: Field<u64>,
    /// Listing from the catalog
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub listing_id: Field<u32>,
    /// Guest identifier
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub user_id: Field<u32>,
    /// `YYYY-MM-DD HH:MM:SS`
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub booking_time: Field<String>,
    /// Expected to be one of the [`BookingStatus`] names
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub status: Field<String>,
}

impl BookingRecord {
    /// Returns true when the named field is absent or empty.
    pub fn is_blank(&self, field: BookingField) -> bool {
        match field {
            BookingField::BookingId => self.booking_id.is_blank(),
            BookingField::ListingId => self.listing_id.is_blank(),
            BookingField::UserId => self.user_id.is_blank(),
            BookingField::BookingTime => self.booking_time.is_blank(),
            BookingField::Status => self.status.is_blank(),
        }
    }

    /// Parses the status slot, if it holds an accepted value.
    pub fn parsed_status(&self) -> Option<BookingStatus> {
        self.status.value().and_then(|s| s.parse().ok())
    }
}

/// One generator run's worth of records, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    records: Vec<BookingRecord>,
}

impl Batch {
    /// Creates a batch from records.
    pub const fn new(records: Vec<BookingRecord>) -> Self {
        Self { records }
    }

    /// Records in batch order.
    pub fn records(&self) -> &[BookingRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true for a batch with no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in batch order.
    pub fn iter(&self) -> std::slice::Iter<'_, BookingRecord> {
        self.records.iter()
    }
}

impl From<Vec<BookingRecord>> for Batch {
    fn from(records: Vec<BookingRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<BookingRecord> for Batch {
    fn from_iter<I: IntoIterator<Item = BookingRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a BookingRecord;
    type IntoIter = std::slice::Iter<'a, BookingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A single failed rule on a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Violation {
    MissingBookingId,
    MissingListingId,
    MissingUserId,
    MissingBookingTime,
    MissingStatus,
    InvalidStatus,
}

impl Violation {
    /// Tag as written to anomaly reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingBookingId => "missing_booking_id",
            Self::MissingListingId => "missing_listing_id",
            Self::MissingUserId => "missing_user_id",
            Self::MissingBookingTime => "missing_booking_time",
            Self::MissingStatus => "missing_status",
            Self::InvalidStatus => "invalid_status",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that failed at least one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyEntry {
    /// Zero-based position of the record in its batch
    pub record_index: usize,
    /// Failed rules, missing-field tags first
    pub violations: Vec<Violation>,
    /// The offending record, unchanged
    pub record: BookingRecord,
}

/// Records that failed validation, in ascending `record_index` order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnomalyReport {
    entries: Vec<AnomalyEntry>,
}

impl AnomalyReport {
    /// Creates a report from entries.
    pub const fn new(entries: Vec<AnomalyEntry>) -> Self {
        Self { entries }
    }

    /// Report entries.
    pub fn entries(&self) -> &[AnomalyEntry] {
        &self.entries
    }

    /// Number of flagged records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no record was flagged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices of flagged records.
    pub fn flagged_records(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.record_index).collect()
    }

    /// Per-tag totals across every entry.
    pub fn violation_counts(&self) -> BTreeMap<Violation, usize> {
        let mut counts = BTreeMap::new();
        for violation in self.entries.iter().flat_map(|e| e.violations.iter()) {
            let count = counts.entry(*violation).or_insert(0_usize);
            *count = count.saturating_add(1);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_record() -> BookingRecord {
        BookingRecord {
            booking_id: Field::Value(1),
            listing_id: Field::Value(2),
            user_id: Field::Value(3000),
            booking_time: Field::text("2025-01-01 00:00:00"),
            status: Field::text("confirmed"),
        }
    }

    #[test]
    fn test_record_serializes_in_field_order() {
        let json = serde_json::to_string(&full_record()).unwrap();
        assert_eq!(
            json,
            r#"{"booking_id":1,"listing_id":2,"user_id":3000,"booking_time":"2025-01-01 00:00:00","status":"confirmed"}"#
        );
    }

    #[test]
    fn test_empty_field_serializes_as_empty_string() {
        let record = BookingRecord {
            booking_id: Field::Empty,
            ..full_record()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["booking_id"], json!(""));
    }

    #[test]
    fn test_missing_field_is_omitted() {
        let record = BookingRecord {
            user_id: Field::Missing,
            ..full_record()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("user_id").is_none());
    }

    #[test]
    fn test_null_and_absent_are_distinct_blanks() {
        let record: BookingRecord =
            serde_json::from_value(json!({"booking_id": null, "status": "pending"})).unwrap();
        assert_eq!(record.booking_id, Field::Null);
        assert_eq!(record.listing_id, Field::Missing);
        assert!(record.is_blank(BookingField::BookingId));
        assert!(record.is_blank(BookingField::ListingId));
        assert_eq!(record.status, Field::Value("pending".to_string()));
    }

    #[test]
    fn test_null_is_written_back_as_null() {
        let record = BookingRecord {
            listing_id: Field::Null,
            user_id: Field::Missing,
            ..full_record()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["listing_id"], serde_json::Value::Null);
        assert!(value.as_object().is_some_and(|o| o.contains_key("listing_id")));
        assert!(value.get("user_id").is_none());
    }

    #[test]
    fn test_unknown_keys_fail_to_decode() {
        let result: Result<BookingRecord, _> = serde_json::from_value(json!({
            "booking_id": 1,
            "status": "pending",
            "note": "x"
        }));
        let error = result.unwrap_err();
        assert!(error.to_string().contains("note"), "{error}");
    }

    #[test]
    fn test_wrong_value_type_fails_to_decode() {
        let result: Result<BookingRecord, _> =
            serde_json::from_value(json!({"booking_id": "abc"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_text_constructor_normalizes_empty() {
        assert_eq!(Field::text(""), Field::Empty);
        assert_eq!(Field::text("x"), Field::Value("x".to_string()));
        assert!(Field::Value(String::new()).is_blank());
        assert!(!Field::Value(0_u32).is_blank());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("pending".parse::<BookingStatus>(), Ok(BookingStatus::Pending));
        assert_eq!(
            "Confirmed".parse::<BookingStatus>(),
            Err(UnknownStatus("Confirmed".to_string()))
        );
        for malformed in MALFORMED_STATUSES {
            assert!(malformed.parse::<BookingStatus>().is_err());
        }
    }

    #[test]
    fn test_violation_tags_match_field_names() {
        for field in BookingField::ALL {
            assert_eq!(
                field.missing_violation().as_str(),
                format!("missing_{}", field.as_str())
            );
        }
        assert_eq!(
            serde_json::to_value(Violation::InvalidStatus).unwrap(),
            json!("invalid_status")
        );
    }

    #[test]
    fn test_batch_is_a_bare_array() {
        let batch = Batch::new(vec![full_record()]);
        let value = serde_json::to_value(&batch).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_violation_counts() {
        let report = AnomalyReport::new(vec![
            AnomalyEntry {
                record_index: 0,
                violations: vec![Violation::MissingStatus, Violation::InvalidStatus],
                record: full_record(),
            },
            AnomalyEntry {
                record_index: 3,
                violations: vec![Violation::InvalidStatus],
                record: full_record(),
            },
        ]);

        let counts = report.violation_counts();
        assert_eq!(counts.get(&Violation::InvalidStatus), Some(&2));
        assert_eq!(counts.get(&Violation::MissingStatus), Some(&1));
        assert_eq!(report.flagged_records(), vec![0, 3]);
    }
}
