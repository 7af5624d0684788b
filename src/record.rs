// 🏢 Corporate Record - one row of the OpenDART corporation registry
//
// Identity: corp_code (8 chars, never changes)
// Values: names, stock code, modify date (overwritten on re-import)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Format of `modify_date` in the registry export
pub const MODIFY_DATE_FORMAT: &str = "%Y%m%d";

// ============================================================================
// RECORD
// ============================================================================

/// Corporate record as stored in the `corporations` table
///
/// Serialized with the same field names the registry API has always
/// exposed (`corpCode`, `corpName`, ...). Absent optionals become `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateRecord {
    /// Primary key, 8 characters
    #[serde(rename = "corpCode")]
    pub code: String,

    #[serde(rename = "corpName")]
    pub name: String,

    /// Never `Some("")` once stored
    #[serde(rename = "corpEngName")]
    pub english_name: Option<String>,

    /// Stock (ticker) code, 6 characters when listed
    #[serde(rename = "stockCode")]
    pub short_code: Option<String>,

    /// `YYYYMMDD` token, kept verbatim
    #[serde(rename = "modifyDate")]
    pub last_modified: String,
}

impl CorporateRecord {
    /// Build a record, turning blank optional fields into `None`
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        english_name: Option<String>,
        short_code: Option<String>,
        last_modified: impl Into<String>,
    ) -> Self {
        CorporateRecord {
            code: code.into(),
            name: name.into(),
            english_name: blank_to_none(english_name),
            short_code: blank_to_none(short_code),
            last_modified: last_modified.into(),
        }
    }

    /// Re-apply the blank → absent rule (used before every save)
    pub fn normalized(self) -> Self {
        CorporateRecord {
            english_name: blank_to_none(self.english_name),
            short_code: blank_to_none(self.short_code),
            ..self
        }
    }

    /// Parse `last_modified` as a calendar date
    pub fn modified_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.last_modified.trim(), MODIFY_DATE_FORMAT).ok()
    }
}

/// `Some("   ")` and `Some("")` collapse to `None`; other values are kept as-is
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// FIELDS
// ============================================================================

/// Columns that can be matched exactly via `CorporationStore::find_by_field`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Code,
    Name,
    EnglishName,
    ShortCode,
    LastModified,
}

impl RecordField {
    /// Column name in the `corporations` table (and tag name in corp.xml)
    pub fn column(&self) -> &'static str {
        match self {
            RecordField::Code => "corp_code",
            RecordField::Name => "corp_name",
            RecordField::EnglishName => "corp_eng_name",
            RecordField::ShortCode => "stock_code",
            RecordField::LastModified => "modify_date",
        }
    }

    pub fn all() -> [RecordField; 5] {
        [
            RecordField::Code,
            RecordField::Name,
            RecordField::EnglishName,
            RecordField::ShortCode,
            RecordField::LastModified,
        ]
    }

    /// Reverse of `column()`
    pub fn from_column(column: &str) -> Option<RecordField> {
        RecordField::all().into_iter().find(|f| f.column() == column)
    }
}

/// Which name columns a substring search looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// `corp_name` only
    Name,
    /// `corp_name` OR `corp_eng_name`
    NameOrEnglishName,
}
