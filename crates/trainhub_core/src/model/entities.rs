//! Typed domain payloads for every training-center collection.
//!
//! # Responsibility
//! - Give each collection an explicit field shape checked at the store boundary.
//! - Keep wire names identical to the front-end payloads (`snake_case`, French
//!   status literals).
//!
//! # Invariants
//! - Foreign keys are plain `RecordId` values; nothing here resolves them.
//! - Every field is optional or defaulted, so partial form payloads still load.
//! - A session's `end_date` is never earlier than its `start_date`.
//! - Unknown keys are rejected; unset optional fields are omitted on the wire.
//! - Blank date strings (`""`) decode as an unset date.

use crate::model::record::{Entity, RecordId};
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};

/// Course category (`Langue`, `Bureautique`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Entity for Category {
    const NAME: &'static str = "category";
}

/// Catalog entry describing one training program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Formation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<u32>,
    /// Tuition in local currency units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Serialized as `type` (`certifiante`, `diplomante`, ...).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,
}

impl Entity for Formation {
    const NAME: &'static str = "formation";
}

/// Teaching unit belonging to a formation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Module {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formation_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<u32>,
}

impl Entity for Module {
    const NAME: &'static str = "module";
}

/// Weekly time slot, used by session schedules and teacher availability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeSlot {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

/// Scheduled run of a module with a teacher and a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Session {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formation_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// `à venir`, `en cours`, `terminée`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub schedule: Vec<TimeSlot>,
}

impl Entity for Session {
    const NAME: &'static str = "session";

    fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(format!("end_date ({end}) must be >= start_date ({start})"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Teacher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub specialties: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub hire_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    pub availability: Vec<TimeSlot>,
}

impl Entity for Teacher {
    const NAME: &'static str = "teacher";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Student {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub enrollment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Student {
    /// `first last`, or `None` when both parts are missing.
    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (None, None) => None,
            (first, last) => Some(
                [first.unwrap_or(""), last.unwrap_or("")]
                    .join(" ")
                    .trim()
                    .to_string(),
            ),
        }
    }
}

impl Entity for Student {
    const NAME: &'static str = "student";
}

/// Link between a student and a session, carrying tuition totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Enrollment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entity for Enrollment {
    const NAME: &'static str = "enrollment";
}

/// Settlement state of an invoice, derived from recorded payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[serde(rename = "impayée")]
    Unpaid,
    #[serde(rename = "partielle")]
    Partial,
    #[serde(rename = "payée")]
    Paid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Invoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub due_date: Option<NaiveDate>,
}

impl Entity for Invoice {
    const NAME: &'static str = "invoice";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Payment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<RecordId>,
    /// `espèces`, `mobile money`, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entity for Payment {
    const NAME: &'static str = "payment";
}

/// Presence mark for one enrollment on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "présent")]
    Present,
    #[serde(rename = "absent")]
    Absent,
    #[serde(rename = "retard")]
    Late,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Attendance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    /// Free-text excuse, meaningful for late arrivals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

impl Entity for Attendance {
    const NAME: &'static str = "attendance";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Grade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Missing weight counts as 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Entity for Grade {
    const NAME: &'static str = "grade";

    fn validate(&self) -> Result<(), String> {
        match self.max_value {
            Some(max) if max <= 0.0 => Err(format!("max_value ({max}) must be > 0")),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Certificate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formation_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub completion_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Entity for Certificate {
    const NAME: &'static str = "certificate";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Announcement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// `information`, `urgent`, `événement`, `session ouverte`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `tous`, `étudiants`, `formateurs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub publish_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub expiry_date: Option<NaiveDate>,
}

impl Entity for Announcement {
    const NAME: &'static str = "announcement";
}

/// Optional `YYYY-MM-DD` date where `null`, `""` and blank strings mean unset.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse::<NaiveDate>().map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}
