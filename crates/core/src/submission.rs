//! Job submission normalization.
//!
//! Turns loosely typed request fields (JSON or multipart form) into a
//! validated [`NewJob`]. Invalid fields are collected rather than failing on
//! the first one, so a client can fix everything in one round trip. A
//! required key that is absent altogether is reported separately.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::error::CoreError;
use crate::id0::{is_id0, Id0};
use crate::job::{ConsoleModel, JobPayload, NewJob};
use crate::mii::{extract_mii, normalize_mii_base64, MiiUpload};

/// Earliest accepted console manufacture year.
pub const MIN_YEAR: i64 = 2011;

/// Latest accepted console manufacture year.
pub const MAX_YEAR: i64 = 2020;

/// Size of a `movable_part1.sed` blob in bytes.
pub const PART1_DATA_LEN: usize = 0x1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Missing parameter '{0}'")]
    MissingField(&'static str),

    #[error("invalid:{}", .0.join(","))]
    InvalidFields(Vec<&'static str>),

    #[error("Submission must be a JSON object")]
    NotAnObject,
}

impl From<SubmissionError> for CoreError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::InvalidFields(fields) => {
                CoreError::InvalidFields(fields.into_iter().map(str::to_string).collect())
            }
            other => CoreError::Validation(other.to_string()),
        }
    }
}

/// Raw submission fields, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFields {
    pub id0: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub mii_data: Option<String>,
    pub part1_data: Option<String>,
}

impl SubmissionFields {
    /// Read fields from a JSON object. Numbers are accepted wherever text
    /// is, and `null` counts as absent.
    pub fn from_json(value: &Value) -> Result<Self, SubmissionError> {
        let obj = value.as_object().ok_or(SubmissionError::NotAnObject)?;
        let text = |key: &str| match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        Ok(Self {
            id0: text("id0"),
            model: text("model"),
            year: text("year"),
            mii_data: text("mii_data"),
            part1_data: text("part1_data"),
        })
    }

    /// Record a multipart text field. Unknown names are ignored.
    pub fn set_form_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "id0" => &mut self.id0,
            "model" => &mut self.model,
            "year" => &mut self.year,
            "mii_data" => &mut self.mii_data,
            "part1_data" => &mut self.part1_data,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// Validate a full mii job.
///
/// A non-empty `upload` takes precedence over `mii_data`.
pub fn normalize_mii_submission(
    fields: &SubmissionFields,
    upload: Option<&MiiUpload>,
) -> Result<NewJob, SubmissionError> {
    let id0 = fields
        .id0
        .as_deref()
        .ok_or(SubmissionError::MissingField("id0"))?;
    let model = fields
        .model
        .as_deref()
        .ok_or(SubmissionError::MissingField("model"))?;

    let mut invalid = Vec::new();

    if !is_id0(id0) {
        invalid.push("id0");
    }

    let model = ConsoleModel::from_name(&model.trim().to_lowercase());
    if model.is_none() {
        invalid.push("model");
    }

    let year = match parse_year(fields.year.as_deref()) {
        Ok(year) => year,
        Err(()) => {
            invalid.push("year");
            None
        }
    };

    let mii_data = match upload.filter(|u| !u.bytes.is_empty()) {
        Some(upload) => extract_mii(upload),
        None => fields.mii_data.as_deref().and_then(normalize_mii_base64),
    };
    if mii_data.is_none() {
        invalid.push("mii");
    }

    match (Id0::parse(id0), model, mii_data) {
        (Ok(id0), Some(model), Some(mii_data)) if invalid.is_empty() => Ok(NewJob {
            id0,
            payload: JobPayload::Mii {
                model,
                year,
                mii_data,
            },
        }),
        _ => Err(SubmissionError::InvalidFields(invalid)),
    }
}

/// Validate a resumed job carrying a previously computed part1 blob.
pub fn normalize_part1_submission(fields: &SubmissionFields) -> Result<NewJob, SubmissionError> {
    let id0 = fields
        .id0
        .as_deref()
        .ok_or(SubmissionError::MissingField("id0"))?;
    let part1 = fields
        .part1_data
        .as_deref()
        .ok_or(SubmissionError::MissingField("part1_data"))?;

    let mut invalid = Vec::new();
    let id0 = Id0::parse(id0).ok();
    if id0.is_none() {
        invalid.push("id0");
    }

    let part1_data = STANDARD
        .decode(part1.trim())
        .ok()
        .filter(|raw| raw.len() == PART1_DATA_LEN)
        .map(|raw| STANDARD.encode(raw));
    if part1_data.is_none() {
        invalid.push("part1");
    }

    match (id0, part1_data) {
        (Some(id0), Some(part1_data)) => Ok(NewJob {
            id0,
            payload: JobPayload::Part1 { part1_data },
        }),
        _ => Err(SubmissionError::InvalidFields(invalid)),
    }
}

/// Parse an optional year. Blank counts as absent.
fn parse_year(raw: Option<&str>) -> Result<Option<u16>, ()> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let year: i64 = raw.parse().map_err(|_| ())?;
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(Some(year as u16))
    } else {
        Err(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::mii::tests::{qr_png, sample_mii};

    const ID0: &str = "0123456789ABCDEF0123456789ABCDE0";

    fn mii_b64() -> String {
        STANDARD.encode(sample_mii())
    }

    fn valid_fields() -> SubmissionFields {
        SubmissionFields {
            id0: Some(ID0.into()),
            model: Some("old".into()),
            year: Some("2015".into()),
            mii_data: Some(mii_b64()),
            part1_data: None,
        }
    }

    #[test]
    fn valid_json_submission_normalizes() {
        let body = json!({ "id0": ID0, "model": "OLD", "year": 2015, "mii_data": mii_b64() });
        let fields = SubmissionFields::from_json(&body).unwrap();
        let job = normalize_mii_submission(&fields, None).unwrap();

        assert_eq!(job.id0.as_str(), ID0.to_ascii_lowercase());
        assert_eq!(
            job.payload,
            JobPayload::Mii {
                model: ConsoleModel::Old,
                year: Some(2015),
                mii_data: mii_b64(),
            }
        );
    }

    #[test]
    fn year_is_optional() {
        let fields = SubmissionFields {
            year: None,
            ..valid_fields()
        };
        assert!(normalize_mii_submission(&fields, None).is_ok());

        let blank = SubmissionFields {
            year: Some("".into()),
            ..valid_fields()
        };
        assert!(normalize_mii_submission(&blank, None).is_ok());
    }

    #[test]
    fn all_invalid_fields_are_reported_together() {
        let fields = SubmissionFields {
            id0: Some("xyz".into()),
            model: Some("medium".into()),
            year: Some("2009".into()),
            mii_data: Some("AAAA".into()),
            part1_data: None,
        };
        let err = normalize_mii_submission(&fields, None).unwrap_err();
        assert_eq!(
            err,
            SubmissionError::InvalidFields(vec!["id0", "model", "year", "mii"])
        );
        assert_eq!(err.to_string(), "invalid:id0,model,year,mii");
    }

    #[test]
    fn non_numeric_year_is_invalid() {
        let fields = SubmissionFields {
            year: Some("twenty".into()),
            ..valid_fields()
        };
        assert_matches!(
            normalize_mii_submission(&fields, None),
            Err(SubmissionError::InvalidFields(f)) if f == vec!["year"]
        );
    }

    #[test]
    fn year_bounds_are_inclusive() {
        for year in ["2011", "2020"] {
            let fields = SubmissionFields {
                year: Some(year.into()),
                ..valid_fields()
            };
            assert!(normalize_mii_submission(&fields, None).is_ok(), "{year}");
        }
    }

    #[test]
    fn missing_required_key_is_distinct_from_invalid() {
        let fields = SubmissionFields {
            model: None,
            ..valid_fields()
        };
        assert_eq!(
            normalize_mii_submission(&fields, None).unwrap_err(),
            SubmissionError::MissingField("model")
        );
    }

    #[test]
    fn missing_mii_is_invalid_not_missing() {
        let fields = SubmissionFields {
            mii_data: None,
            ..valid_fields()
        };
        assert_eq!(
            normalize_mii_submission(&fields, None).unwrap_err(),
            SubmissionError::InvalidFields(vec!["mii"])
        );
    }

    #[test]
    fn qr_upload_supplies_mii() {
        let fields = SubmissionFields {
            mii_data: None,
            ..valid_fields()
        };
        let upload = MiiUpload {
            filename: Some("mii.png".into()),
            content_type: Some("image/png".into()),
            bytes: qr_png(&sample_mii()),
        };
        let job = normalize_mii_submission(&fields, Some(&upload)).unwrap();
        assert_matches!(job.payload, JobPayload::Mii { mii_data, .. } if mii_data == mii_b64());
    }

    #[test]
    fn unreadable_upload_reports_missing_mii() {
        let upload = MiiUpload {
            filename: Some("mii.jpg".into()),
            content_type: Some("image/jpeg".into()),
            bytes: b"not really a jpeg".to_vec(),
        };
        assert_eq!(
            normalize_mii_submission(&valid_fields(), Some(&upload)).unwrap_err(),
            SubmissionError::InvalidFields(vec!["mii"])
        );
    }

    #[test]
    fn empty_upload_falls_back_to_mii_data() {
        let upload = MiiUpload::default();
        assert!(normalize_mii_submission(&valid_fields(), Some(&upload)).is_ok());
    }

    #[test]
    fn form_fields_are_collected_by_name() {
        let mut fields = SubmissionFields::default();
        fields.set_form_field("id0", ID0.into());
        fields.set_form_field("model", "new".into());
        fields.set_form_field("unrelated", "x".into());
        assert_eq!(fields.id0.as_deref(), Some(ID0));
        assert_eq!(fields.model.as_deref(), Some("new"));
        assert_eq!(fields.year, None);
    }

    #[test]
    fn json_must_be_an_object() {
        assert_eq!(
            SubmissionFields::from_json(&json!([1, 2])).unwrap_err(),
            SubmissionError::NotAnObject
        );
    }

    #[test]
    fn part1_submission_requires_exact_length() {
        let good = SubmissionFields {
            id0: Some(ID0.into()),
            part1_data: Some(STANDARD.encode(vec![0u8; PART1_DATA_LEN])),
            ..SubmissionFields::default()
        };
        let job = normalize_part1_submission(&good).unwrap();
        assert_matches!(job.payload, JobPayload::Part1 { .. });

        let short = SubmissionFields {
            part1_data: Some(STANDARD.encode(vec![0u8; 10])),
            ..good
        };
        assert_eq!(
            normalize_part1_submission(&short).unwrap_err(),
            SubmissionError::InvalidFields(vec!["part1"])
        );
    }

    #[test]
    fn invalid_fields_convert_to_core_error() {
        let err: CoreError = SubmissionError::InvalidFields(vec!["id0", "mii"]).into();
        assert_matches!(err, CoreError::InvalidFields(f) if f == vec!["id0", "mii"]);
    }
}
