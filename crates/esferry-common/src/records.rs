//! Document record helpers
//!
//! Transferred documents are untyped JSON objects. The helpers here cover the
//! two fields the pipeline actually interprets: the unique job identifier and
//! the epoch-seconds date fields that downstream consumers expect in
//! milliseconds.

use crate::error::{Result, TransferError};
use serde_json::Value;

/// A job-monitoring record as stored in Elasticsearch (`_source` object)
pub type Document = serde_json::Map<String, Value>;

/// Field holding the unique job identifier, used as the broker message id
pub const GLOBAL_JOB_ID_FIELD: &str = "GlobalJobId";

/// Date fields stored as epoch seconds at the source but consumed as epoch
/// milliseconds downstream. Values in these fields are multiplied by 1000
/// exactly once, immediately before publishing.
pub const EPOCH_DATE_FIELDS: [&str; 22] = [
    "ChirpCMSSWLastUpdate",
    "CompletionDate",
    "DataCollectionDate",
    "EnteredCurrentStatus",
    "GLIDEIN_ToDie",
    "GLIDEIN_ToRetire",
    "JobCurrentStartDate",
    "JobCurrentStartExecutingDate",
    "JobCurrentStartTransferOutputDate",
    "JobFinishedHookDone",
    "JobLastStartDate",
    "JobStartDate",
    "LastJobLeaseRenewal",
    "LastMatchTime",
    "LastRemoteStatusUpdate",
    "LastSuspensionTime",
    "LastVacateTime_RAW",
    "QDate",
    "RecordTime",
    "ShadowBday",
    "StageInFinish",
    "StageInStart",
];

/// Convert the known epoch-seconds date fields of a document to milliseconds.
///
/// Missing fields are skipped; non-numeric values (nulls, strings) are left
/// untouched, matching how the upstream producers sometimes emit placeholder
/// values in these slots. Integer precision is preserved.
pub fn convert_dates_to_millis(doc: &mut Document) {
    for field in EPOCH_DATE_FIELDS {
        if let Some(value) = doc.get_mut(field) {
            if let Some(millis) = times_thousand(value) {
                *value = millis;
            }
        }
    }
}

/// Multiply a numeric JSON value by 1000, preserving integer-ness.
///
/// Returns None when the value is not numeric or the result is not
/// representable, in which case the caller leaves the original in place.
fn times_thousand(value: &Value) -> Option<Value> {
    let n = value.as_number()?;
    if let Some(i) = n.as_i64() {
        return i.checked_mul(1000).map(Value::from);
    }
    if let Some(u) = n.as_u64() {
        return u.checked_mul(1000).map(Value::from);
    }
    let f = n.as_f64()?;
    serde_json::Number::from_f64(f * 1000.0).map(Value::Number)
}

/// Extract the unique job identifier from a document.
///
/// Every published record must carry one; a document without it (or with a
/// non-string value) fails the unit of work rather than getting published
/// with a broken message id.
pub fn global_job_id(doc: &Document) -> Result<&str> {
    match doc.get(GLOBAL_JOB_ID_FIELD) {
        Some(Value::String(id)) => Ok(id),
        Some(other) => Err(TransferError::malformed(format!(
            "{} is not a string (got {})",
            GLOBAL_JOB_ID_FIELD, other
        ))),
        None => Err(TransferError::malformed(format!(
            "document has no {} field",
            GLOBAL_JOB_ID_FIELD
        ))),
    }
}
