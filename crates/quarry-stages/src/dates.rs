//! `dates`: Solr date fields for every EDTF field in the document
//!
//! For each `{name}__edtf` field this adds `{name}__dt` plus the
//! `__dt_is_uncertain`, `__dt_is_approximate` and
//! `__dt_is_uncertain_and_approximate` flags. Values that cannot be parsed,
//! or that Solr cannot represent, are logged and skipped.

use crate::edtf::{solr_date, EdtfError};
use quarry_core::{Fields, PipelineContext, StageError};
use serde_json::Value;
use tracing::warn;

const EDTF_SUFFIX: &str = "__edtf";

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let mut fields = Fields::new();

    for (key, value) in ctx.doc.iter() {
        let Some(name) = key.strip_suffix(EDTF_SUFFIX) else {
            continue;
        };
        let edtf = match value {
            Value::String(s) => s.as_str(),
            Value::Array(items) => match items.first().and_then(Value::as_str) {
                Some(s) => s,
                None => continue,
            },
            _ => continue,
        };

        match solr_date(edtf) {
            Ok(date) => {
                fields.insert(format!("{name}__dt"), Value::from(date.value));
                fields.insert(
                    format!("{name}__dt_is_uncertain"),
                    Value::Bool(date.is_uncertain),
                );
                fields.insert(
                    format!("{name}__dt_is_approximate"),
                    Value::Bool(date.is_approximate),
                );
                fields.insert(
                    format!("{name}__dt_is_uncertain_and_approximate"),
                    Value::Bool(date.is_uncertain_and_approximate),
                );
            }
            Err(EdtfError::Unsupported { reason, .. }) => {
                warn!("Cannot convert \"{edtf}\" in field {key} to a Solr date: {reason}")
            }
            Err(EdtfError::Parse(_)) => {
                warn!("Cannot parse \"{edtf}\" in field {key} as an EDTF string")
            }
        }
    }

    Ok(fields)
}
