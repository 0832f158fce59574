//! # Submit Subcommand
//!
//! Fills a form through the guided form controller and submits it:
//!
//! ```text
//! brgy submit incident-report \
//!     --data '{"category":"Noise Complaint","subCategory":"Loud Music",...}' \
//!     --evidence photo.jpg --evidence video.mp4
//! ```
//!
//! Identity-bound fields come from the session. Values in `--data` are
//! applied in declaration order, so a dependent select may be given in the
//! same object as the field it depends on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use brgy_client::{ApiClient, ApiConfig};
use brgy_core::{DocumentKind, FieldValue, FileHandle};
use brgy_form::{GuidedForm, HttpGateway, SessionStore, SubmitOutcome};
use brgy_schema::{catalog, FormSpecification};

/// Arguments for the `brgy submit` subcommand.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Document kind: barangay-clearance, cedula or incident-report.
    pub kind: DocumentKind,

    /// Field values as a JSON object keyed by field key.
    #[arg(long, default_value = "{}")]
    pub data: String,

    /// Files to attach as evidence, in order.
    #[arg(long)]
    pub evidence: Vec<PathBuf>,
}

pub async fn run_submit(args: &SubmitArgs, session_path: &Path) -> Result<u8> {
    let config = ApiConfig::from_env().context("loading gateway configuration")?;
    submit_with(args, config, session_path).await
}

/// Submit against the gateway at `config`.
pub async fn submit_with(args: &SubmitArgs, config: ApiConfig, session_path: &Path) -> Result<u8> {
    let spec = catalog::for_kind(args.kind)?;
    let values = parse_data(&args.data)?;

    let session = Arc::new(
        SessionStore::open(session_path)
            .with_context(|| format!("opening session {}", session_path.display()))?,
    );
    if !session.is_signed_in() {
        tracing::warn!("no session token; the gateway will refuse the submission");
    }
    // A logout from another shell while we submit must reach the form.
    let _watch = match SessionStore::watch(&session) {
        Ok(watch) => Some(watch),
        Err(e) => {
            tracing::warn!("session changes will not be picked up: {e}");
            None
        }
    };
    let gateway = HttpGateway::new(ApiClient::new(config)?, session.clone());
    let mut form = GuidedForm::builder(spec, session, Arc::new(gateway)).build();

    fill(&mut form, values, &args.evidence)?;

    match form.submit().await {
        SubmitOutcome::Succeeded(receipt) => {
            println!("OK: {} submitted", args.kind.title());
            if let Some(message) = receipt.message {
                println!("  {message}");
            }
            if let Some(id) = receipt.id {
                println!("  Reference: {id}");
            }
            Ok(0)
        }
        SubmitOutcome::Invalid(errors) => {
            eprintln!("INVALID: {} field(s) need attention", errors.len());
            for (key, message) in errors.iter() {
                eprintln!("  {key}: {message}");
            }
            Ok(2)
        }
        SubmitOutcome::Failed { reason } => {
            eprintln!("FAILED: {reason}");
            Ok(1)
        }
        SubmitOutcome::Rejected => {
            eprintln!("FAILED: a submission is already in progress");
            Ok(1)
        }
    }
}

/// Parse `--data` into field values. Strings stay text, arrays of strings
/// become lists, numbers and booleans are stringified, `null` unsets.
pub fn parse_data(raw: &str) -> Result<Vec<(String, FieldValue)>> {
    let value: Value = serde_json::from_str(raw).context("--data is not valid JSON")?;
    let Value::Object(map) = value else {
        bail!("--data must be a JSON object");
    };
    map.into_iter()
        .map(|(key, value)| {
            let field = match value {
                Value::String(s) => FieldValue::Text(s),
                Value::Number(n) => FieldValue::Text(n.to_string()),
                Value::Bool(b) => FieldValue::Text(b.to_string()),
                Value::Null => FieldValue::Text(String::new()),
                Value::Array(items) => FieldValue::List(
                    items
                        .into_iter()
                        .map(|item| match item {
                            Value::String(s) => Ok(s),
                            other => bail!("{key}: list items must be strings, got {other}"),
                        })
                        .collect::<Result<_>>()?,
                ),
                Value::Object(_) => bail!("{key}: nested objects are not field values"),
            };
            Ok((key, field))
        })
        .collect()
}

fn fill(form: &mut GuidedForm, mut values: Vec<(String, FieldValue)>, evidence: &[PathBuf]) -> Result<()> {
    let spec: &FormSpecification = form.spec();
    let unknown: Vec<&str> = values
        .iter()
        .map(|(key, _)| key.as_str())
        .filter(|key| spec.field(key).is_none())
        .collect();
    if !unknown.is_empty() {
        bail!("not fields of {}: {}", spec.document_kind(), unknown.join(", "));
    }
    let order: Vec<String> = spec.fields().iter().map(|f| f.key.to_string()).collect();
    let file_field = spec.file_fields().next().map(|f| f.key.to_string());
    values.sort_by_key(|(key, _)| order.iter().position(|k| k == key));

    for (key, value) in values {
        form.set_field(&key, value).with_context(|| format!("setting {key}"))?;
    }

    if !evidence.is_empty() {
        let Some(file_field) = file_field else {
            bail!("{} does not accept evidence files", form.spec().document_kind());
        };
        let handles: Vec<FileHandle> = evidence.iter().map(FileHandle::from_path).collect();
        form.set_field(&file_field, handles)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars_and_lists() {
        let values = parse_data(r#"{"a":"x","b":3,"c":["p","q"],"d":null}"#).unwrap();
        assert_eq!(
            values,
            vec![
                ("a".to_string(), FieldValue::Text("x".into())),
                ("b".to_string(), FieldValue::Text("3".into())),
                ("c".to_string(), FieldValue::List(vec!["p".into(), "q".into()])),
                ("d".to_string(), FieldValue::Text(String::new())),
            ]
        );
    }

    #[test]
    fn rejects_non_objects() {
        assert!(parse_data("[1,2]").is_err());
        assert!(parse_data(r#"{"a":{"b":1}}"#).is_err());
        assert!(parse_data(r#"{"a":[1]}"#).is_err());
        assert!(parse_data("not json").is_err());
    }
}
