//! # Spec Subcommand
//!
//! Prints the built-in specification of a document kind as JSON.

use anyhow::{Context, Result};
use clap::Args;

use brgy_core::DocumentKind;
use brgy_schema::catalog;

/// Arguments for the `brgy spec` subcommand.
#[derive(Args, Debug)]
pub struct SpecArgs {
    /// Document kind: barangay-clearance, cedula or incident-report.
    pub kind: DocumentKind,
}

pub fn run_spec(args: &SpecArgs) -> Result<u8> {
    println!("{}", render_spec(args.kind)?);
    Ok(0)
}

pub fn render_spec(kind: DocumentKind) -> Result<String> {
    let spec = catalog::for_kind(kind).with_context(|| format!("building {kind} specification"))?;
    Ok(serde_json::to_string_pretty(&spec)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_kind() {
        for kind in DocumentKind::ALL {
            let json: serde_json::Value = serde_json::from_str(&render_spec(kind).unwrap()).unwrap();
            assert_eq!(json["documentKind"], kind.as_str());
            assert!(!json["fields"].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn incident_spec_lists_evidence_as_files() {
        let json: serde_json::Value =
            serde_json::from_str(&render_spec(DocumentKind::IncidentReport).unwrap()).unwrap();
        let evidence = json["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["key"] == "evidence")
            .unwrap();
        assert_eq!(evidence["kind"], "file[]");
    }
}
