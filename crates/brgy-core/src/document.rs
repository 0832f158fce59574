//! # Document Kinds
//!
//! The three request types residents can file. The kebab-case wire name is
//! the `documentKind` discriminator carried by every submission payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Discriminator for the document a form produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// Barangay clearance certificate request.
    BarangayClearance,
    /// Community tax certificate (cedula) request.
    Cedula,
    /// Incident report filed with the barangay.
    IncidentReport,
}

impl DocumentKind {
    /// Every kind, in display order.
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::BarangayClearance,
        DocumentKind::Cedula,
        DocumentKind::IncidentReport,
    ];

    /// The wire name used as the `documentKind` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BarangayClearance => "barangay-clearance",
            Self::Cedula => "cedula",
            Self::IncidentReport => "incident-report",
        }
    }

    /// Human-readable title shown above the form.
    pub fn title(&self) -> &'static str {
        match self {
            Self::BarangayClearance => "Barangay Clearance",
            Self::Cedula => "Cedula",
            Self::IncidentReport => "Incident Report",
        }
    }

    /// Whether this kind is a document request (as opposed to a report).
    pub fn is_document_request(&self) -> bool {
        !matches!(self, Self::IncidentReport)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownDocumentKind(s.to_string()))
    }
}
