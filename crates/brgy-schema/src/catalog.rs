//! # Built-in Form Catalog
//!
//! The three request forms residents can file. Each constructor checks its
//! specification through [`FormSpecBuilder::build`](crate::FormSpecBuilder::build),
//! so a malformed catalog entry surfaces as a [`SpecError`] rather than a
//! panic.

use chrono::NaiveDate;

use brgy_core::{DocumentKind, IdentityAttr};

use crate::spec::{DateBound, FieldSpec, FormSpecification, SpecError};

/// Incident categories and their sub-categories, in display order.
pub const INCIDENT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Crime-Related Incidents",
        &[
            "Theft/Burglary",
            "Assault",
            "Vandalism",
            "Illegal Drugs",
            "Trespassing",
            "Scams/Fraud",
        ],
    ),
    (
        "Community Disturbances",
        &[
            "Noise Complaints",
            "Public Intoxication",
            "Disorderly Conduct",
            "Curfew Violations",
        ],
    ),
    (
        "Environmental & Health Concerns",
        &["Garbage Dumping", "Flooding", "Health Hazards", "Fire Incidents"],
    ),
    (
        "Traffic & Road Issues",
        &["Illegal Parking", "Reckless Driving", "Accidents"],
    ),
    (
        "Missing Persons & Lost Items",
        &["Missing Person", "Lost & Found"],
    ),
    (
        "Domestic & Civil Disputes",
        &["Family Disputes", "Land/Property Issues", "Neighbor Conflicts"],
    ),
    (
        "Animal-Related Incidents",
        &["Stray Animals", "Animal Bites"],
    ),
];

pub const CIVIL_STATUSES: &[&str] = &["Single", "Married", "Widowed", "Separated"];

/// Look up the built-in specification for a document kind.
pub fn for_kind(kind: DocumentKind) -> Result<FormSpecification, SpecError> {
    match kind {
        DocumentKind::BarangayClearance => barangay_clearance(),
        DocumentKind::Cedula => cedula(),
        DocumentKind::IncidentReport => incident_report(),
    }
}

pub fn barangay_clearance() -> Result<FormSpecification, SpecError> {
    FormSpecification::builder(DocumentKind::BarangayClearance)
        .field(FieldSpec::text("name", "Full Name").required().locked(IdentityAttr::Name))
        .field(FieldSpec::email("email", "Email").locked(IdentityAttr::Email))
        .field(
            FieldSpec::text("barangay", "Barangay")
                .required()
                .locked(IdentityAttr::Barangay),
        )
        .field(
            FieldSpec::text("purpose", "Purpose")
                .required()
                .min_length(5)
                .max_length(200)
                .placeholder("Enter purpose for clearance"),
        )
        .field(
            FieldSpec::tel("contactNumber", "Contact Number")
                .required()
                .placeholder("Enter your contact number"),
        )
        .field(birth_date())
        .build()
}

pub fn cedula() -> Result<FormSpecification, SpecError> {
    FormSpecification::builder(DocumentKind::Cedula)
        .field(FieldSpec::text("name", "Full Name").required().locked(IdentityAttr::Name))
        .field(birth_date())
        .field(
            FieldSpec::text("placeOfBirth", "Place of Birth")
                .required()
                .placeholder("Enter place of birth"),
        )
        .field(
            FieldSpec::text("barangay", "Barangay")
                .required()
                .locked(IdentityAttr::Barangay),
        )
        .field(
            FieldSpec::select("civilStatus", "Civil Status", CIVIL_STATUSES.iter().copied())
                .required()
                .placeholder("Select civil status"),
        )
        .field(
            FieldSpec::text("occupation", "Occupation")
                .required()
                .placeholder("Enter occupation"),
        )
        .field(
            FieldSpec::text("employerName", "Employer Name (if employed)")
                .placeholder("Enter employer name"),
        )
        .field(
            FieldSpec::text("employerAddress", "Employer Address")
                .placeholder("Enter employer address"),
        )
        .field(
            FieldSpec::text("incomeSource", "Source of Income")
                .required()
                .placeholder("Enter source of income"),
        )
        .field(
            FieldSpec::number("grossAnnualIncome", "Gross Annual Income")
                .required()
                .min(0.0)
                .placeholder("Enter gross annual income"),
        )
        .field(
            FieldSpec::number("businessGrossSales", "Business Gross Sales (if applicable)")
                .min(0.0)
                .placeholder("Enter business gross sales"),
        )
        .field(
            FieldSpec::number("realEstateIncome", "Real Estate Income (if applicable)")
                .min(0.0)
                .placeholder("Enter real estate income"),
        )
        .field(
            FieldSpec::text("validId", "Valid ID Information")
                .required()
                .placeholder("Enter valid ID information"),
        )
        .build()
}

pub fn incident_report() -> Result<FormSpecification, SpecError> {
    FormSpecification::builder(DocumentKind::IncidentReport)
        .field(
            FieldSpec::select(
                "category",
                "Incident Category",
                INCIDENT_CATEGORIES.iter().map(|(category, _)| *category),
            )
            .required()
            .placeholder("Select category"),
        )
        .field(
            FieldSpec::dependent_select(
                "subCategory",
                "Sub-category",
                "category",
                INCIDENT_CATEGORIES
                    .iter()
                    .map(|(category, subs)| (*category, subs.iter().copied())),
            )
            .required()
            .placeholder("Select sub-category"),
        )
        .field(
            FieldSpec::date("date", "Date of Incident")
                .required()
                .latest(DateBound::Today),
        )
        .field(FieldSpec::time("time", "Time of Incident").required())
        .field(
            FieldSpec::text("location", "Location of Incident")
                .required()
                .defaulted(IdentityAttr::Barangay)
                .placeholder("Enter the incident location"),
        )
        .field(
            FieldSpec::text("description", "Description of Incident")
                .required()
                .min_length(10)
                .placeholder("Provide details about the incident"),
        )
        .field(
            FieldSpec::text("reporterName", "Your Name")
                .required()
                .defaulted(IdentityAttr::Name)
                .placeholder("Enter your full name"),
        )
        .field(
            FieldSpec::text("reporterContact", "Your Contact Information")
                .required()
                .placeholder("Enter your phone number or email"),
        )
        .field(FieldSpec::files("evidence", "Upload Evidence (optional)"))
        .build()
}

fn birth_date() -> FieldSpec {
    let field = FieldSpec::date("dateOfBirth", "Date of Birth")
        .required()
        .latest(DateBound::Today);
    match NaiveDate::from_ymd_opt(1900, 1, 1) {
        Some(earliest) => field.earliest(DateBound::Fixed(earliest)),
        None => field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{allowed_values, on_field_change, validate_on, FieldKind};
    use brgy_core::{FieldKey, FieldValue, FormState};

    fn key(s: &str) -> FieldKey {
        FieldKey::new(s).unwrap()
    }

    #[test]
    fn every_kind_has_a_valid_spec() {
        for kind in DocumentKind::ALL {
            let spec = for_kind(kind).unwrap();
            assert_eq!(spec.document_kind(), kind);
        }
    }

    #[test]
    fn clearance_identity_fields_are_locked() {
        let spec = barangay_clearance().unwrap();
        for k in ["name", "email", "barangay"] {
            assert!(spec.field(k).unwrap().is_read_only(), "{k} should be locked");
        }
        assert!(!spec.field("purpose").unwrap().is_read_only());
    }

    #[test]
    fn incident_reporter_fields_are_editable_defaults() {
        let spec = incident_report().unwrap();
        for k in ["location", "reporterName"] {
            let field = spec.field(k).unwrap();
            assert!(field.binding.is_some());
            assert!(!field.is_read_only());
        }
        assert_eq!(spec.file_fields().count(), 1);
    }

    #[test]
    fn subcategories_follow_category() {
        let spec = incident_report().unwrap();
        let mut state = FormState::new();
        state.insert(key("category"), "Traffic & Road Issues".into());
        let allowed = allowed_values(&spec, "subCategory", &state);
        assert_eq!(
            allowed.options(),
            ["Illegal Parking", "Reckless Driving", "Accidents"]
        );

        state.insert(key("subCategory"), "Accidents".into());
        state.insert(key("category"), "Animal-Related Incidents".into());
        let state = on_field_change(&spec, &state, "category");
        assert!(!state.contains("subCategory"));
    }

    #[test]
    fn cedula_sample_is_valid() {
        let spec = cedula().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let state: FormState = [
            ("name", "Juan Dela Cruz"),
            ("barangay", "San Isidro"),
            ("dateOfBirth", "1990-05-01"),
            ("placeOfBirth", "Quezon City"),
            ("civilStatus", "Married"),
            ("occupation", "Teacher"),
            ("incomeSource", "Salary"),
            ("grossAnnualIncome", "250000"),
            ("validId", "UMID 0111-2222333-4"),
        ]
        .into_iter()
        .map(|(k, v)| (key(k), FieldValue::from(v)))
        .collect();
        let result = validate_on(&spec, &state, today);
        assert!(result.is_valid(), "{result:?}");
        assert_eq!(spec.field("civilStatus").unwrap().kind, FieldKind::Select);
    }

    #[test]
    fn incident_date_cannot_be_in_the_future() {
        let spec = incident_report().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut state = FormState::new();
        state.insert(key("date"), "2024-06-16".into());
        let result = validate_on(&spec, &state, today);
        assert!(result.get("date").unwrap().contains("cannot be after"));
    }
}
