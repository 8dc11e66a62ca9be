//! Cover categories and their filter labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of content a cover box hides.
///
/// Variants are declared in canonical filter order, so sorting categories
/// (or iterating a `BTreeSet` of them) yields Date, IBAN, Phone-numbers,
/// Emails, Faces, Manual regardless of insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverCategory {
    Date,
    Iban,
    PhoneNumbers,
    Emails,
    Faces,
    Manual,
    Unknown,
}

impl CoverCategory {
    pub const ALL: [CoverCategory; 7] = [
        CoverCategory::Date,
        CoverCategory::Iban,
        CoverCategory::PhoneNumbers,
        CoverCategory::Emails,
        CoverCategory::Faces,
        CoverCategory::Manual,
        CoverCategory::Unknown,
    ];

    /// Wire name used by detection responses.
    pub fn as_str(self) -> &'static str {
        match self {
            CoverCategory::Date => "date",
            CoverCategory::Iban => "iban",
            CoverCategory::PhoneNumbers => "phone-numbers",
            CoverCategory::Emails => "emails",
            CoverCategory::Faces => "faces",
            CoverCategory::Manual => "manual",
            CoverCategory::Unknown => "unknown",
        }
    }

    /// Display label shown on filter chips.
    pub fn label(self) -> &'static str {
        match self {
            CoverCategory::Date => "Date",
            CoverCategory::Iban => "IBAN",
            CoverCategory::PhoneNumbers => "Phone-numbers",
            CoverCategory::Emails => "Emails",
            CoverCategory::Faces => "Faces",
            CoverCategory::Manual => "Manual",
            CoverCategory::Unknown => "Unknown",
        }
    }

    /// Parse a wire name, tolerating the raw entity names `email` and
    /// `phone`. Anything unrecognized is `Unknown`.
    pub fn from_wire(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "date" => CoverCategory::Date,
            "iban" => CoverCategory::Iban,
            "phone-numbers" | "phone" => CoverCategory::PhoneNumbers,
            "emails" | "email" => CoverCategory::Emails,
            "faces" | "face" => CoverCategory::Faces,
            "manual" => CoverCategory::Manual,
            _ => CoverCategory::Unknown,
        }
    }

    /// Parse a filter label (case-insensitive). Wire names are accepted too.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        CoverCategory::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label) || c.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for CoverCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_canonical_order() {
        let set: BTreeSet<_> = [
            CoverCategory::Manual,
            CoverCategory::Faces,
            CoverCategory::Date,
            CoverCategory::Emails,
        ]
        .into_iter()
        .collect();
        let labels: Vec<_> = set.iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["Date", "Emails", "Faces", "Manual"]);
    }

    #[test]
    fn test_from_wire_aliases() {
        assert_eq!(CoverCategory::from_wire("email"), CoverCategory::Emails);
        assert_eq!(CoverCategory::from_wire("phone"), CoverCategory::PhoneNumbers);
        assert_eq!(CoverCategory::from_wire("phone-numbers"), CoverCategory::PhoneNumbers);
        assert_eq!(CoverCategory::from_wire("licence-plate"), CoverCategory::Unknown);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(CoverCategory::from_label("IBAN"), Some(CoverCategory::Iban));
        assert_eq!(CoverCategory::from_label("phone-numbers"), Some(CoverCategory::PhoneNumbers));
        assert_eq!(CoverCategory::from_label(" manual "), Some(CoverCategory::Manual));
        assert_eq!(CoverCategory::from_label("Cats"), None);
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&CoverCategory::PhoneNumbers).unwrap();
        assert_eq!(json, "\"phone-numbers\"");
    }
}
