//! Core record type for flamlog.
//!
//! A [`Record`] is one material's flammability-test result. Every field is
//! free-form text; the only checks made are that each field is present and
//! that it can be stored in the backing file's encoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of columns in a record.
pub const COLUMN_COUNT: usize = 15;

/// The fixed column set, in on-disk order.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "material_name",
    "material_type",
    "thickness",
    "density",
    "flammability_rating",
    "ignition_temp",
    "burn_time",
    "heat_release_rate",
    "smoke_production",
    "toxicity",
    "regulations",
    "use_case",
    "manufacturer",
    "flammability_class",
    "pass_fail",
];

/// One material's flammability-test data row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Trade or common name of the material.
    pub material_name: String,
    /// Material family (foam, textile, board, ...).
    pub material_type: String,
    /// Sample thickness as recorded.
    pub thickness: String,
    /// Sample density as recorded.
    pub density: String,
    /// Flammability rating reported by the test.
    pub flammability_rating: String,
    /// Ignition temperature.
    pub ignition_temp: String,
    /// Burn time.
    pub burn_time: String,
    /// Peak heat release rate.
    pub heat_release_rate: String,
    /// Smoke production.
    pub smoke_production: String,
    /// Toxicity of combustion products.
    pub toxicity: String,
    /// Regulations the test was run against.
    pub regulations: String,
    /// Intended use of the material.
    pub use_case: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Flammability class (e.g. `Low`, `Medium`, `High`).
    pub flammability_class: String,
    /// Recorded pass/fail outcome.
    pub pass_fail: String,
}

impl Record {
    /// Build a record by asking `lookup` for each column in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] for the first column `lookup` cannot
    /// supply. No partial record is produced.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(COLUMN_COUNT);
        for column in COLUMNS {
            values.push(lookup(column).ok_or_else(|| Error::missing_field(column))?);
        }
        Ok(Self::from_values(values))
    }

    /// Build a record from submitted form fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if any of the fifteen columns is absent.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|name| form.get(name).cloned())
    }

    /// Build a record from exactly [`COLUMN_COUNT`] values in column order.
    fn from_values(values: Vec<String>) -> Self {
        let mut it = values.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Self {
            material_name: next(),
            material_type: next(),
            thickness: next(),
            density: next(),
            flammability_rating: next(),
            ignition_temp: next(),
            burn_time: next(),
            heat_release_rate: next(),
            smoke_production: next(),
            toxicity: next(),
            regulations: next(),
            use_case: next(),
            manufacturer: next(),
            flammability_class: next(),
            pass_fail: next(),
        }
    }

    /// Field values in column order.
    #[must_use]
    pub fn fields(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.material_name,
            &self.material_type,
            &self.thickness,
            &self.density,
            &self.flammability_rating,
            &self.ignition_temp,
            &self.burn_time,
            &self.heat_release_rate,
            &self.smoke_production,
            &self.toxicity,
            &self.regulations,
            &self.use_case,
            &self.manufacturer,
            &self.flammability_class,
            &self.pass_fail,
        ]
    }

    /// Pairs of `(column, value)` in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &str)> {
        COLUMNS.into_iter().zip(self.fields())
    }

    /// Check whether any field contains `needle_lower` as a substring,
    /// ignoring case. The needle must already be lowercased.
    #[must_use]
    pub fn matches_lowercase(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty()
            || self
                .fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle_lower))
    }

    /// Check whether any field contains `query`, ignoring case.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        self.matches_lowercase(&query.to_lowercase())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a fully populated record for tests.
    pub(crate) fn sample_record(name: &str, class: &str) -> Record {
        Record {
            material_name: name.to_string(),
            material_type: "Foam".to_string(),
            thickness: "25mm".to_string(),
            density: "30".to_string(),
            flammability_rating: "B1".to_string(),
            ignition_temp: "350".to_string(),
            burn_time: "45".to_string(),
            heat_release_rate: "120".to_string(),
            smoke_production: "Moderate".to_string(),
            toxicity: "Low".to_string(),
            regulations: "EN 13501-1".to_string(),
            use_case: "Upholstery".to_string(),
            manufacturer: "Acme Materials".to_string(),
            flammability_class: class.to_string(),
            pass_fail: if class == "Low" { "Pass" } else { "Fail" }.to_string(),
        }
    }

    fn full_form() -> HashMap<String, String> {
        COLUMNS
            .iter()
            .map(|c| ((*c).to_string(), format!("{c}-value")))
            .collect()
    }

    #[test]
    fn test_columns_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for column in COLUMNS {
            assert!(seen.insert(column), "duplicate column {column}");
        }
    }

    #[test]
    fn test_from_form_complete() {
        let record = Record::from_form(&full_form()).unwrap();
        assert_eq!(record.material_name, "material_name-value");
        assert_eq!(record.pass_fail, "pass_fail-value");
        for (column, value) in record.columns() {
            assert_eq!(value, format!("{column}-value"));
        }
    }

    #[test]
    fn test_from_form_missing_field() {
        let mut form = full_form();
        form.remove("toxicity");

        let err = Record::from_form(&form).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field } if field == "toxicity"));
    }

    #[test]
    fn test_from_form_empty_value_is_present() {
        let mut form = full_form();
        form.insert("burn_time".to_string(), String::new());

        let record = Record::from_form(&form).unwrap();
        assert_eq!(record.burn_time, "");
    }

    #[test]
    fn test_from_form_ignores_extra_fields() {
        let mut form = full_form();
        form.insert("csrf".to_string(), "zzz".to_string());
        assert!(Record::from_form(&form).is_ok());
    }

    #[test]
    fn test_fields_order_matches_columns() {
        let record = sample_record("Foam A", "Low");
        let fields = record.fields();
        assert_eq!(fields[0], "Foam A");
        assert_eq!(fields[13], "Low");
        assert_eq!(fields[14], "Pass");
    }

    #[test]
    fn test_matches_case_insensitive() {
        let record = sample_record("Foam A", "Low");
        assert!(record.matches("foam"));
        assert!(record.matches("FOAM a"));
        assert!(record.matches("acme"));
        assert!(record.matches("13501"));
    }

    #[test]
    fn test_matches_empty_query() {
        assert!(Record::default().matches(""));
    }

    #[test]
    fn test_matches_no_hit() {
        let record = sample_record("Foam A", "Low");
        assert!(!record.matches("polycarbonate"));
    }

    #[test]
    fn test_matches_non_ascii() {
        let mut record = sample_record("Mousse Ignifugée", "Low");
        record.manufacturer = "Société Générale des Matériaux".to_string();
        assert!(record.matches("IGNIFUGÉE"));
        assert!(record.matches("société"));
    }
}
