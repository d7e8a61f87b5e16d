//! One-hot category families and their schema-derived encoding table.
//!
//! Each family is declared once: column prefix, the values the intake form
//! offers, and which column absorbs values the frozen schema dropped. The
//! table mapping a value to a column is built from the schema at load time,
//! because which category was dropped as the baseline depends on the
//! specific training run.

use crate::schema::FeatureSchema;
use std::collections::HashMap;
use tracing::debug;

pub const DIAGNOSIS_GROUPS: &[&str] = &[
    "Circulatory",
    "Diabetes",
    "Digestive",
    "Genitourinary",
    "Injury",
    "Musculoskeletal",
    "Neoplasms",
    "Other",
    "Respiratory",
];

/// HbA1c value meaning no test was taken
pub const NO_HBA1C_TEST: &str = "No_HbA1c_Test";

/// Categorical attributes that expand into one-hot column groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Gender,
    Race,
    AgeGroup,
    PrimaryDiagnosis,
    SecondaryDiagnosis,
    TertiaryDiagnosis,
    HbA1c,
    DiabetesMed,
    PayerCode,
}

impl Family {
    pub const ALL: [Family; 9] = [
        Family::Gender,
        Family::Race,
        Family::AgeGroup,
        Family::PrimaryDiagnosis,
        Family::SecondaryDiagnosis,
        Family::TertiaryDiagnosis,
        Family::HbA1c,
        Family::DiabetesMed,
        Family::PayerCode,
    ];

    /// Column name prefix; a column is `prefix + value`
    pub fn prefix(self) -> &'static str {
        match self {
            Family::Gender => "gender_",
            Family::Race => "race_",
            Family::AgeGroup => "age_group_",
            Family::PrimaryDiagnosis => "diag_1_grouped_",
            Family::SecondaryDiagnosis => "diag_2_grouped_",
            Family::TertiaryDiagnosis => "diag_3_grouped_",
            Family::HbA1c => "HbA1c_category_",
            Family::DiabetesMed => "diabetesMed_",
            Family::PayerCode => "payer_code_",
        }
    }

    /// Values the intake form can produce
    pub fn vocabulary(self) -> &'static [&'static str] {
        match self {
            Family::Gender => &["Female", "Male"],
            Family::Race => &["AfricanAmerican", "Asian", "Caucasian", "Hispanic", "Other"],
            Family::AgeGroup => &["Age_0_30", "Age_30_60", "Age_60_plus"],
            Family::PrimaryDiagnosis | Family::SecondaryDiagnosis | Family::TertiaryDiagnosis => {
                DIAGNOSIS_GROUPS
            }
            Family::HbA1c => &[
                "High_HbA1c_MedChanged",
                "High_HbA1c_NoMedChange",
                NO_HBA1C_TEST,
                "Normal_HbA1c",
            ],
            Family::DiabetesMed => &["No", "Yes"],
            // payer codes come from the schema alone
            Family::PayerCode => &[],
        }
    }

    /// Catch-all value whose column receives dropped non-baseline values
    pub fn fallback(self) -> Option<&'static str> {
        match self {
            Family::Race
            | Family::PrimaryDiagnosis
            | Family::SecondaryDiagnosis
            | Family::TertiaryDiagnosis => Some("Other"),
            _ => None,
        }
    }

    /// Baseline to prefer when the schema dropped it
    pub fn preferred_baseline(self) -> Option<&'static str> {
        match self {
            Family::HbA1c => Some(NO_HBA1C_TEST),
            _ => None,
        }
    }
}

/// How one categorical value lands in the vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// The value has its own column
    Column(usize),
    /// The value was never trained on and is redirected to another column
    Remapped(usize),
    /// Dropped category, all zeros within the family
    Baseline,
}

/// Value lookup for a single family
#[derive(Debug, Clone)]
pub struct FamilyEncoding {
    family: Family,
    lookup: HashMap<String, Encoding>,
    baseline: Option<String>,
}

impl FamilyEncoding {
    pub fn build(family: Family, schema: &FeatureSchema) -> Self {
        let mut lookup: HashMap<String, Encoding> = HashMap::new();
        for (idx, value) in schema.columns_with_prefix(family.prefix()) {
            lookup
                .entry(value.to_string())
                .or_insert(Encoding::Column(idx));
        }

        let mut missing: Vec<&str> = family
            .vocabulary()
            .iter()
            .copied()
            .filter(|value| !lookup.contains_key(*value))
            .collect();
        missing.sort_unstable();

        // drop-first encoding can only have removed a category sorting before every kept one
        let first_kept = lookup.keys().min().cloned();
        let baseline = family
            .preferred_baseline()
            .filter(|preferred| missing.contains(preferred))
            .or_else(|| {
                missing.first().copied().filter(|candidate| match &first_kept {
                    Some(kept) => *candidate < kept.as_str(),
                    None => true,
                })
            });

        let fallback_column = family.fallback().and_then(|value| match lookup.get(value) {
            Some(Encoding::Column(idx)) => Some(*idx),
            _ => None,
        });

        for value in missing {
            let encoding = match fallback_column {
                Some(idx) if Some(value) != baseline => Encoding::Remapped(idx),
                _ => Encoding::Baseline,
            };
            lookup.insert(value.to_string(), encoding);
        }

        Self {
            family,
            lookup,
            baseline: baseline.map(str::to_string),
        }
    }

    /// The dropped category, if the vocabulary has one without a column
    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    /// Encoding of `value`; `None` when the value is unknown to both schema and vocabulary
    pub fn encoding(&self, value: &str) -> Option<Encoding> {
        self.lookup.get(value).copied()
    }

    /// Column to set for `value`, or `None` for the all-zero baseline.
    ///
    /// Unknown values fall through to the baseline silently.
    pub fn resolve(&self, value: &str) -> Option<usize> {
        match self.lookup.get(value) {
            Some(Encoding::Column(idx)) | Some(Encoding::Remapped(idx)) => Some(*idx),
            Some(Encoding::Baseline) => None,
            None => {
                debug!(
                    family = ?self.family,
                    value = %value,
                    "Unknown category, encoding as baseline"
                );
                None
            }
        }
    }

    /// Every column index belonging to this family
    pub fn columns(&self) -> Vec<usize> {
        let mut columns: Vec<usize> = self
            .lookup
            .values()
            .filter_map(|encoding| match encoding {
                Encoding::Column(idx) => Some(*idx),
                _ => None,
            })
            .collect();
        columns.sort_unstable();
        columns.dedup();
        columns
    }
}

/// Encodings for every family, built once per schema
#[derive(Debug, Clone)]
pub struct EncodingTable {
    families: HashMap<Family, FamilyEncoding>,
}

impl EncodingTable {
    pub fn build(schema: &FeatureSchema) -> Self {
        let families = Family::ALL
            .iter()
            .map(|&family| (family, FamilyEncoding::build(family, schema)))
            .collect();
        Self { families }
    }

    pub fn family(&self, family: Family) -> &FamilyEncoding {
        // every Family variant is inserted by build()
        &self.families[&family]
    }

    pub fn resolve(&self, family: Family, value: &str) -> Option<usize> {
        self.family(family).resolve(value)
    }
}
