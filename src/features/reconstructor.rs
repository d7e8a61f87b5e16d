//! Feature reconstruction from a sparse patient record.
//!
//! Expands the handful of fields a clinician enters into the dense vector the
//! trained models expect: raw numeric columns, one-hot families, two boolean
//! interaction flags and the HbA1c x primary diagnosis cross-term. Columns the
//! record says nothing about (medication change indicators and similar) stay 0.

use super::families::{EncodingTable, Family, NO_HBA1C_TEST};
use super::FeatureVector;
use crate::schema::{FeatureSchema, NUMERICAL_FEATURES};
use crate::types::patient::PatientRecord;
use std::collections::HashMap;
use tracing::debug;

pub const LONG_STAY_HIGH_PROCEDURES: &str = "long_stay_high_procedures";
pub const ELDERLY_POLYPHARMACY: &str = "elderly_polypharmacy";
pub const HBA1C_DIAG_INTERACTION_PREFIX: &str = "HbA1c_Diag_interaction_";

/// Oldest age bracket offered by the intake form
pub const OLDEST_AGE_GROUP: &str = "Age_60_plus";

const LONG_STAY_DAYS: f64 = 7.0;
const HIGH_PROCEDURE_COUNT: f64 = 3.0;
const POLYPHARMACY_MEDICATIONS: f64 = 5.0;

/// Column plan for one frozen schema, built once and reused for every record.
#[derive(Debug, Clone)]
pub struct FeatureReconstructor {
    width: usize,
    numeric_columns: HashMap<&'static str, usize>,
    encodings: EncodingTable,
    long_stay_column: Option<usize>,
    elderly_column: Option<usize>,
    /// Cross-term columns keyed by `{hba1c}_{diagnosis}`
    interaction_columns: HashMap<String, usize>,
}

impl FeatureReconstructor {
    pub fn new(schema: &FeatureSchema) -> Self {
        let numeric_columns = NUMERICAL_FEATURES
            .iter()
            .filter_map(|&name| schema.index_of(name).map(|idx| (name, idx)))
            .collect();

        let interaction_columns = schema
            .columns_with_prefix(HBA1C_DIAG_INTERACTION_PREFIX)
            .map(|(idx, suffix)| (suffix.to_string(), idx))
            .collect();

        Self {
            width: schema.len(),
            numeric_columns,
            encodings: EncodingTable::build(schema),
            long_stay_column: schema.index_of(LONG_STAY_HIGH_PROCEDURES),
            elderly_column: schema.index_of(ELDERLY_POLYPHARMACY),
            interaction_columns,
        }
    }

    /// Build the raw (unscaled) vector for `record`.
    ///
    /// Never fails: categories the schema cannot represent contribute nothing.
    pub fn reconstruct(&self, record: &PatientRecord) -> FeatureVector {
        let mut values = vec![0.0_f32; self.width];

        for (name, value) in record.numeric_fields() {
            if let Some(&idx) = self.numeric_columns.get(name) {
                values[idx] = value as f32;
            }
        }

        let categories = [
            (Family::Gender, record.gender()),
            (Family::Race, record.race()),
            (Family::AgeGroup, record.age_group()),
            (Family::PrimaryDiagnosis, record.primary_diagnosis()),
            (Family::SecondaryDiagnosis, record.secondary_diagnosis()),
            (Family::TertiaryDiagnosis, record.tertiary_diagnosis()),
            (Family::HbA1c, record.hba1c_category()),
            (Family::DiabetesMed, record.diabetes_med()),
            (Family::PayerCode, record.payer_code()),
        ];
        let mut hot = 0;
        for (family, value) in categories {
            if let Some(idx) = self.encodings.resolve(family, value) {
                values[idx] = 1.0;
                hot += 1;
            }
        }

        if let Some(idx) = self.long_stay_column {
            let long_stay = record.time_in_hospital() > LONG_STAY_DAYS
                && record.num_procedures() > HIGH_PROCEDURE_COUNT;
            values[idx] = flag(long_stay);
        }

        if let Some(idx) = self.elderly_column {
            let elderly = record.age_group() == OLDEST_AGE_GROUP
                && record.medication_count() >= POLYPHARMACY_MEDICATIONS;
            values[idx] = flag(elderly);
        }

        let interaction = self.interaction_column(record.hba1c_category(), record.primary_diagnosis());
        if let Some(idx) = interaction {
            values[idx] = 1.0;
        }

        debug!(
            features = self.width,
            one_hot = hot,
            interaction = interaction.is_some(),
            "Feature vector reconstructed"
        );

        FeatureVector::raw(values)
    }

    fn interaction_column(&self, hba1c: &str, diagnosis: &str) -> Option<usize> {
        if hba1c == NO_HBA1C_TEST {
            return None;
        }
        self.interaction_columns
            .get(&format!("{}_{}", hba1c, diagnosis))
            .copied()
    }
}

fn flag(condition: bool) -> f32 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// Reconstruct `record` against `schema` without a prebuilt plan.
pub fn reconstruct(record: &PatientRecord, schema: &FeatureSchema) -> FeatureVector {
    FeatureReconstructor::new(schema).reconstruct(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_schema;

    fn column(schema: &FeatureSchema, vector: &FeatureVector, name: &str) -> f32 {
        vector.as_slice()[schema.index_of(name).unwrap()]
    }

    fn hot_count(schema: &FeatureSchema, vector: &FeatureVector, prefix: &str) -> f32 {
        schema
            .columns_with_prefix(prefix)
            .map(|(idx, _)| vector.as_slice()[idx])
            .sum()
    }

    fn scenario() -> PatientRecord {
        PatientRecord {
            gender: Some("Female".to_string()),
            race: Some("Caucasian".to_string()),
            age_group: Some("Age_60_plus".to_string()),
            primary_diagnosis: Some("Diabetes".to_string()),
            time_in_hospital: Some(10.0),
            num_procedures: Some(4.0),
            num_medications: Some(6.0),
            hba1c_category: Some("Normal_HbA1c".to_string()),
            diabetes_med: Some("Yes".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let schema = fixture_schema();
        let vector = reconstruct(&scenario(), &schema);

        assert_eq!(vector.len(), schema.len());
        assert_eq!(column(&schema, &vector, LONG_STAY_HIGH_PROCEDURES), 1.0);
        assert_eq!(column(&schema, &vector, ELDERLY_POLYPHARMACY), 1.0);
        // Female is the dropped baseline
        assert_eq!(hot_count(&schema, &vector, "gender_"), 0.0);
        assert_eq!(column(&schema, &vector, "race_Caucasian"), 1.0);
        assert_eq!(column(&schema, &vector, "time_in_hospital"), 10.0);
        assert_eq!(column(&schema, &vector, "diabetesMed_Yes"), 1.0);
        assert_eq!(hot_count(&schema, &vector, HBA1C_DIAG_INTERACTION_PREFIX), 1.0);
        assert_eq!(
            column(&schema, &vector, "HbA1c_Diag_interaction_Normal_HbA1c_Diabetes"),
            1.0
        );
    }

    #[test]
    fn test_length_matches_schema_for_empty_record() {
        let schema = fixture_schema();
        let vector = reconstruct(&PatientRecord::default(), &schema);

        assert_eq!(vector.len(), schema.len());
        assert!(!vector.is_scaled());
    }

    #[test]
    fn test_defaults_fill_numeric_columns() {
        let schema = fixture_schema();
        let vector = reconstruct(&PatientRecord::default(), &schema);

        assert_eq!(column(&schema, &vector, "time_in_hospital"), 4.0);
        assert_eq!(column(&schema, &vector, "num_lab_procedures"), 45.0);
        assert_eq!(column(&schema, &vector, "admission_source_id"), 7.0);
        assert_eq!(column(&schema, &vector, "number_diagnoses"), 9.0);
        assert_eq!(column(&schema, &vector, "gender_Male"), 1.0);
        assert_eq!(column(&schema, &vector, "payer_code_MC"), 1.0);
    }

    #[test]
    fn test_one_hot_exclusivity_across_inputs() {
        let schema = fixture_schema();
        let prefixes = [
            "gender_",
            "race_",
            "age_group_",
            "diag_1_grouped_",
            "diag_2_grouped_",
            "diag_3_grouped_",
            "HbA1c_category_",
            "payer_code_",
            HBA1C_DIAG_INTERACTION_PREFIX,
        ];

        for race in ["AfricanAmerican", "Asian", "Caucasian", "Hispanic", "Other", "Unknown"] {
            for diagnosis in ["Circulatory", "Diabetes", "Injury", "Other", "Unlisted"] {
                for hba1c in ["No_HbA1c_Test", "Normal_HbA1c", "High_HbA1c_MedChanged"] {
                    let record = PatientRecord {
                        race: Some(race.to_string()),
                        primary_diagnosis: Some(diagnosis.to_string()),
                        hba1c_category: Some(hba1c.to_string()),
                        ..Default::default()
                    };
                    let vector = reconstruct(&record, &schema);

                    assert_eq!(vector.len(), schema.len());
                    for prefix in prefixes {
                        let hot = hot_count(&schema, &vector, prefix);
                        assert!(hot <= 1.0, "{} has {} hot columns", prefix, hot);
                    }
                }
            }
        }
    }

    #[test]
    fn test_baseline_category_contributes_nothing() {
        let schema = fixture_schema();
        let record = PatientRecord {
            race: Some("AfricanAmerican".to_string()),
            age_group: Some("Age_0_30".to_string()),
            primary_diagnosis: Some("Circulatory".to_string()),
            ..Default::default()
        };
        let vector = reconstruct(&record, &schema);

        assert_eq!(hot_count(&schema, &vector, "race_"), 0.0);
        assert_eq!(hot_count(&schema, &vector, "age_group_"), 0.0);
        assert_eq!(hot_count(&schema, &vector, "diag_1_grouped_"), 0.0);
    }

    #[test]
    fn test_reconstruct_is_pure() {
        let schema = fixture_schema();
        let reconstructor = FeatureReconstructor::new(&schema);

        let first = reconstructor.reconstruct(&scenario());
        let second = reconstructor.reconstruct(&scenario());

        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_category_does_not_panic() {
        let schema = fixture_schema();
        let record = PatientRecord {
            gender: Some("Unknown/Invalid".to_string()),
            race: Some("?".to_string()),
            hba1c_category: Some("Pending".to_string()),
            ..Default::default()
        };
        let vector = reconstruct(&record, &schema);

        assert_eq!(hot_count(&schema, &vector, "gender_"), 0.0);
        assert_eq!(hot_count(&schema, &vector, "race_"), 0.0);
        assert_eq!(hot_count(&schema, &vector, HBA1C_DIAG_INTERACTION_PREFIX), 0.0);
    }

    #[test]
    fn test_untrained_value_remaps_to_other() {
        let schema = FeatureSchema::new(
            ["race_Asian", "race_Caucasian", "race_Other", "diag_1_grouped_Diabetes", "diag_1_grouped_Other"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            Vec::new(),
        );
        let record = PatientRecord {
            race: Some("Hispanic".to_string()),
            primary_diagnosis: Some("Injury".to_string()),
            ..Default::default()
        };
        let vector = reconstruct(&record, &schema);

        assert_eq!(vector.as_slice(), &[0.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_no_hba1c_test_sets_no_cross_term() {
        let schema = fixture_schema();
        let record = PatientRecord {
            hba1c_category: Some("No_HbA1c_Test".to_string()),
            primary_diagnosis: Some("Diabetes".to_string()),
            ..Default::default()
        };
        let vector = reconstruct(&record, &schema);

        assert_eq!(hot_count(&schema, &vector, HBA1C_DIAG_INTERACTION_PREFIX), 0.0);
        assert_eq!(column(&schema, &vector, "HbA1c_category_No_HbA1c_Test"), 1.0);
    }

    #[test]
    fn test_interaction_flags_boundaries() {
        let schema = fixture_schema();
        let record = PatientRecord {
            time_in_hospital: Some(7.0),
            num_procedures: Some(6.0),
            age_group: Some("Age_60_plus".to_string()),
            num_medications_prescribed: Some(5.0),
            ..Default::default()
        };
        let vector = reconstruct(&record, &schema);

        // stay must exceed 7 days; five medications is enough
        assert_eq!(column(&schema, &vector, LONG_STAY_HIGH_PROCEDURES), 0.0);
        assert_eq!(column(&schema, &vector, ELDERLY_POLYPHARMACY), 1.0);

        let younger = PatientRecord {
            age_group: Some("Age_30_60".to_string()),
            ..record
        };
        let vector = reconstruct(&younger, &schema);
        assert_eq!(column(&schema, &vector, ELDERLY_POLYPHARMACY), 0.0);
    }

    #[test]
    fn test_medication_indicators_stay_zero() {
        let schema = fixture_schema();
        let vector = reconstruct(&scenario(), &schema);

        assert_eq!(column(&schema, &vector, "metformin_Steady"), 0.0);
        assert_eq!(column(&schema, &vector, "insulin_Up"), 0.0);
    }

    #[test]
    fn test_diabetes_med_no_is_baseline() {
        let schema = fixture_schema();
        let record = PatientRecord {
            diabetes_med: Some("No".to_string()),
            ..Default::default()
        };
        let vector = reconstruct(&record, &schema);

        assert_eq!(column(&schema, &vector, "diabetesMed_Yes"), 0.0);
    }
}
