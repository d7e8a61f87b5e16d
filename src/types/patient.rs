//! Patient intake record submitted for a readmission assessment

use serde::{Deserialize, Serialize};

/// Human-entered patient attributes.
///
/// Every field is optional; absent fields fall back to the defaults exposed
/// by the accessor of the same name. Numeric values are taken as-is, the
/// intake form is responsible for range limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    // Demographics
    pub gender: Option<String>,
    pub race: Option<String>,
    pub age_group: Option<String>,

    // Encounter
    pub time_in_hospital: Option<f64>,
    pub num_lab_procedures: Option<f64>,
    pub num_procedures: Option<f64>,
    pub num_medications: Option<f64>,
    pub number_emergency: Option<f64>,
    pub number_inpatient: Option<f64>,
    pub number_outpatient: Option<f64>,
    pub num_medications_prescribed: Option<f64>,
    pub num_medications_changed: Option<f64>,
    pub number_diagnoses: Option<f64>,

    // Administrative codes
    pub admission_type_id: Option<f64>,
    pub discharge_disposition_id: Option<f64>,
    pub admission_source_id: Option<f64>,
    pub medical_specialty: Option<f64>,
    pub payer_code: Option<String>,

    // Clinical
    pub primary_diagnosis: Option<String>,
    pub secondary_diagnosis: Option<String>,
    pub tertiary_diagnosis: Option<String>,
    pub hba1c_category: Option<String>,
    #[serde(alias = "diabetesMed")]
    pub diabetes_med: Option<String>,
}

impl PatientRecord {
    pub fn time_in_hospital(&self) -> f64 {
        self.time_in_hospital.unwrap_or(4.0)
    }

    pub fn num_lab_procedures(&self) -> f64 {
        self.num_lab_procedures.unwrap_or(45.0)
    }

    pub fn num_procedures(&self) -> f64 {
        self.num_procedures.unwrap_or(2.0)
    }

    pub fn num_medications(&self) -> f64 {
        self.num_medications.unwrap_or(15.0)
    }

    pub fn number_emergency(&self) -> f64 {
        self.number_emergency.unwrap_or(0.0)
    }

    pub fn number_inpatient(&self) -> f64 {
        self.number_inpatient.unwrap_or(0.0)
    }

    pub fn number_outpatient(&self) -> f64 {
        self.number_outpatient.unwrap_or(0.0)
    }

    pub fn num_medications_prescribed(&self) -> f64 {
        self.num_medications_prescribed.unwrap_or(15.0)
    }

    pub fn num_medications_changed(&self) -> f64 {
        self.num_medications_changed.unwrap_or(0.0)
    }

    pub fn number_diagnoses(&self) -> f64 {
        self.number_diagnoses.unwrap_or(9.0)
    }

    pub fn admission_type_id(&self) -> f64 {
        self.admission_type_id.unwrap_or(1.0)
    }

    pub fn discharge_disposition_id(&self) -> f64 {
        self.discharge_disposition_id.unwrap_or(1.0)
    }

    /// Defaults to 7 (emergency room)
    pub fn admission_source_id(&self) -> f64 {
        self.admission_source_id.unwrap_or(7.0)
    }

    pub fn medical_specialty(&self) -> f64 {
        self.medical_specialty.unwrap_or(0.0)
    }

    /// Medication count used for the polypharmacy flag
    pub fn medication_count(&self) -> f64 {
        self.num_medications_prescribed
            .or(self.num_medications)
            .unwrap_or(15.0)
    }

    pub fn gender(&self) -> &str {
        self.gender.as_deref().unwrap_or("Male")
    }

    pub fn race(&self) -> &str {
        self.race.as_deref().unwrap_or("Caucasian")
    }

    pub fn age_group(&self) -> &str {
        self.age_group.as_deref().unwrap_or("Age_60_plus")
    }

    pub fn primary_diagnosis(&self) -> &str {
        self.primary_diagnosis.as_deref().unwrap_or("Diabetes")
    }

    /// Defaults to the primary diagnosis
    pub fn secondary_diagnosis(&self) -> &str {
        self.secondary_diagnosis
            .as_deref()
            .unwrap_or_else(|| self.primary_diagnosis())
    }

    /// Defaults to the primary diagnosis
    pub fn tertiary_diagnosis(&self) -> &str {
        self.tertiary_diagnosis
            .as_deref()
            .unwrap_or_else(|| self.primary_diagnosis())
    }

    pub fn hba1c_category(&self) -> &str {
        self.hba1c_category.as_deref().unwrap_or("No_HbA1c_Test")
    }

    pub fn diabetes_med(&self) -> &str {
        self.diabetes_med.as_deref().unwrap_or("Yes")
    }

    /// Defaults to Medicare
    pub fn payer_code(&self) -> &str {
        self.payer_code.as_deref().unwrap_or("MC")
    }

    /// Directly copied numeric columns with their resolved values
    pub fn numeric_fields(&self) -> [(&'static str, f64); 14] {
        [
            ("time_in_hospital", self.time_in_hospital()),
            ("num_lab_procedures", self.num_lab_procedures()),
            ("num_procedures", self.num_procedures()),
            ("num_medications", self.num_medications()),
            ("number_emergency", self.number_emergency()),
            ("number_inpatient", self.number_inpatient()),
            ("number_outpatient", self.number_outpatient()),
            ("num_medications_prescribed", self.num_medications_prescribed()),
            ("admission_type_id", self.admission_type_id()),
            ("discharge_disposition_id", self.discharge_disposition_id()),
            ("admission_source_id", self.admission_source_id()),
            ("medical_specialty", self.medical_specialty()),
            ("number_diagnoses", self.number_diagnoses()),
            ("num_medications_changed", self.num_medications_changed()),
        ]
    }
}
