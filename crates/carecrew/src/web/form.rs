use std::fmt::{self, Display};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::pipeline::KickoffInputs;

pub const MAX_AGE: u8 = 120;

/// The raw form fields, as submitted.
///
/// Kept verbatim so a rejected form can be shown again unchanged.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormValues {
    pub gender: String,
    pub age: String,
    pub symptoms: String,
    pub medical_history: String,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            gender: Gender::Male.to_string(),
            age: "25".to_owned(),
            symptoms: "e.g., fever, cough, headache".to_owned(),
            medical_history: "e.g., diabetes, hypertension".to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];
}

impl Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        })
    }
}

impl FromStr for Gender {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Gender::ALL
            .into_iter()
            .find(|gender| gender.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| InputError::Gender(s.to_owned()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please select a gender (got `{0}`).")]
    Gender(String),
    #[error("Age must be a whole number between 0 and {MAX_AGE}.")]
    Age,
}

/// One validated form submission. Never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientInput {
    pub gender: Gender,
    pub age: u8,
    pub symptoms: String,
    pub medical_history: String,
}

impl TryFrom<&FormValues> for PatientInput {
    type Error = InputError;

    fn try_from(form: &FormValues) -> Result<Self, Self::Error> {
        let gender = form.gender.parse()?;
        let age = form
            .age
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|age| *age <= MAX_AGE)
            .ok_or(InputError::Age)?;
        Ok(Self {
            gender,
            age,
            symptoms: form.symptoms.clone(),
            medical_history: form.medical_history.clone(),
        })
    }
}

impl From<&PatientInput> for KickoffInputs {
    /// Only the free-text fields reach the crew.
    fn from(input: &PatientInput) -> Self {
        Self {
            symptoms: input.symptoms.clone(),
            medical_history: input.medical_history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(gender: &str, age: &str) -> FormValues {
        FormValues {
            gender: gender.to_owned(),
            age: age.to_owned(),
            ..FormValues::default()
        }
    }

    #[test]
    fn test_valid_input() {
        let input = PatientInput::try_from(&form("female", " 34 ")).unwrap();
        assert_eq!(input.gender, Gender::Female);
        assert_eq!(input.age, 34);
        assert_eq!(input.symptoms, "e.g., fever, cough, headache");

        assert_eq!(PatientInput::try_from(&form("OTHER", "0")).unwrap().age, 0);
        assert_eq!(PatientInput::try_from(&form("Male", "120")).unwrap().age, 120);
    }

    #[test]
    fn test_age_bounds() {
        for age in ["121", "-1", "34.5", "abc", "", "300"] {
            assert_eq!(
                PatientInput::try_from(&form("Male", age)),
                Err(InputError::Age),
                "age {age:?}"
            );
        }
    }

    #[test]
    fn test_unknown_gender() {
        assert_eq!(
            PatientInput::try_from(&form("robot", "30")),
            Err(InputError::Gender("robot".to_owned()))
        );
    }

    #[test]
    fn test_kickoff_inputs() {
        let input = PatientInput {
            gender: Gender::Female,
            age: 34,
            symptoms: "fever, cough".to_owned(),
            medical_history: "diabetes".to_owned(),
        };
        assert_eq!(
            KickoffInputs::from(&input),
            KickoffInputs {
                symptoms: "fever, cough".to_owned(),
                medical_history: "diabetes".to_owned(),
            }
        );
    }
}
