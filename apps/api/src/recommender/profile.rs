//! Profile input — the six form fields and their allowed values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("'{value}' is not a valid {field} option")]
    InvalidOption { field: FormField, value: String },
}

/// School grade. Serialized as the option label shown in the select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "7-8")]
    SevenToEight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "11")]
    Eleven,
    #[serde(rename = "12")]
    Twelve,
}

impl Grade {
    pub const ALL: [Grade; 5] = [
        Grade::SevenToEight,
        Grade::Nine,
        Grade::Ten,
        Grade::Eleven,
        Grade::Twelve,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Grade::SevenToEight => "7-8",
            Grade::Nine => "9",
            Grade::Ten => "10",
            Grade::Eleven => "11",
            Grade::Twelve => "12",
        }
    }
}

/// GPA band. Serialized as the option label shown in the select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpaBand {
    #[serde(rename = "2.5 or lower")]
    UpTo2_5,
    #[serde(rename = "2.5 - 3.0")]
    From2_5To3_0,
    #[serde(rename = "3.0 - 3.5")]
    From3_0To3_5,
    #[serde(rename = "3.5 - 4.0")]
    From3_5To4_0,
    #[serde(rename = "4.0 or higher")]
    Above4_0,
}

impl GpaBand {
    pub const ALL: [GpaBand; 5] = [
        GpaBand::UpTo2_5,
        GpaBand::From2_5To3_0,
        GpaBand::From3_0To3_5,
        GpaBand::From3_5To4_0,
        GpaBand::Above4_0,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GpaBand::UpTo2_5 => "2.5 or lower",
            GpaBand::From2_5To3_0 => "2.5 - 3.0",
            GpaBand::From3_0To3_5 => "3.0 - 3.5",
            GpaBand::From3_5To4_0 => "3.5 - 4.0",
            GpaBand::Above4_0 => "4.0 or higher",
        }
    }
}

/// Every input on the form. Each has exactly one change handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Grade,
    Gpa,
    Location,
    Major,
    Achievements,
    Hobby,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            FormField::Grade => "grade",
            FormField::Gpa => "gpa",
            FormField::Location => "location",
            FormField::Major => "major",
            FormField::Achievements => "achievements",
            FormField::Hobby => "hobby",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grade" => Ok(FormField::Grade),
            "gpa" => Ok(FormField::Gpa),
            "location" => Ok(FormField::Location),
            "major" => Ok(FormField::Major),
            "achievements" => Ok(FormField::Achievements),
            "hobby" => Ok(FormField::Hobby),
            other => Err(ProfileError::UnknownField(other.to_string())),
        }
    }
}

/// Current values of the form. Free text is stored exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    pub grade: Option<Grade>,
    pub gpa: Option<GpaBand>,
    pub location: String,
    pub major: String,
    pub achievements: String,
    pub hobby: String,
}

impl ProfileInput {
    /// Change handler: overwrites one slot with `value`.
    ///
    /// Select fields accept only their option labels; the empty string clears them.
    pub fn set(&mut self, field: FormField, value: &str) -> Result<(), ProfileError> {
        match field {
            FormField::Grade => {
                self.grade = parse_option(field, value, &Grade::ALL, |g| g.label())?;
            }
            FormField::Gpa => {
                self.gpa = parse_option(field, value, &GpaBand::ALL, |b| b.label())?;
            }
            FormField::Location => self.location = value.to_string(),
            FormField::Major => self.major = value.to_string(),
            FormField::Achievements => self.achievements = value.to_string(),
            FormField::Hobby => self.hobby = value.to_string(),
        }
        Ok(())
    }
}

fn parse_option<T: Copy>(
    field: FormField,
    value: &str,
    options: &[T],
    label: impl Fn(T) -> &'static str,
) -> Result<Option<T>, ProfileError> {
    if value.is_empty() {
        return Ok(None);
    }
    options
        .iter()
        .copied()
        .find(|o| label(*o) == value)
        .map(Some)
        .ok_or_else(|| ProfileError::InvalidOption {
            field,
            value: value.to_string(),
        })
}
