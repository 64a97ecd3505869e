use std::fmt;

use serde::{Deserialize, Serialize};

/// Assistant personas the backend accepts with send and voice requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    #[default]
    Professor,
    StudyBuddy,
    ExamCoach,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Professor, Persona::StudyBuddy, Persona::ExamCoach];

    /// Wire token sent to the backend.
    pub fn id(&self) -> &'static str {
        match self {
            Persona::Professor => "professor",
            Persona::StudyBuddy => "study-buddy",
            Persona::ExamCoach => "exam-coach",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Persona::Professor => "ETA (Professor)",
            Persona::StudyBuddy => "ETA (Study Buddy)",
            Persona::ExamCoach => "ETA (Exam Coach)",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Persona::Professor => "Structured professor",
            Persona::StudyBuddy => "Friendly study buddy",
            Persona::ExamCoach => "High-energy exam coach",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Persona::ALL.into_iter().find(|p| p.id() == id)
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_id_roundtrip() {
        for persona in Persona::ALL {
            assert_eq!(Persona::from_id(persona.id()), Some(persona));
        }
        assert_eq!(Persona::from_id("tutor"), None);
    }
}
