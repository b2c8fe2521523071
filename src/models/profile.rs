use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl crate::events::Loggable for Profile {
    fn entity_type() -> &'static str {
        "profile"
    }
    fn subject_id(&self) -> Uuid {
        self.id
    }
}

/// Skills live in a single JSON text column.
#[derive(Debug, Clone, FromRow)]
pub struct DbProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub skills: String,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbProfile> for Profile {
    type Error = AppError;

    fn try_from(value: DbProfile) -> Result<Self, Self::Error> {
        let skills: Vec<String> = serde_json::from_str(&value.skills)
            .map_err(|err| AppError::internal(format!("corrupt skills column: {err}")))?;

        Ok(Profile {
            id: value.id,
            user_id: value.user_id,
            bio: value.bio,
            skills,
            experience: value.experience,
            education: value.education,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Skills arrive either as a list or as one comma-delimited string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Csv(String),
}

impl SkillsInput {
    pub fn normalize(self) -> Vec<String> {
        match self {
            SkillsInput::List(skills) => skills,
            SkillsInput::Csv(raw) => raw.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub bio: Option<String>,
    /// A list of skills, or a single comma-delimited string.
    #[schema(value_type = Option<Vec<String>>)]
    pub skills: Option<SkillsInput>,
    pub experience: Option<String>,
    pub education: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_skills_are_split_and_trimmed() {
        let input = SkillsInput::Csv("Go,  Rust ,TS".to_string());
        assert_eq!(input.normalize(), vec!["Go", "Rust", "TS"]);
    }

    #[test]
    fn list_skills_pass_through_unchanged() {
        let input = SkillsInput::List(vec!["Go".to_string(), "Rust".to_string()]);
        assert_eq!(input.normalize(), vec!["Go", "Rust"]);
    }

    #[test]
    fn untagged_forms_deserialize() {
        let list: SkillsInput = serde_json::from_str(r#"["Go","Rust"]"#).unwrap();
        assert_eq!(list.normalize(), vec!["Go", "Rust"]);

        let csv: SkillsInput = serde_json::from_str(r#""Go, Rust""#).unwrap();
        assert_eq!(csv.normalize(), vec!["Go", "Rust"]);
    }
}
