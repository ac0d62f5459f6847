//! Database Models - rows as stored, plus the validated inputs handlers write.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Admin principal. Only login mutates it (`last_login`).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Experience {
    pub id: Uuid,
    pub period: String,
    pub company: String,
    pub position: String,
    pub location: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExperienceInput {
    pub period: String,
    pub company: String,
    pub position: String,
    pub location: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Education {
    pub id: Uuid,
    pub period: String,
    pub institution: String,
    pub degree: String,
    pub location: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EducationInput {
    pub period: String,
    pub institution: String,
    pub degree: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Frontend,
    Backend,
    Technologies,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 3] = [
        SkillCategory::Frontend,
        SkillCategory::Backend,
        SkillCategory::Technologies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Frontend => "frontend",
            SkillCategory::Backend => "backend",
            SkillCategory::Technologies => "technologies",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub categories: Vec<SkillCategory>,
    pub icon_name: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// `skills` row as Postgres returns it; categories are a `TEXT[]`.
#[derive(Debug, Clone, FromRow)]
pub struct SkillRow {
    pub id: Uuid,
    pub name: String,
    pub categories: Vec<String>,
    pub icon_name: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<SkillRow> for Skill {
    fn from(row: SkillRow) -> Self {
        let categories = row
            .categories
            .iter()
            .filter_map(|raw| match raw.parse::<SkillCategory>() {
                Ok(category) => Some(category),
                Err(()) => {
                    tracing::warn!(skill_id = %row.id, category = %raw, "dropping unknown skill category");
                    None
                }
            })
            .collect();

        Skill {
            id: row.id,
            name: row.name,
            categories,
            icon_name: row.icon_name,
            sort_order: row.sort_order,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkillInput {
    pub name: String,
    pub categories: Vec<SkillCategory>,
    pub icon_name: Option<String>,
}

impl SkillInput {
    pub fn category_strings(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.as_str().to_string()).collect()
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub gallery: Vec<String>,
    pub technologies: Vec<String>,
    pub year: String,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub gallery: Vec<String>,
    pub technologies: Vec<String>,
    pub year: String,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    /// Explicit position; `None` keeps the current one (update) or appends (create).
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_category_parse_and_display() {
        assert_eq!("backend".parse::<SkillCategory>(), Ok(SkillCategory::Backend));
        assert!("Backend".parse::<SkillCategory>().is_err());
        assert_eq!(SkillCategory::Technologies.to_string(), "technologies");
    }

    #[test]
    fn test_skill_row_drops_unknown_categories() {
        let row = SkillRow {
            id: Uuid::new_v4(),
            name: "Rust".to_string(),
            categories: vec!["backend".to_string(), "devops".to_string()],
            icon_name: None,
            sort_order: 1,
            created_at: Utc::now(),
        };
        let skill = Skill::from(row);
        assert_eq!(skill.categories, vec![SkillCategory::Backend]);
    }

    #[test]
    fn test_admin_user_never_serializes_password_hash() {
        let admin = AdminUser {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            name: None,
            role: "admin".to_string(),
            is_active: true,
            last_login: None,
        };
        let json = serde_json::to_string(&admin).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret"));
    }
}
