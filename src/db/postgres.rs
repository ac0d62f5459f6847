//! PostgreSQL store backed by an sqlx pool.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    AdminUser, Contact, Education, EducationInput, Experience, ExperienceInput, NewContact,
    Project, ProjectInput, Skill, SkillInput, SkillRow,
};
use super::{Store, StoreError, Table};
use crate::ordering::{OrderSlot, OrderedCollection};

const EXPERIENCE_COLUMNS: &str =
    "id, period, company, position, location, sort_order, created_at";
const EDUCATION_COLUMNS: &str =
    "id, period, institution, degree, location, sort_order, created_at";
const SKILL_COLUMNS: &str = "id, name, categories, icon_name, sort_order, created_at";
const PROJECT_COLUMNS: &str = "id, title, description, short_description, gallery, technologies, \
     year, github_url, live_url, sort_order, created_at";
const CONTACT_COLUMNS: &str = "id, name, email, message, created_at, read";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminUser>, StoreError> {
        let admin = sqlx::query_as::<_, AdminUser>(
            r#"SELECT id, email, password_hash, name, role, is_active, last_login
               FROM admin
               WHERE LOWER(email) = LOWER($1)
               ORDER BY is_active DESC
               LIMIT 1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn verify_crypt_password(&self, password: &str, hash: &str) -> Result<bool, StoreError> {
        let verified: Option<bool> = sqlx::query_scalar("SELECT verify_crypt_password($1, $2)")
            .bind(password)
            .bind(hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(verified.unwrap_or(false))
    }

    async fn verify_password_direct(
        &self,
        email: &str,
        password: &str,
    ) -> Result<bool, StoreError> {
        let verified: Option<bool> = sqlx::query_scalar("SELECT verify_password_direct($1, $2)")
            .bind(email)
            .bind(password)
            .fetch_one(&self.pool)
            .await?;
        Ok(verified.unwrap_or(false))
    }

    async fn record_login(&self, admin_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE admin SET last_login = now() WHERE id = $1")
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn order_slots(
        &self,
        collection: OrderedCollection,
    ) -> Result<Vec<OrderSlot>, StoreError> {
        let sql = format!(
            "SELECT id, sort_order FROM {} ORDER BY {}",
            collection.table().name(),
            collection.order_by()
        );
        let slots = sqlx::query_as::<_, OrderSlot>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(slots)
    }

    async fn max_sort_order(
        &self,
        collection: OrderedCollection,
    ) -> Result<Option<i32>, StoreError> {
        let sql = format!("SELECT MAX(sort_order) FROM {}", collection.table().name());
        let max: Option<i32> = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(max)
    }

    async fn apply_sort_orders(
        &self,
        collection: OrderedCollection,
        updates: &[OrderSlot],
    ) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {} SET sort_order = $1 WHERE id = $2",
            collection.table().name()
        );

        let mut tx = self.pool.begin().await?;
        for update in updates {
            sqlx::query(&sql)
                .bind(update.sort_order)
                .bind(update.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_experience(&self) -> Result<Vec<Experience>, StoreError> {
        let sql = format!(
            "SELECT {EXPERIENCE_COLUMNS} FROM experience ORDER BY {}",
            OrderedCollection::Experience.order_by()
        );
        Ok(sqlx::query_as::<_, Experience>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_experience(
        &self,
        input: &ExperienceInput,
        sort_order: i32,
    ) -> Result<Experience, StoreError> {
        let sql = format!(
            "INSERT INTO experience (period, company, position, location, sort_order) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EXPERIENCE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Experience>(&sql)
            .bind(&input.period)
            .bind(&input.company)
            .bind(&input.position)
            .bind(&input.location)
            .bind(sort_order)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_experience(
        &self,
        id: Uuid,
        input: &ExperienceInput,
    ) -> Result<Option<Experience>, StoreError> {
        let sql = format!(
            "UPDATE experience SET period = $1, company = $2, position = $3, location = $4 \
             WHERE id = $5 RETURNING {EXPERIENCE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Experience>(&sql)
            .bind(&input.period)
            .bind(&input.company)
            .bind(&input.position)
            .bind(&input.location)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_education(&self) -> Result<Vec<Education>, StoreError> {
        let sql = format!(
            "SELECT {EDUCATION_COLUMNS} FROM education ORDER BY {}",
            OrderedCollection::Education.order_by()
        );
        Ok(sqlx::query_as::<_, Education>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_education(
        &self,
        input: &EducationInput,
        sort_order: i32,
    ) -> Result<Education, StoreError> {
        let sql = format!(
            "INSERT INTO education (period, institution, degree, location, sort_order) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EDUCATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Education>(&sql)
            .bind(&input.period)
            .bind(&input.institution)
            .bind(&input.degree)
            .bind(&input.location)
            .bind(sort_order)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_education(
        &self,
        id: Uuid,
        input: &EducationInput,
    ) -> Result<Option<Education>, StoreError> {
        let sql = format!(
            "UPDATE education SET period = $1, institution = $2, degree = $3, location = $4 \
             WHERE id = $5 RETURNING {EDUCATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Education>(&sql)
            .bind(&input.period)
            .bind(&input.institution)
            .bind(&input.degree)
            .bind(&input.location)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, StoreError> {
        let sql = format!(
            "SELECT {SKILL_COLUMNS} FROM skills ORDER BY {}",
            OrderedCollection::Skills.order_by()
        );
        let rows = sqlx::query_as::<_, SkillRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Skill::from).collect())
    }

    async fn insert_skill(&self, input: &SkillInput, sort_order: i32) -> Result<Skill, StoreError> {
        let sql = format!(
            "INSERT INTO skills (name, categories, icon_name, sort_order) \
             VALUES ($1, $2, $3, $4) RETURNING {SKILL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SkillRow>(&sql)
            .bind(&input.name)
            .bind(input.category_strings())
            .bind(&input.icon_name)
            .bind(sort_order)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_skill(
        &self,
        id: Uuid,
        input: &SkillInput,
    ) -> Result<Option<Skill>, StoreError> {
        let sql = format!(
            "UPDATE skills SET name = $1, categories = $2, icon_name = $3 \
             WHERE id = $4 RETURNING {SKILL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SkillRow>(&sql)
            .bind(&input.name)
            .bind(input.category_strings())
            .bind(&input.icon_name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Skill::from))
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY {}",
            OrderedCollection::Projects.order_by()
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_project(
        &self,
        input: &ProjectInput,
        sort_order: i32,
    ) -> Result<Project, StoreError> {
        let sql = format!(
            "INSERT INTO projects (title, description, short_description, gallery, technologies, \
             year, github_url, live_url, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {PROJECT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.short_description)
            .bind(&input.gallery)
            .bind(&input.technologies)
            .bind(&input.year)
            .bind(&input.github_url)
            .bind(&input.live_url)
            .bind(sort_order)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_project(
        &self,
        id: Uuid,
        input: &ProjectInput,
    ) -> Result<Option<Project>, StoreError> {
        let sql = format!(
            "UPDATE projects SET title = $1, description = $2, short_description = $3, \
             gallery = $4, technologies = $5, year = $6, github_url = $7, live_url = $8, \
             sort_order = COALESCE($9, sort_order) \
             WHERE id = $10 RETURNING {PROJECT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.short_description)
            .bind(&input.gallery)
            .bind(&input.technologies)
            .bind(&input.year)
            .bind(&input.github_url)
            .bind(&input.live_url)
            .bind(input.sort_order)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_contact(&self, contact: &NewContact) -> Result<Contact, StoreError> {
        let sql = format!(
            "INSERT INTO contacts (name, email, message) VALUES ($1, $2, $3) \
             RETURNING {CONTACT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.message)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn set_contact_read(&self, id: Uuid, read: bool) -> Result<Option<Contact>, StoreError> {
        let sql = format!("UPDATE contacts SET read = $1 WHERE id = $2 RETURNING {CONTACT_COLUMNS}");
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(read)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
