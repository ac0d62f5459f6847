pub mod memory;
pub mod models;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::config::DbSettings;
use crate::ordering::{OrderSlot, OrderedCollection};
use models::{
    AdminUser, Contact, Education, EducationInput, Experience, ExperienceInput, NewContact,
    Project, ProjectInput, Skill, SkillInput,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Tables that handlers delete from by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Experience,
    Education,
    Skills,
    Projects,
    Contacts,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Experience => "experience",
            Table::Education => "education",
            Table::Skills => "skills",
            Table::Projects => "projects",
            Table::Contacts => "contacts",
        }
    }
}

/// The data store collaborator. Owns all durable state.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for diagnostics ("postgres", "memory").
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<Duration, StoreError>;

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminUser>, StoreError>;
    /// Remote `verify_crypt_password(p_password, p_hash)`.
    async fn verify_crypt_password(&self, password: &str, hash: &str) -> Result<bool, StoreError>;
    /// Remote `verify_password_direct(p_email, p_password)`.
    async fn verify_password_direct(&self, email: &str, password: &str)
        -> Result<bool, StoreError>;
    async fn record_login(&self, admin_id: Uuid) -> Result<(), StoreError>;

    /// `(id, sort_order)` of every row, in display order.
    async fn order_slots(&self, collection: OrderedCollection)
        -> Result<Vec<OrderSlot>, StoreError>;
    async fn max_sort_order(&self, collection: OrderedCollection)
        -> Result<Option<i32>, StoreError>;
    async fn apply_sort_orders(
        &self,
        collection: OrderedCollection,
        updates: &[OrderSlot],
    ) -> Result<(), StoreError>;

    /// Returns `false` when no row had that id.
    async fn delete(&self, table: Table, id: Uuid) -> Result<bool, StoreError>;

    async fn list_experience(&self) -> Result<Vec<Experience>, StoreError>;
    async fn insert_experience(
        &self,
        input: &ExperienceInput,
        sort_order: i32,
    ) -> Result<Experience, StoreError>;
    async fn update_experience(
        &self,
        id: Uuid,
        input: &ExperienceInput,
    ) -> Result<Option<Experience>, StoreError>;

    async fn list_education(&self) -> Result<Vec<Education>, StoreError>;
    async fn insert_education(
        &self,
        input: &EducationInput,
        sort_order: i32,
    ) -> Result<Education, StoreError>;
    async fn update_education(
        &self,
        id: Uuid,
        input: &EducationInput,
    ) -> Result<Option<Education>, StoreError>;

    async fn list_skills(&self) -> Result<Vec<Skill>, StoreError>;
    async fn insert_skill(&self, input: &SkillInput, sort_order: i32) -> Result<Skill, StoreError>;
    async fn update_skill(&self, id: Uuid, input: &SkillInput)
        -> Result<Option<Skill>, StoreError>;

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn insert_project(
        &self,
        input: &ProjectInput,
        sort_order: i32,
    ) -> Result<Project, StoreError>;
    async fn update_project(
        &self,
        id: Uuid,
        input: &ProjectInput,
    ) -> Result<Option<Project>, StoreError>;

    async fn list_contacts(&self) -> Result<Vec<Contact>, StoreError>;
    async fn insert_contact(&self, contact: &NewContact) -> Result<Contact, StoreError>;
    async fn set_contact_read(&self, id: Uuid, read: bool) -> Result<Option<Contact>, StoreError>;
}

pub async fn init_pool(settings: &DbSettings) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        settings.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&settings.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::raw_sql(
        r#"
        CREATE EXTENSION IF NOT EXISTS pgcrypto;

        CREATE TABLE IF NOT EXISTS admin (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            name TEXT,
            role TEXT NOT NULL DEFAULT 'admin',
            is_active BOOLEAN NOT NULL DEFAULT true,
            last_login TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE INDEX IF NOT EXISTS idx_admin_email_lower ON admin (LOWER(email));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS experience (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            period TEXT NOT NULL,
            company TEXT NOT NULL,
            position TEXT NOT NULL,
            location TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS education (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            period TEXT NOT NULL,
            institution TEXT NOT NULL,
            degree TEXT NOT NULL,
            location TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS skills (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            categories TEXT[] NOT NULL DEFAULT '{}',
            icon_name TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS projects (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            short_description TEXT NOT NULL DEFAULT '',
            gallery TEXT[] NOT NULL DEFAULT '{}',
            technologies TEXT[] NOT NULL DEFAULT '{}',
            year TEXT NOT NULL,
            github_url TEXT,
            live_url TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS contacts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            read BOOLEAN NOT NULL DEFAULT false
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        r#"
        CREATE INDEX IF NOT EXISTS idx_experience_sort_order ON experience (sort_order);
        CREATE INDEX IF NOT EXISTS idx_education_sort_order ON education (sort_order);
        CREATE INDEX IF NOT EXISTS idx_skills_sort_order ON skills (sort_order);
        CREATE INDEX IF NOT EXISTS idx_projects_sort_order ON projects (sort_order);
        CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts (created_at DESC);
        "#,
    )
    .execute(pool)
    .await?;

    // Password checks run inside the database so hashes never leave it.
    sqlx::raw_sql(
        r#"
        CREATE OR REPLACE FUNCTION verify_crypt_password(p_password TEXT, p_hash TEXT)
        RETURNS BOOLEAN
        LANGUAGE sql STABLE
        AS $$
            SELECT p_hash IS NOT NULL AND crypt(p_password, p_hash) = p_hash;
        $$;

        CREATE OR REPLACE FUNCTION verify_password_direct(p_email TEXT, p_password TEXT)
        RETURNS BOOLEAN
        LANGUAGE sql STABLE
        AS $$
            SELECT EXISTS (
                SELECT 1 FROM admin
                WHERE LOWER(email) = LOWER(p_email)
                  AND is_active
                  AND password_hash = crypt(p_password, password_hash)
            );
        $$;
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
