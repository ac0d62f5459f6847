//! In-process store for running without a database and for router tests.

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    AdminUser, Contact, Education, EducationInput, Experience, ExperienceInput, NewContact,
    Project, ProjectInput, Skill, SkillInput,
};
use super::{Store, StoreError, Table};
use crate::ordering::{OrderSlot, OrderedCollection};

#[derive(Debug, Default)]
struct Tables {
    admins: Vec<AdminUser>,
    experience: Vec<Experience>,
    education: Vec<Education>,
    skills: Vec<Skill>,
    projects: Vec<Project>,
    contacts: Vec<Contact>,
}

impl Tables {
    fn sorted_experience(&self) -> Vec<Experience> {
        let mut rows = self.experience.clone();
        rows.sort_by_key(|r| (r.sort_order, Reverse(r.created_at)));
        rows
    }

    fn sorted_education(&self) -> Vec<Education> {
        let mut rows = self.education.clone();
        rows.sort_by_key(|r| (r.sort_order, Reverse(r.created_at)));
        rows
    }

    fn sorted_skills(&self) -> Vec<Skill> {
        let mut rows = self.skills.clone();
        rows.sort_by(|a, b| (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name)));
        rows
    }

    fn sorted_projects(&self) -> Vec<Project> {
        let mut rows = self.projects.clone();
        rows.sort_by_key(|r| (r.sort_order, Reverse(r.created_at)));
        rows
    }

    fn find_admin(&self, email: &str) -> Option<&AdminUser> {
        let mut matches = self
            .admins
            .iter()
            .filter(|a| a.email.eq_ignore_ascii_case(email));
        let first = matches.clone().next();
        matches.find(|a| a.is_active).or(first)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active admin; `password_hash` is a bcrypt hash.
    pub fn with_admin(mut self, email: &str, name: Option<&str>, password_hash: &str) -> Self {
        self.tables.get_mut().admins.push(AdminUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.map(str::to_string),
            role: "admin".to_string(),
            is_active: true,
            last_login: None,
        });
        self
    }

    #[cfg(test)]
    pub async fn admin(&self, email: &str) -> Option<AdminUser> {
        self.tables.read().await.find_admin(email).cloned()
    }

    #[cfg(test)]
    pub async fn deactivate_admin(&self, email: &str) {
        let mut tables = self.tables.write().await;
        for admin in tables.admins.iter_mut() {
            if admin.email.eq_ignore_ascii_case(email) {
                admin.is_active = false;
            }
        }
    }
}

async fn bcrypt_verify(password: &str, hash: &str) -> Result<bool, StoreError> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| StoreError::Unavailable(format!("password check panicked: {e}")))?
        .map_err(|e| StoreError::Unavailable(format!("unsupported password hash: {e}")))
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        let _tables = self.tables.read().await;
        Ok(start.elapsed())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminUser>, StoreError> {
        Ok(self.tables.read().await.find_admin(email).cloned())
    }

    async fn verify_crypt_password(&self, password: &str, hash: &str) -> Result<bool, StoreError> {
        bcrypt_verify(password, hash).await
    }

    async fn verify_password_direct(
        &self,
        email: &str,
        password: &str,
    ) -> Result<bool, StoreError> {
        let hash = {
            let tables = self.tables.read().await;
            match tables.find_admin(email) {
                Some(admin) if admin.is_active => admin.password_hash.clone(),
                _ => return Ok(false),
            }
        };
        Ok(bcrypt_verify(password, &hash).await.unwrap_or(false))
    }

    async fn record_login(&self, admin_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(admin) = tables.admins.iter_mut().find(|a| a.id == admin_id) {
            admin.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn order_slots(
        &self,
        collection: OrderedCollection,
    ) -> Result<Vec<OrderSlot>, StoreError> {
        let tables = self.tables.read().await;
        let slots = match collection {
            OrderedCollection::Experience => tables
                .sorted_experience()
                .iter()
                .map(|r| OrderSlot { id: r.id, sort_order: r.sort_order })
                .collect(),
            OrderedCollection::Education => tables
                .sorted_education()
                .iter()
                .map(|r| OrderSlot { id: r.id, sort_order: r.sort_order })
                .collect(),
            OrderedCollection::Skills => tables
                .sorted_skills()
                .iter()
                .map(|r| OrderSlot { id: r.id, sort_order: r.sort_order })
                .collect(),
            OrderedCollection::Projects => tables
                .sorted_projects()
                .iter()
                .map(|r| OrderSlot { id: r.id, sort_order: r.sort_order })
                .collect(),
        };
        Ok(slots)
    }

    async fn max_sort_order(
        &self,
        collection: OrderedCollection,
    ) -> Result<Option<i32>, StoreError> {
        let tables = self.tables.read().await;
        let max = match collection {
            OrderedCollection::Experience => tables.experience.iter().map(|r| r.sort_order).max(),
            OrderedCollection::Education => tables.education.iter().map(|r| r.sort_order).max(),
            OrderedCollection::Skills => tables.skills.iter().map(|r| r.sort_order).max(),
            OrderedCollection::Projects => tables.projects.iter().map(|r| r.sort_order).max(),
        };
        Ok(max)
    }

    async fn apply_sort_orders(
        &self,
        collection: OrderedCollection,
        updates: &[OrderSlot],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        for update in updates {
            let slot = match collection {
                OrderedCollection::Experience => tables
                    .experience
                    .iter_mut()
                    .find(|r| r.id == update.id)
                    .map(|r| &mut r.sort_order),
                OrderedCollection::Education => tables
                    .education
                    .iter_mut()
                    .find(|r| r.id == update.id)
                    .map(|r| &mut r.sort_order),
                OrderedCollection::Skills => tables
                    .skills
                    .iter_mut()
                    .find(|r| r.id == update.id)
                    .map(|r| &mut r.sort_order),
                OrderedCollection::Projects => tables
                    .projects
                    .iter_mut()
                    .find(|r| r.id == update.id)
                    .map(|r| &mut r.sort_order),
            };
            if let Some(sort_order) = slot {
                *sort_order = update.sort_order;
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        fn remove<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
            let before = rows.len();
            rows.retain(|row| !matches(row));
            rows.len() != before
        }
        let removed = match table {
            Table::Experience => remove(&mut tables.experience, |r| r.id == id),
            Table::Education => remove(&mut tables.education, |r| r.id == id),
            Table::Skills => remove(&mut tables.skills, |r| r.id == id),
            Table::Projects => remove(&mut tables.projects, |r| r.id == id),
            Table::Contacts => remove(&mut tables.contacts, |r| r.id == id),
        };
        Ok(removed)
    }

    async fn list_experience(&self) -> Result<Vec<Experience>, StoreError> {
        Ok(self.tables.read().await.sorted_experience())
    }

    async fn insert_experience(
        &self,
        input: &ExperienceInput,
        sort_order: i32,
    ) -> Result<Experience, StoreError> {
        let row = Experience {
            id: Uuid::new_v4(),
            period: input.period.clone(),
            company: input.company.clone(),
            position: input.position.clone(),
            location: input.location.clone(),
            sort_order,
            created_at: Utc::now(),
        };
        self.tables.write().await.experience.push(row.clone());
        Ok(row)
    }

    async fn update_experience(
        &self,
        id: Uuid,
        input: &ExperienceInput,
    ) -> Result<Option<Experience>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.experience.iter_mut().find(|r| r.id == id).map(|row| {
            row.period = input.period.clone();
            row.company = input.company.clone();
            row.position = input.position.clone();
            row.location = input.location.clone();
            row.clone()
        }))
    }

    async fn list_education(&self) -> Result<Vec<Education>, StoreError> {
        Ok(self.tables.read().await.sorted_education())
    }

    async fn insert_education(
        &self,
        input: &EducationInput,
        sort_order: i32,
    ) -> Result<Education, StoreError> {
        let row = Education {
            id: Uuid::new_v4(),
            period: input.period.clone(),
            institution: input.institution.clone(),
            degree: input.degree.clone(),
            location: input.location.clone(),
            sort_order,
            created_at: Utc::now(),
        };
        self.tables.write().await.education.push(row.clone());
        Ok(row)
    }

    async fn update_education(
        &self,
        id: Uuid,
        input: &EducationInput,
    ) -> Result<Option<Education>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.education.iter_mut().find(|r| r.id == id).map(|row| {
            row.period = input.period.clone();
            row.institution = input.institution.clone();
            row.degree = input.degree.clone();
            row.location = input.location.clone();
            row.clone()
        }))
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, StoreError> {
        Ok(self.tables.read().await.sorted_skills())
    }

    async fn insert_skill(&self, input: &SkillInput, sort_order: i32) -> Result<Skill, StoreError> {
        let row = Skill {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            categories: input.categories.clone(),
            icon_name: input.icon_name.clone(),
            sort_order,
            created_at: Utc::now(),
        };
        self.tables.write().await.skills.push(row.clone());
        Ok(row)
    }

    async fn update_skill(
        &self,
        id: Uuid,
        input: &SkillInput,
    ) -> Result<Option<Skill>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.skills.iter_mut().find(|r| r.id == id).map(|row| {
            row.name = input.name.clone();
            row.categories = input.categories.clone();
            row.icon_name = input.icon_name.clone();
            row.clone()
        }))
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.tables.read().await.sorted_projects())
    }

    async fn insert_project(
        &self,
        input: &ProjectInput,
        sort_order: i32,
    ) -> Result<Project, StoreError> {
        let row = Project {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            description: input.description.clone(),
            short_description: input.short_description.clone(),
            gallery: input.gallery.clone(),
            technologies: input.technologies.clone(),
            year: input.year.clone(),
            github_url: input.github_url.clone(),
            live_url: input.live_url.clone(),
            sort_order,
            created_at: Utc::now(),
        };
        self.tables.write().await.projects.push(row.clone());
        Ok(row)
    }

    async fn update_project(
        &self,
        id: Uuid,
        input: &ProjectInput,
    ) -> Result<Option<Project>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.projects.iter_mut().find(|r| r.id == id).map(|row| {
            row.title = input.title.clone();
            row.description = input.description.clone();
            row.short_description = input.short_description.clone();
            row.gallery = input.gallery.clone();
            row.technologies = input.technologies.clone();
            row.year = input.year.clone();
            row.github_url = input.github_url.clone();
            row.live_url = input.live_url.clone();
            if let Some(sort_order) = input.sort_order {
                row.sort_order = sort_order;
            }
            row.clone()
        }))
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        let mut rows = self.tables.read().await.contacts.clone();
        rows.sort_by_key(|r| Reverse(r.created_at));
        Ok(rows)
    }

    async fn insert_contact(&self, contact: &NewContact) -> Result<Contact, StoreError> {
        let row = Contact {
            id: Uuid::new_v4(),
            name: contact.name.clone(),
            email: contact.email.clone(),
            message: contact.message.clone(),
            created_at: Utc::now(),
            read: false,
        };
        self.tables.write().await.contacts.push(row.clone());
        Ok(row)
    }

    async fn set_contact_read(&self, id: Uuid, read: bool) -> Result<Option<Contact>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.contacts.iter_mut().find(|r| r.id == id).map(|row| {
            row.read = read;
            row.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::{move_item, Direction};

    fn experience(company: &str) -> ExperienceInput {
        ExperienceInput {
            period: "2020 - 2022".to_string(),
            company: company.to_string(),
            position: "Engineer".to_string(),
            location: "Remote".to_string(),
        }
    }

    #[tokio::test]
    async fn test_experience_listed_by_sort_order() {
        let store = MemoryStore::new();
        store.insert_experience(&experience("B"), 2).await.unwrap();
        store.insert_experience(&experience("A"), 1).await.unwrap();

        let rows = store.list_experience().await.unwrap();
        let companies: Vec<_> = rows.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(companies, vec!["A", "B"]);
        assert_eq!(
            store.max_sort_order(OrderedCollection::Experience).await.unwrap(),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_move_item_swaps_rows() {
        let store = MemoryStore::new();
        let first = store.insert_experience(&experience("A"), 1).await.unwrap();
        let second = store.insert_experience(&experience("B"), 2).await.unwrap();

        move_item(&store, OrderedCollection::Experience, first.id, Direction::Down)
            .await
            .unwrap();

        let ids: Vec<_> = store
            .list_experience()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let store = MemoryStore::new();
        let row = store.insert_experience(&experience("A"), 1).await.unwrap();
        assert!(store.delete(Table::Experience, row.id).await.unwrap());
        assert!(!store.delete(Table::Experience, row.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_password_verification_paths() {
        let hash = bcrypt::hash("hunter22", 4).unwrap();
        let store = MemoryStore::new().with_admin("owner@example.com", Some("Owner"), &hash);

        assert!(store.verify_crypt_password("hunter22", &hash).await.unwrap());
        assert!(!store.verify_crypt_password("wrong", &hash).await.unwrap());
        assert!(store.verify_crypt_password("hunter22", "not-a-hash").await.is_err());

        assert!(store
            .verify_password_direct("OWNER@example.com", "hunter22")
            .await
            .unwrap());
        assert!(!store
            .verify_password_direct("nobody@example.com", "hunter22")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_contacts_newest_first_and_read_flag() {
        let store = MemoryStore::new();
        let first = store
            .insert_contact(&NewContact {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                message: "Hello".to_string(),
            })
            .await
            .unwrap();
        assert!(!first.read);

        let updated = store.set_contact_read(first.id, true).await.unwrap().unwrap();
        assert!(updated.read);
        assert!(store
            .set_contact_read(Uuid::new_v4(), true)
            .await
            .unwrap()
            .is_none());
    }
}
