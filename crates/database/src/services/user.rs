use crate::{
    actor::Actor,
    entities::{booking, penalty, user},
    error::{Error, Result},
};
use chrono::NaiveDateTime;
use log::info;
use models::{BookingStatus, Role};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, prelude::Uuid,
};
use validator::ValidateEmail;

/// A new account; the password has already been hashed by the caller
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub password_hash: String,
}

/// Admin edits of an account; `None` leaves the field as it is
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    /// An empty string clears the field
    pub department: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
}

pub struct UserService;

impl UserService {
    pub async fn create(
        db: &DatabaseConnection,
        actor: &Actor,
        new: NewUser,
        now: NaiveDateTime,
    ) -> Result<user::Model> {
        actor.require_admin()?;
        Self::insert(db, new, now).await
    }

    /// Creates the first admin account if no user owns `email` yet
    pub async fn ensure_admin(
        db: &DatabaseConnection,
        full_name: &str,
        email: &str,
        password_hash: String,
        now: NaiveDateTime,
    ) -> Result<user::Model> {
        if let Some(existing) = Self::find_by_email(db, email).await? {
            return Ok(existing);
        }

        let admin = Self::insert(
            db,
            NewUser {
                full_name: full_name.to_owned(),
                email: email.to_owned(),
                department: None,
                phone: None,
                role: Role::Admin,
                password_hash,
            },
            now,
        )
        .await?;

        info!("Bootstrapped admin account {}", admin.email);
        Ok(admin)
    }

    pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await?)
    }

    pub async fn get(db: &DatabaseConnection, actor: &Actor, user_id: Uuid) -> Result<user::Model> {
        actor.require_access(user_id)?;
        user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound("user"))
    }

    pub async fn list(
        db: &DatabaseConnection,
        actor: &Actor,
        role: Option<Role>,
    ) -> Result<Vec<user::Model>> {
        actor.require_admin()?;

        let mut query = user::Entity::find();
        if let Some(role) = role {
            query = query.filter(user::Column::Role.eq(role));
        }

        Ok(query.order_by_asc(user::Column::FullName).all(db).await?)
    }

    pub async fn update(
        db: &DatabaseConnection,
        actor: &Actor,
        user_id: Uuid,
        changes: UserChanges,
    ) -> Result<user::Model> {
        actor.require_admin()?;
        if actor.user_id == user_id && changes.role.is_some_and(|role| !role.is_admin()) {
            return Err(Error::InvalidRequest(
                "admins cannot remove their own admin role".to_owned(),
            ));
        }

        let updated = Self::apply(db, user_id, changes).await?;
        info!("User {user_id} updated by {}", actor.user_id);
        Ok(updated)
    }

    /// Self-service edit of the caller's own account
    pub async fn update_profile(
        db: &DatabaseConnection,
        actor: &Actor,
        changes: ProfileChanges,
    ) -> Result<user::Model> {
        let changes = UserChanges {
            full_name: changes.full_name,
            department: changes.department,
            phone: changes.phone,
            ..Default::default()
        };
        Self::apply(db, actor.user_id, changes).await
    }

    /// Replaces the stored password hash; the caller hashes the new password
    pub async fn reset_password(
        db: &DatabaseConnection,
        actor: &Actor,
        user_id: Uuid,
        password_hash: String,
    ) -> Result<()> {
        actor.require_admin()?;

        let mut active = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound("user"))?
            .into_active_model();
        active.password_hash = Set(password_hash);
        active.update(db).await?;

        info!("Password of user {user_id} reset by {}", actor.user_id);
        Ok(())
    }

    /// Removes an account that has nothing outstanding and no penalty history
    pub async fn delete(db: &DatabaseConnection, actor: &Actor, user_id: Uuid) -> Result<()> {
        actor.require_admin()?;
        if actor.user_id == user_id {
            return Err(Error::InvalidRequest(
                "admins cannot delete their own account".to_owned(),
            ));
        }

        let existing = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound("user"))?;

        let active = existing
            .find_related(booking::Entity)
            .filter(booking::Column::Status.is_in([
                BookingStatus::Requested,
                BookingStatus::Approved,
                BookingStatus::Overdue,
            ]))
            .count(db)
            .await?;
        if active > 0 {
            return Err(Error::InvalidState(format!(
                "user {user_id} has {active} active booking(s)"
            )));
        }

        let penalties = existing.find_related(penalty::Entity).count(db).await?;
        if penalties > 0 {
            return Err(Error::InvalidState(format!(
                "user {user_id} has {penalties} penalty record(s)"
            )));
        }

        existing.delete(db).await?;
        info!("User {user_id} deleted by {}", actor.user_id);
        Ok(())
    }

    async fn apply(
        db: &DatabaseConnection,
        user_id: Uuid,
        changes: UserChanges,
    ) -> Result<user::Model> {
        let existing = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound("user"))?;
        let mut active = existing.clone().into_active_model();

        if let Some(full_name) = changes.full_name {
            let full_name = full_name.trim();
            if full_name.is_empty() {
                return Err(Error::InvalidRequest("full name is required".to_owned()));
            }
            active.full_name = Set(full_name.to_owned());
        }
        if let Some(email) = changes.email {
            let email = normalize_email(&email);
            if !is_plausible_email(&email) {
                return Err(Error::InvalidRequest(format!("{email:?} is not an email address")));
            }
            if email != existing.email && Self::find_by_email(db, &email).await?.is_some() {
                return Err(Error::InvalidRequest(format!("{email} is already registered")));
            }
            active.email = Set(email);
        }
        if let Some(department) = changes.department {
            active.department = Set(non_blank(department));
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(non_blank(phone));
        }
        if let Some(role) = changes.role {
            active.role = Set(role);
        }

        if !active.is_changed() {
            return Ok(existing);
        }
        Ok(active.update(db).await?)
    }

    async fn insert(db: &DatabaseConnection, new: NewUser, now: NaiveDateTime) -> Result<user::Model> {
        let full_name = new.full_name.trim();
        if full_name.is_empty() {
            return Err(Error::InvalidRequest("full name is required".to_owned()));
        }

        let email = normalize_email(&new.email);
        if !is_plausible_email(&email) {
            return Err(Error::InvalidRequest(format!("{email:?} is not an email address")));
        }

        if Self::find_by_email(db, &email).await?.is_some() {
            return Err(Error::InvalidRequest(format!("{email} is already registered")));
        }

        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(full_name.to_owned()),
            email: Set(email),
            department: Set(new.department.and_then(non_blank)),
            phone: Set(new.phone.and_then(non_blank)),
            role: Set(new.role),
            password_hash: Set(new.password_hash),
            created_at: Set(now),
        }
        .insert(db)
        .await?;

        info!("User {} created with role {}", created.email, created.role);
        Ok(created)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    email.validate_email()
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::{is_plausible_email, non_blank, normalize_email};

    #[test]
    fn test_email_normalization() {
        assert_eq!(normalize_email("  Ada@Lab.EDU "), "ada@lab.edu");
    }

    #[test]
    fn test_plausible_emails() {
        assert!(is_plausible_email("student@uni.edu"));
        assert!(!is_plausible_email("student"));
        assert!(!is_plausible_email("@uni.edu"));
        assert!(!is_plausible_email("two words@uni.edu"));
        assert!(!is_plausible_email("student@"));
    }

    #[test]
    fn test_blank_optional_fields_are_cleared() {
        assert_eq!(non_blank("  ".to_owned()), None);
        assert_eq!(non_blank(" EE ".to_owned()), Some("EE".to_owned()));
    }
}
