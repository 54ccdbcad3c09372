use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{validation, ServiceError, ServiceResult};
use crate::auth::{self, password, Claims};
use crate::config;
use crate::database::models::role::ADMINISTRATOR_ROLE;
use crate::database::models::user::USER_COLUMNS;
use crate::database::models::{Organization, Role, User};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    #[serde(flatten)]
    pub account: NewAccount,
    pub organization_name: String,
    pub organization_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "crate::types::nullable")]
    pub phone: Option<Option<String>>,
}

/// Token plus the account it was issued for
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Organization>,
}

struct ValidAccount {
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
}

pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a stand-alone account that may later request to join a company
    pub async fn register(&self, input: NewAccount) -> ServiceResult<User> {
        let account = Self::validate(&input)?;
        let user = Self::insert_user(&self.pool, &account).await?;
        info!("Registered account {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Create an account, its organization and the built-in administrator role in one transaction
    pub async fn register_company(&self, input: NewCompany) -> ServiceResult<(User, Organization)> {
        let account = Self::validate(&input.account)?;
        let name = validation::required_text("organization_name", &input.organization_name, 120)?;
        let description = validation::optional_text(
            "organization_description",
            input.organization_description.as_deref(),
            2000,
        )?
        .unwrap_or_default();

        let mut tx = self.pool.begin().await?;

        let user = Self::insert_user(&mut *tx, &account).await?;

        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (id, name, description, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&description)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ServiceError::on_unique(e, format!("Organization '{}' already exists", name)))?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (
                id, organization_id, name, is_admin,
                can_manage_employees, can_manage_departments, can_manage_roles, can_manage_tasks,
                can_post_news, can_manage_events, can_manage_attendance, can_view_statistics,
                can_review_join_requests
            )
            VALUES ($1, $2, $3, true, true, true, true, true, true, true, true, true, true)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization.id)
        .bind(ADMINISTRATOR_ROLE)
        .fetch_one(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET organization_id = $2, role_id = $3, position = 'Owner', hired_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(organization.id)
        .bind(role.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Registered organization '{}' ({}) owned by {}",
            organization.name, organization.id, user.email
        );
        Ok((user, organization))
    }

    /// Check credentials. Unknown e-mail and wrong password are indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = email.trim().to_lowercase();
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        match user {
            Some(user) if password::verify_password(password, &user.password_hash) => {
                info!("Login succeeded for {}", user.id);
                Ok(user)
            }
            _ => {
                tracing::warn!("Login failed for '{}'", email);
                Err(ServiceError::InvalidCredentials)
            }
        }
    }

    pub async fn find(&self, user_id: Uuid) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, user_id: Uuid) -> ServiceResult<User> {
        self.find(user_id).await?.ok_or_else(|| ServiceError::not_found("User"))
    }

    pub async fn change_password(&self, user: &User, current: &str, new_password: &str) -> ServiceResult<()> {
        if !password::verify_password(current, &user.password_hash) {
            return Err(ServiceError::validation("current_password", "Current password is incorrect"));
        }
        validation::password("new_password", new_password, config::config().security.min_password_length)?;

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(user.id)
            .bind(password::hash_password(new_password))
            .execute(&self.pool)
            .await?;

        info!("Password changed for {}", user.id);
        Ok(())
    }

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> ServiceResult<User> {
        let first_name = update
            .first_name
            .as_deref()
            .map(|v| validation::required_text("first_name", v, 100))
            .transpose()?;
        let last_name = update
            .last_name
            .as_deref()
            .map(|v| validation::required_text("last_name", v, 100))
            .transpose()?;
        let phone = match &update.phone {
            Some(value) => Some(validation::optional_text("phone", value.as_deref(), 40)?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = CASE WHEN $4 THEN $5 ELSE phone END,
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(phone.is_some())
        .bind(phone.flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

        Ok(user)
    }

    pub fn issue_session(user: User, organization: Option<Organization>) -> ServiceResult<Session> {
        let token = auth::generate_jwt(&Claims::new(user.id, user.email.clone()))?;
        Ok(Session {
            token,
            expires_in: config::config().security.jwt_expiry_hours * 3600,
            user,
            organization,
        })
    }

    fn validate(input: &NewAccount) -> ServiceResult<ValidAccount> {
        let email = validation::email(&input.email)?;
        validation::password("password", &input.password, config::config().security.min_password_length)?;

        Ok(ValidAccount {
            email,
            password_hash: password::hash_password(&input.password),
            first_name: validation::required_text("first_name", &input.first_name, 100)?,
            last_name: validation::required_text("last_name", &input.last_name, 100)?,
            phone: validation::optional_text("phone", input.phone.as_deref(), 40)?,
        })
    }

    async fn insert_user<'e, E>(executor: E, account: &ValidAccount) -> ServiceResult<User>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.phone)
            .fetch_one(executor)
            .await
            .map_err(|e| ServiceError::on_unique(e, format!("E-mail '{}' is already registered", account.email)))
    }
}
