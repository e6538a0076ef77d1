//! Registration, login and the admin bootstrap.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::{config::AdminSeed, AppError},
    auth::{
        password::{hash_password, verify_password},
        token::Authenticator,
    },
    database::{
        models::{NewUser, User},
        store::Store,
    },
};

const MIN_PASSWORD_LEN: usize = 6;
const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Default, Deserialize)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Returned by register and login; the client keeps it and sends `token` back.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
}

impl Session {
    fn open(user: User, authenticator: &Authenticator) -> Result<Self, AppError> {
        let token = authenticator.issue(user.id)?;

        Ok(Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            token,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

pub fn register(
    store: &dyn Store,
    authenticator: &Authenticator,
    registration: Registration,
) -> Result<Session, AppError> {
    let name = required(registration.name, "Name")?;
    let email = normalize_email(&required(registration.email, "Email")?);
    let password = required(registration.password, "Password")?;

    if !email.contains('@') {
        return Err(AppError::Validation(String::from("Email is invalid")));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if store.find_user_by_email(&email)?.is_some() {
        return Err(AppError::Validation(String::from("User already exists")));
    }

    let user = store.insert_user(NewUser::new(&name, &email, hash_password(&password)?, false))?;
    info!("registered user {}", user.id);

    Session::open(user, authenticator)
}

pub fn login(
    store: &dyn Store,
    authenticator: &Authenticator,
    credentials: Credentials,
) -> Result<Session, AppError> {
    let bad_credentials = || AppError::Unauthenticated(String::from(BAD_CREDENTIALS));

    let email = normalize_email(&credentials.email.ok_or_else(bad_credentials)?);
    let password = credentials.password.ok_or_else(bad_credentials)?;

    let user = store.find_user_by_email(&email)?.ok_or_else(bad_credentials)?;
    if !verify_password(password.trim(), &user.password) {
        warn!("failed login for {}", user.id);
        return Err(bad_credentials());
    }

    Session::open(user, authenticator)
}

/// Creates the configured admin account unless its email is already taken.
pub fn seed_admin(store: &dyn Store, seed: &AdminSeed) -> Result<Option<User>, AppError> {
    let email = normalize_email(&seed.email);
    if let Some(existing) = store.find_user_by_email(&email)? {
        if !existing.is_admin {
            warn!("{email} already exists without admin rights, not promoting it");
        }
        return Ok(None);
    }

    let admin = store.insert_user(NewUser::new(
        seed.name.trim(),
        &email,
        hash_password(seed.password.trim())?,
        true,
    ))?;
    info!("seeded admin account {}", admin.id);

    Ok(Some(admin))
}

/// Every user, password excluded on serialization.
pub fn list_all(store: &dyn Store) -> Result<Vec<User>, AppError> {
    store.list_users()
}
