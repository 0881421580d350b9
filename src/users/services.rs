use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::store::Store;
use crate::users::{
    credentials,
    repo_types::{CredentialKind, NewUser, User, UserRecord},
    validation::{normalize_email, validate_fields, Field, FieldError, FieldErrorKind},
};

/// Field checks plus the case-insensitive email uniqueness lookup. Only store
/// I/O can make this fail; rejected input comes back as field errors.
pub async fn validate(store: &dyn Store, draft: &NewUser) -> ServiceResult<Vec<FieldError>> {
    let mut errors = validate_fields(draft);
    let email_ok = !errors.iter().any(|e| e.field == Field::Email);
    if email_ok && store.find_user_by_email(&draft.email).await?.is_some() {
        errors.push(FieldError::new(Field::Email, FieldErrorKind::Taken));
    }
    Ok(errors)
}

#[instrument(skip(store, draft), fields(email = %draft.email))]
pub async fn sign_up(store: &dyn Store, mut draft: NewUser) -> ServiceResult<User> {
    draft.email = normalize_email(&draft.email);

    let errors = validate(store, &draft).await?;
    if !errors.is_empty() {
        warn!(count = errors.len(), "signup rejected");
        return Err(ServiceError::Invalid(errors));
    }

    let password_digest =
        credentials::digest(&draft.password).map_err(|e| ServiceError::Internal(e.to_string()))?;

    let record = UserRecord {
        name: draft.name.trim().to_string(),
        email: draft.email,
        password_digest,
    };
    let user = match store.insert_user(record).await {
        Ok(u) => u,
        // lost a race with a concurrent signup for the same address
        Err(ServiceError::ConstraintViolation { constraint }) => {
            warn!(%constraint, "email taken at insert");
            return Err(ServiceError::Invalid(vec![FieldError::new(
                Field::Email,
                FieldErrorKind::Taken,
            )]));
        }
        Err(e) => return Err(e),
    };

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub async fn find(store: &dyn Store, id: Uuid) -> ServiceResult<User> {
    store.find_user(id).await?.ok_or(ServiceError::NotFound("user"))
}

/// Look a user up by email and check the password. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn authenticate(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> ServiceResult<Option<User>> {
    let Some(user) = store.find_user_by_email(&normalize_email(email)).await? else {
        return Ok(None);
    };
    if user.authenticated(CredentialKind::Password, password) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Store a fresh remember digest and return the raw token for the client.
#[instrument(skip(store))]
pub async fn remember(store: &dyn Store, user_id: Uuid) -> ServiceResult<String> {
    let token = credentials::new_token();
    let digest =
        credentials::digest(&token).map_err(|e| ServiceError::Internal(e.to_string()))?;
    store
        .set_digest(user_id, CredentialKind::Remember, Some(digest))
        .await?;
    Ok(token)
}

#[instrument(skip(store))]
pub async fn forget(store: &dyn Store, user_id: Uuid) -> ServiceResult<()> {
    store
        .set_digest(user_id, CredentialKind::Remember, None)
        .await
}

/// Delete a user and, explicitly, everything that depends on it. Returns the
/// number of microposts removed.
#[instrument(skip(store))]
pub async fn delete_user(store: &dyn Store, user_id: Uuid) -> ServiceResult<u64> {
    let removed = store.delete_user(user_id).await?;
    info!(%user_id, microposts_removed = removed, "user deleted");
    Ok(removed)
}
