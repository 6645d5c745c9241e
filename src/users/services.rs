use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::response::ServiceResponse;
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, PublicUser, UpdateUserRequest};
use crate::users::repo::unique_violation;
use crate::users::repo_types::{NewUser, User, UserUpdate};
use crate::users::validate::{parse_currency, validate_create_user};

fn duplicate_email() -> ServiceResponse<PublicUser> {
    ServiceResponse::fail(
        "User already exists",
        "email",
        "Email address is already registered",
    )
}

fn duplicate_phone() -> ServiceResponse<PublicUser> {
    ServiceResponse::fail(
        "Phone number already exists",
        "phone_number",
        "Phone number is already registered",
    )
}

/// Register a new user: validate, check uniqueness, hash, insert. The
/// pre-checks give field-scoped errors; the unique indexes are the atomic
/// backstop for the check-then-create race.
pub async fn create_user(
    state: &AppState,
    input: CreateUserRequest,
) -> anyhow::Result<ServiceResponse<PublicUser>> {
    let validated = match validate_create_user(&input) {
        Ok(v) => v,
        Err(errors) => return Ok(ServiceResponse::fail_with("Validation failed", errors)),
    };

    if User::find_by_email(&state.db, &validated.email)
        .await?
        .is_some()
    {
        return Ok(duplicate_email());
    }
    if User::find_by_phone_number(&state.db, &validated.phone_number)
        .await?
        .is_some()
    {
        return Ok(duplicate_phone());
    }

    let password_hash = hash_password(&validated.password)?;
    let new = NewUser {
        email: validated.email,
        password_hash,
        full_name: validated.full_name,
        phone_number: validated.phone_number,
        profile_image_url: validated.profile_image_url,
        preferred_currency: validated.preferred_currency,
    };

    match User::create(&state.db, &new).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user created");
            Ok(ServiceResponse::ok(
                "User created successfully",
                user.into(),
            ))
        }
        Err(e) => match unique_violation(&e) {
            Some(constraint) if constraint.contains("email") => Ok(duplicate_email()),
            Some(_) => Ok(duplicate_phone()),
            None => Err(e),
        },
    }
}

pub async fn get_user_by_id(state: &AppState, id: Uuid) -> anyhow::Result<Option<PublicUser>> {
    Ok(User::find_by_id(&state.db, id).await?.map(PublicUser::from))
}

pub async fn get_user_by_email(
    state: &AppState,
    email: &str,
) -> anyhow::Result<Option<PublicUser>> {
    Ok(User::find_by_email(&state.db, email)
        .await?
        .map(PublicUser::from))
}

/// Partial profile update. Email/phone duplicate checks exclude the user
/// being updated; the password hash and registration time are untouchable
/// through this path.
pub async fn update_user(
    state: &AppState,
    id: Uuid,
    input: UpdateUserRequest,
) -> anyhow::Result<ServiceResponse<PublicUser>> {
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Ok(ServiceResponse::fail(
            "User not found",
            "user_id",
            "No user exists with the provided ID",
        ));
    }

    if let Some(email) = input.email.as_deref() {
        if let Some(existing) = User::find_by_email(&state.db, email).await? {
            if existing.id != id {
                return Ok(ServiceResponse::fail(
                    "Email already exists",
                    "email",
                    "Email address is already registered to another user",
                ));
            }
        }
    }
    if let Some(phone) = input.phone_number.as_deref() {
        if let Some(existing) = User::find_by_phone_number(&state.db, phone).await? {
            if existing.id != id {
                return Ok(ServiceResponse::fail(
                    "Phone number already exists",
                    "phone_number",
                    "Phone number is already registered to another user",
                ));
            }
        }
    }

    let preferred_currency = match input.preferred_currency.as_deref() {
        Some(raw) => match parse_currency(raw) {
            Some(c) => Some(c),
            None => {
                return Ok(ServiceResponse::fail(
                    "Validation failed",
                    "preferred_currency",
                    "Preferred currency must be either NGN or USD",
                ))
            }
        },
        None => None,
    };

    let changes = UserUpdate {
        email: input.email,
        full_name: input.full_name,
        phone_number: input.phone_number,
        profile_image_url: input.profile_image_url,
        preferred_currency,
        balance_visibility_default: input.balance_visibility_default,
    };

    match User::update(&state.db, id, &changes).await? {
        Some(user) => Ok(ServiceResponse::ok(
            "User updated successfully",
            user.into(),
        )),
        None => Ok(ServiceResponse::fail(
            "Failed to update user",
            "general",
            "An error occurred while updating the user",
        )),
    }
}

pub async fn soft_delete_user(state: &AppState, id: Uuid) -> anyhow::Result<ServiceResponse<()>> {
    let Some(user) = User::find_by_id(&state.db, id).await? else {
        return Ok(ServiceResponse::fail(
            "User not found",
            "user_id",
            "No user exists with the provided ID",
        ));
    };
    if !user.is_active {
        return Ok(ServiceResponse::fail(
            "User already deactivated",
            "is_active",
            "This user account is already deactivated",
        ));
    }

    if User::soft_delete(&state.db, id).await? {
        info!(user_id = %id, "user deactivated");
        Ok(ServiceResponse::ok_empty("User deactivated successfully"))
    } else {
        Ok(ServiceResponse::fail(
            "Failed to deactivate user",
            "general",
            "An error occurred while deactivating the user",
        ))
    }
}
