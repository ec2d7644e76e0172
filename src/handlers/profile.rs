use axum::{extract::State, response::Json, Extension};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::{options::ReturnDocument, Collection};

use crate::dtos::auth_dtos::UpdateProfileRequest;
use crate::errors::{AppError, Result};
use crate::models::user::{Claims, User, UserResponse};
use crate::state::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>> {
    let user = find_caller(&state, &claims).await?;
    Ok(Json(user.to_response()))
}

// Role, ids, email, password and OTP state are not reachable through this
// endpoint; only display/profile attributes are.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let user_id =
        ObjectId::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    let users: Collection<User> = state.db.collection("users");

    let mut changes = Document::new();
    set_if_present(&mut changes, "name", payload.name);
    set_if_present(&mut changes, "phone", payload.phone);
    set_if_present(&mut changes, "avatar", payload.avatar);
    set_if_present(&mut changes, "hospital", payload.hospital);
    set_if_present(&mut changes, "branch", payload.branch);
    set_if_present(&mut changes, "speciality", payload.speciality);
    set_if_present(&mut changes, "qualification", payload.qualification);
    set_if_present(&mut changes, "experience", payload.experience);
    set_if_present(&mut changes, "address", payload.address);
    set_if_present(&mut changes, "blood_group", payload.blood_group);
    set_if_present(&mut changes, "date_of_birth", payload.date_of_birth);
    set_if_present(&mut changes, "gender", payload.gender);
    set_if_present(&mut changes, "height", payload.height);
    set_if_present(&mut changes, "weight", payload.weight);
    set_if_present(&mut changes, "adhaar", payload.adhaar);
    set_if_present(&mut changes, "alternative_phone", payload.alternative_phone);
    if let Some(age) = payload.age {
        changes.insert("age", age);
    }

    if changes.is_empty() {
        let user = find_caller(&state, &claims).await?;
        return Ok(Json(user.to_response()));
    }

    changes.insert("updated_at", mongodb::bson::DateTime::now());

    let updated = users
        .find_one_and_update(doc! { "_id": user_id }, doc! { "$set": changes })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(Json(updated.to_response()))
}

async fn find_caller(state: &AppState, claims: &Claims) -> Result<User> {
    let user_id =
        ObjectId::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    let users: Collection<User> = state.db.collection("users");

    users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::UserNotFound)
}

fn set_if_present(changes: &mut Document, key: &str, value: Option<String>) {
    if let Some(value) = value {
        changes.insert(key, value);
    }
}
