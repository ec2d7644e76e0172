use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::Collection;
use validator::Validate;

use crate::dtos::auth_dtos::{
    AuthResponse, RegisterRequest, RegisterResponse, SendOtpRequest, SendOtpResponse,
    VerifyOtpRequest,
};
use crate::errors::{is_duplicate_key_error, AppError, Result};
use crate::models::user::{OtpRejection, Role, User};
use crate::services::account_ids;
use crate::services::otp_service::mask_email;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::missing_field("name"));
    }
    if payload.email.trim().is_empty() {
        return Err(AppError::missing_field("email"));
    }
    if payload.password.is_empty() {
        return Err(AppError::missing_field("password"));
    }
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let users: Collection<User> = state.db.collection("users");

    let existing = users.find_one(doc! { "email": &payload.email }).await?;
    if existing.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let now = Utc::now();
    let (patient_id, doctor_id) = match payload.role {
        Role::Doctor => (None, Some(account_ids::allocate_doctor_id(&state.db).await?)),
        Role::Patient => (
            Some(account_ids::generate_patient_id(&payload.name, now)),
            None,
        ),
    };

    let password_hash = hash(&payload.password, DEFAULT_COST)?;

    let user = User {
        id: None,
        role: payload.role,
        name: payload.name.clone(),
        email: payload.email.clone(),
        password_hash,
        phone: payload.phone.clone(),
        patient_id: patient_id.clone(),
        doctor_id: doctor_id.clone(),
        avatar: payload.avatar.clone(),
        hospital: payload.hospital.clone(),
        branch: payload.branch.clone(),
        speciality: payload.speciality.clone(),
        qualification: payload.qualification.clone(),
        experience: payload.experience.clone(),
        address: payload.address.clone(),
        blood_group: payload.blood_group.clone(),
        date_of_birth: payload.date_of_birth.clone(),
        gender: payload.gender.clone(),
        age: payload.age,
        height: payload.height.clone(),
        weight: payload.weight.clone(),
        adhaar: payload.adhaar.clone(),
        alternative_phone: payload.alternative_phone.clone(),
        login_otp: None,
        created_at: now,
        updated_at: now,
    };

    // The unique index on email closes the window between the lookup above
    // and this insert; a racing registration loses here instead of slipping in.
    let insert_result = match users.insert_one(&user).await {
        Ok(result) => result,
        Err(e) if is_duplicate_key_error(&e) => return Err(AppError::DuplicateEmail),
        Err(e) => return Err(e.into()),
    };
    let inserted_id = insert_result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::internal("insert returned no ObjectId"))?;

    let mut created = user;
    created.id = Some(inserted_id);

    // Welcome mail is fire-and-forget: registration already succeeded, a
    // delivery failure only gets logged.
    let mail_service = state.mail_service.clone();
    let to_email = created.email.clone();
    let to_name = created.name.clone();
    let human_id = created.human_id().unwrap_or_default().to_string();
    tokio::spawn(async move {
        if let Err(e) = mail_service
            .send_welcome_email(&to_email, &to_name, &human_id)
            .await
        {
            tracing::error!("Welcome email error: {}", e);
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: created.to_response(),
            patient_id,
            doctor_id,
        }),
    ))
}

pub async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let user = find_by_identifier(&state, &payload.identifier)
        .await?
        .ok_or(AppError::UserNotFound)?;

    if user.email.trim().is_empty() {
        return Err(AppError::NoEmailOnFile);
    }

    let user_id = user
        .id
        .ok_or_else(|| AppError::internal("user has no id"))?;

    let otp = state.otp_service.issue_for_user(&user_id).await?;

    // Delivery failure surfaces to the caller; the stored code stays put and
    // is simply superseded by the next send.
    state
        .mail_service
        .send_otp_email(&user.email, &user.name, &otp.code)
        .await?;

    let masked = mask_email(&user.email);
    tracing::info!("OTP sent for account {}", user_id.to_hex());

    Ok(Json(SendOtpResponse {
        message: format!("OTP sent to {}", masked),
        status: "pending".to_string(),
    }))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let user = find_by_identifier(&state, &payload.identifier)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let active = user.login_otp.as_ref().ok_or(AppError::InvalidOtp)?;

    active
        .check(&payload.code, Utc::now())
        .map_err(|rejection| match rejection {
            OtpRejection::Mismatch => AppError::InvalidOtp,
            OtpRejection::Expired => AppError::OtpExpired,
        })?;

    let user_id = user
        .id
        .ok_or_else(|| AppError::internal("user has no id"))?;

    // Sign the session before consuming the code; if signing fails the slot
    // stays intact and the caller can simply retry.
    let token = state.otp_service.issue_session_token(&user)?;

    state.otp_service.clear_for_user(&user_id).await?;

    Ok(Json(AuthResponse {
        status: "approved".to_string(),
        user: user.to_response(),
        token,
        message: "Login successful".to_string(),
    }))
}

/// Looks the account up by any of the four login identifiers.
async fn find_by_identifier(state: &AppState, identifier: &str) -> Result<Option<User>> {
    let users: Collection<User> = state.db.collection("users");

    let filter = doc! {
        "$or": [
            { "email": identifier },
            { "patient_id": identifier },
            { "doctor_id": identifier },
            { "phone": identifier },
        ]
    };

    Ok(users.find_one(filter).await?)
}
