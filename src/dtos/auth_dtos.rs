use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{Role, UserResponse};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub role: Role,
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    pub password: String,
    pub phone: Option<String>,

    // Opaque profile attributes, stored as submitted
    pub avatar: Option<String>,
    pub hospital: Option<String>,
    pub branch: Option<String>,
    pub speciality: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub adhaar: Option<String>,
    pub alternative_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,

    #[validate(length(min = 6, max = 6, message = "OTP must be 6 digits"))]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub status: String,
    pub user: UserResponse,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub hospital: Option<String>,
    pub branch: Option<String>,
    pub speciality: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub adhaar: Option<String>,
    pub alternative_phone: Option<String>,
}
