use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

/// Active login code for an account. Both the code and its deadline live in
/// one slot so they can only be set or cleared together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginOtp {
    pub code: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl LoginOtp {
    /// Compares the submitted code against the stored one without
    /// short-circuiting on the first differing byte.
    pub fn matches(&self, submitted: &str) -> bool {
        let stored = self.code.as_bytes();
        let submitted = submitted.as_bytes();
        if stored.len() != submitted.len() {
            return false;
        }
        stored
            .iter()
            .zip(submitted.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Full acceptance decision for a submitted code. The value match is
    /// checked before expiry, so a wrong code on a stale slot still reads
    /// as a mismatch. Rejection leaves the slot untouched.
    pub fn check(&self, submitted: &str, now: DateTime<Utc>) -> Result<(), OtpRejection> {
        if !self.matches(submitted) {
            return Err(OtpRejection::Mismatch);
        }
        if self.is_expired(now) {
            return Err(OtpRejection::Expired);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpRejection {
    Mismatch,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub role: Role,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,

    // Exactly one of these is set, matching `role`.
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,

    pub avatar: Option<String>,

    // Doctor profile fields, opaque pass-through
    pub hospital: Option<String>,
    pub branch: Option<String>,
    pub speciality: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,

    // Patient profile fields, opaque pass-through
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub adhaar: Option<String>,
    pub alternative_phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_otp: Option<LoginOtp>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Account shape returned to clients. Password hash and OTP state never
    /// leave the server.
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            role: self.role,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            patient_id: self.patient_id.clone(),
            doctor_id: self.doctor_id.clone(),
            avatar: self.avatar.clone(),
            hospital: self.hospital.clone(),
            branch: self.branch.clone(),
            speciality: self.speciality.clone(),
            qualification: self.qualification.clone(),
            experience: self.experience.clone(),
            address: self.address.clone(),
            blood_group: self.blood_group.clone(),
            date_of_birth: self.date_of_birth.clone(),
            gender: self.gender.clone(),
            age: self.age,
            height: self.height.clone(),
            weight: self.weight.clone(),
            adhaar: self.adhaar.clone(),
            alternative_phone: self.alternative_phone.clone(),
            created_at: self.created_at,
        }
    }

    /// The human-readable account number matching this user's role.
    pub fn human_id(&self) -> Option<&str> {
        match self.role {
            Role::Patient => self.patient_id.as_deref(),
            Role::Doctor => self.doctor_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
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
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn otp(code: &str, ttl_minutes: i64) -> LoginOtp {
        LoginOtp {
            code: code.to_string(),
            expires_at: Utc::now() + Duration::minutes(ttl_minutes),
        }
    }

    #[test]
    fn matches_accepts_exact_code() {
        assert!(otp("483921", 10).matches("483921"));
    }

    #[test]
    fn matches_rejects_wrong_code() {
        let active = otp("483921", 10);
        assert!(!active.matches("483922"));
        assert!(!active.matches("000000"));
    }

    #[test]
    fn matches_rejects_different_length() {
        let active = otp("483921", 10);
        assert!(!active.matches("48392"));
        assert!(!active.matches("4839211"));
        assert!(!active.matches(""));
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let active = otp("123456", 10);
        assert!(!active.is_expired(Utc::now()));
        assert!(active.is_expired(active.expires_at + Duration::seconds(1)));
        // exactly at the deadline still counts as valid
        assert!(!active.is_expired(active.expires_at));
    }

    #[test]
    fn check_reports_expired_only_for_a_matching_code() {
        let stale = otp("123456", -1);
        assert_eq!(stale.check("123456", Utc::now()), Err(OtpRejection::Expired));
        // wrong code on a stale slot reads as a mismatch, not expiry
        assert_eq!(stale.check("654321", Utc::now()), Err(OtpRejection::Mismatch));
    }

    #[test]
    fn check_accepts_matching_code_before_deadline() {
        let active = otp("123456", 10);
        assert_eq!(active.check("123456", Utc::now()), Ok(()));
    }

    #[test]
    fn superseded_code_no_longer_passes_check() {
        // A second issuance replaces the slot wholesale; the first code
        // is then just a mismatch.
        let second = otp("654321", 10);
        assert_eq!(second.check("123456", Utc::now()), Err(OtpRejection::Mismatch));
        assert_eq!(second.check("654321", Utc::now()), Ok(()));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Doctor).unwrap(), "\"doctor\"");
        assert_eq!(serde_json::to_string(&Role::Patient).unwrap(), "\"patient\"");
    }

    #[test]
    fn human_id_follows_role() {
        let now = Utc::now();
        let user = User {
            id: None,
            role: Role::Doctor,
            name: "Meera".to_string(),
            email: "meera@x.com".to_string(),
            password_hash: "hash".to_string(),
            phone: None,
            patient_id: None,
            doctor_id: Some("DOC007".to_string()),
            avatar: None,
            hospital: None,
            branch: None,
            speciality: None,
            qualification: None,
            experience: None,
            address: None,
            blood_group: None,
            date_of_birth: None,
            gender: None,
            age: None,
            height: None,
            weight: None,
            adhaar: None,
            alternative_phone: None,
            login_otp: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(user.human_id(), Some("DOC007"));
    }

    #[test]
    fn response_never_carries_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Some(ObjectId::new()),
            role: Role::Patient,
            name: "Arun".to_string(),
            email: "arun@x.com".to_string(),
            password_hash: "$2b$08$secret".to_string(),
            phone: Some("9876543210".to_string()),
            patient_id: Some("250101ar7k".to_string()),
            doctor_id: None,
            avatar: None,
            hospital: None,
            branch: None,
            speciality: None,
            qualification: None,
            experience: None,
            address: None,
            blood_group: Some("O+".to_string()),
            date_of_birth: None,
            gender: None,
            age: Some(30),
            height: None,
            weight: None,
            adhaar: None,
            alternative_phone: None,
            login_otp: Some(LoginOtp {
                code: "123456".to_string(),
                expires_at: now,
            }),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&user.to_response()).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
        assert!(!json.contains("123456"));
        assert!(json.contains("250101ar7k"));
    }
}
