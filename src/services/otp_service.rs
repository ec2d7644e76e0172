use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::{
    bson::{self, doc, oid::ObjectId},
    Collection, Database,
};
use rand::Rng;

use crate::errors::{AppError, Result};
use crate::models::user::{Claims, LoginOtp, User};

pub const OTP_TTL_MINUTES: i64 = 10;
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct OtpService {
    db: Database,
    jwt_secret: String,
}

impl OtpService {
    pub fn new(db: Database, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    /// Uniform 6-digit code, 100000..=999999.
    pub fn generate_otp() -> String {
        let mut rng = rand::thread_rng();
        rng.gen_range(100_000..=999_999).to_string()
    }

    /// Writes a fresh code onto the account in one update. A concurrent
    /// issue for the same account simply overwrites this one; only the
    /// latest code is ever valid.
    pub async fn issue_for_user(&self, user_id: &ObjectId) -> Result<LoginOtp> {
        let users: Collection<User> = self.db.collection("users");

        let otp = LoginOtp {
            code: Self::generate_otp(),
            expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
        };

        let update = doc! {
            "$set": {
                "login_otp": bson::to_bson(&otp)
                    .map_err(|e| AppError::internal(format!("BSON conversion failed: {}", e)))?,
                "updated_at": bson::DateTime::now(),
            }
        };

        let result = users.update_one(doc! { "_id": user_id }, update).await?;
        ensure_account_matched(result.matched_count)?;

        Ok(otp)
    }

    /// Single-use enforcement: the slot is removed the moment a code is
    /// accepted.
    pub async fn clear_for_user(&self, user_id: &ObjectId) -> Result<()> {
        let users: Collection<User> = self.db.collection("users");

        let update = doc! {
            "$unset": { "login_otp": "" },
            "$set": { "updated_at": bson::DateTime::now() },
        };

        let result = users.update_one(doc! { "_id": user_id }, update).await?;
        ensure_account_matched(result.matched_count)?;

        Ok(())
    }

    /// Signed session token carrying the account id and role, valid 24 hours.
    pub fn issue_session_token(&self, user: &User) -> Result<String> {
        let id = user
            .id
            .ok_or_else(|| AppError::internal("user has no id"))?;

        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(SESSION_TTL_HOURS))
            .ok_or_else(|| AppError::internal("failed to calculate token expiration"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: id.to_hex(),
            role: user.role,
            exp: expiration,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }
}

/// Guards writes keyed by `_id`: zero matches means the account vanished
/// after the handler resolved it, so no code was actually stored or cleared.
fn ensure_account_matched(matched_count: u64) -> Result<()> {
    if matched_count == 0 {
        return Err(AppError::UserNotFound);
    }
    Ok(())
}

/// Masks the delivery address for client display: first three characters of
/// the local part stay visible, the rest is replaced before the domain.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(3).collect();
            format!("{}***@{}", visible, domain)
        }
        None => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Some(ObjectId::new()),
            role: Role::Doctor,
            name: "Meera".to_string(),
            email: "meera@x.com".to_string(),
            password_hash: "hash".to_string(),
            phone: None,
            patient_id: None,
            doctor_id: Some("DOC001".to_string()),
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
        }
    }

    #[test]
    fn writes_for_missing_accounts_are_rejected() {
        assert!(matches!(
            ensure_account_matched(0),
            Err(AppError::UserNotFound)
        ));
        assert!(ensure_account_matched(1).is_ok());
    }

    #[tokio::test]
    async fn session_token_carries_id_role_and_24h_expiry() {
        // Client construction is lazy; no server is contacted for signing.
        let client = mongodb::Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        let service = OtpService::new(
            client.database("smarthealth_test"),
            "test-secret".to_string(),
        );

        let user = sample_user();
        let token = service.issue_session_token(&user).unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user.id.unwrap().to_hex());
        assert_eq!(decoded.claims.role, Role::Doctor);

        let expected = (Utc::now() + Duration::hours(SESSION_TTL_HOURS)).timestamp() as usize;
        assert!(decoded.claims.exp.abs_diff(expected) < 60);
    }

    #[test]
    fn generated_otp_is_six_digits_in_range() {
        for _ in 0..1000 {
            let code = OtpService::generate_otp();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn mask_keeps_first_three_chars_and_domain() {
        assert_eq!(mask_email("nandhakumar@gmail.com"), "nan***@gmail.com");
        assert_eq!(mask_email("arun@x.com"), "aru***@x.com");
    }

    #[test]
    fn mask_handles_short_local_parts() {
        assert_eq!(mask_email("a@x.com"), "a***@x.com");
        assert_eq!(mask_email("ab@x.com"), "ab***@x.com");
    }

    #[test]
    fn masked_form_never_contains_full_local_part() {
        let masked = mask_email("confidential@clinic.org");
        assert!(!masked.contains("confidential"));
        assert!(masked.ends_with("@clinic.org"));
    }

    #[test]
    fn mask_passes_through_strings_without_at_sign() {
        assert_eq!(mask_email("not-an-email"), "not-an-email");
    }
}
