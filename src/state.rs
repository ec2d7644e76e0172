use std::sync::Arc;

use mongodb::Database;

use crate::services::mail_service::MailService;
use crate::services::otp_service::OtpService;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt_secret: String,
    pub otp_service: OtpService,
    pub mail_service: Arc<MailService>,
}

impl AppState {
    pub fn new(db: Database, jwt_secret: String, mail_service: MailService) -> Self {
        let otp_service = OtpService::new(db.clone(), jwt_secret.clone());
        AppState {
            db,
            jwt_secret,
            otp_service,
            mail_service: Arc::new(mail_service),
        }
    }
}
