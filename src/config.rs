// config.rs
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub port: u16,
    pub host: String,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_email: String,
    pub from_name: String,
    pub transport: MailTransportConfig,
}

#[derive(Debug, Clone)]
pub enum MailTransportConfig {
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
    },
    /// Writes outgoing mail to a directory instead of a relay. Development only.
    File { path: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv().ok();

        // SMTP credentials are optional; without them mail lands in a local
        // directory so the OTP flow stays testable end to end.
        let transport = match env::var("SMTP_HOST") {
            Ok(host) => MailTransportConfig::Smtp {
                host,
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .expect("SMTP_PORT must be a number"),
                username: env::var("SMTP_USERNAME").expect("SMTP_USERNAME must be set"),
                password: env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD must be set"),
            },
            Err(_) => MailTransportConfig::File {
                path: env::var("MAIL_OUTBOX_DIR").unwrap_or_else(|_| "outbox".to_string()),
            },
        };

        AppConfig {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "smarthealth_db".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .expect("PORT must be a number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            mail: MailConfig {
                from_email: env::var("MAIL_FROM_EMAIL")
                    .unwrap_or_else(|_| "noreply@smarthealth.local".to_string()),
                from_name: env::var("MAIL_FROM_NAME")
                    .unwrap_or_else(|_| "Team Smart Health".to_string()),
                transport,
            },
        }
    }
}
