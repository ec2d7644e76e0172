use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;

use crate::config::{MailConfig, MailTransportConfig};
use crate::errors::{AppError, Result};

pub struct MailService {
    transport: MailTransport,
    from_email: String,
    from_name: String,
}

enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl MailService {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let transport = match &config.transport {
            MailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
            } => {
                let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| AppError::internal(format!("SMTP transport: {}", e)))?
                    .port(*port)
                    .credentials(Credentials::new(username.clone(), password.clone()));
                MailTransport::Smtp(builder.build())
            }
            MailTransportConfig::File { path } => {
                let outbox = Path::new(path);
                if !outbox.exists() {
                    std::fs::create_dir_all(outbox)
                        .map_err(|e| AppError::internal(format!("create outbox dir: {}", e)))?;
                }
                tracing::warn!("No SMTP configured, writing mail to {}", path);
                MailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(outbox))
            }
        };

        Ok(Self {
            transport,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    pub async fn send_otp_email(&self, to_email: &str, to_name: &str, code: &str) -> Result<()> {
        let body = otp_body(to_name, code);
        self.send(to_email, to_name, "Smart Health Login Verification", &body)
            .await
    }

    pub async fn send_welcome_email(&self, to_email: &str, to_name: &str, human_id: &str) -> Result<()> {
        let body = welcome_body(to_name, human_id);
        self.send(to_email, to_name, "Welcome to Smart Health!", &body)
            .await
    }

    async fn send(&self, to_email: &str, to_name: &str, subject: &str, body: &str) -> Result<()> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::internal(format!("parse from address: {}", e)))?;

        let to = format!("{} <{}>", to_name, to_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::mail(format!("invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::mail(format!("build message: {}", e)))?;

        match &self.transport {
            MailTransport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| AppError::mail(e.to_string()))?;
            }
            MailTransport::File(file) => {
                file.send(message)
                    .await
                    .map_err(|e| AppError::mail(e.to_string()))?;
            }
        }

        Ok(())
    }
}

fn otp_body(name: &str, code: &str) -> String {
    format!(
        "Hello {},\n\nYour OTP for Smart Health Login is: {}\n\n\
         This code expires in 10 minutes.\n\nRegards,\nTeam Smart Health",
        name, code
    )
}

fn welcome_body(name: &str, human_id: &str) -> String {
    format!(
        "Welcome {}!\n\nRegistration Successful. Your ID is: {}.\n\n\
         Keep this safe for logging in.\n\nRegards,\nTeam Smart Health",
        name, human_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(dir: &str) -> MailConfig {
        MailConfig {
            from_email: "noreply@smarthealth.local".to_string(),
            from_name: "Team Smart Health".to_string(),
            transport: MailTransportConfig::File {
                path: dir.to_string(),
            },
        }
    }

    #[test]
    fn otp_body_contains_code_and_expiry_notice() {
        let body = otp_body("Arun", "483921");
        assert!(body.contains("Hello Arun,"));
        assert!(body.contains("483921"));
        assert!(body.contains("expires in 10 minutes"));
    }

    #[test]
    fn welcome_body_contains_allocated_id() {
        let body = welcome_body("Meera", "DOC003");
        assert!(body.contains("Welcome Meera!"));
        assert!(body.contains("DOC003"));
    }

    #[tokio::test]
    async fn file_transport_delivers_to_outbox() {
        let dir = std::env::temp_dir().join("smarthealth-mail-test");
        let service = MailService::new(&file_config(dir.to_str().unwrap())).unwrap();

        service
            .send_otp_email("arun@x.com", "Arun", "123456")
            .await
            .unwrap();

        let delivered = std::fs::read_dir(&dir).unwrap().count();
        assert!(delivered >= 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn rejects_unparseable_recipient() {
        let dir = std::env::temp_dir().join("smarthealth-mail-test-bad");
        let service = MailService::new(&file_config(dir.to_str().unwrap())).unwrap();

        let result = service.send_otp_email("not an address", "X", "123456").await;
        assert!(matches!(result, Err(AppError::MailDelivery(_))));
        std::fs::remove_dir_all(&dir).ok();
    }
}
