pub mod account_ids;
pub mod mail_service;
pub mod otp_service;
