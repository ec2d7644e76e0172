pub mod counter;
pub mod user;
