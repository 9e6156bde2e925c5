pub mod lockout;
pub mod pending_ticket;
pub mod totp_secret;
pub mod user_password;
