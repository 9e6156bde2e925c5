//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random tokens, base64)
//! - Password hashing (Argon2id)
//! - Cookie management
//! - Client identification (IP / User-Agent extraction)

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
