pub mod health;
pub mod portal;
pub mod session;
pub mod stats;
