pub mod errors;
pub mod identity;
pub mod requests;
pub mod responses;
pub mod session;
