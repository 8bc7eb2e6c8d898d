//! Bearer token handling

pub mod registration;
pub mod token_mngr;
