//! 领域层

pub mod value_objects;
mod verification_request;

pub use verification_request::VerificationRequest;
