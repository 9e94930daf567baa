//! Application Layer - Session wiring and admission use cases

pub mod session;

pub use session::{Admission, AdmissionRecord, AdmissionSession, OfferOutcome, SessionError};
