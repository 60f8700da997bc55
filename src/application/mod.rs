//! Application layer orchestrating the enrollment workflow.
//!
//! `EnrollmentService` owns the catalog and the storage and payment
//! collaborators; each student drives an `EnrollmentSession` from profile
//! confirmation to the payment link.

pub mod payment;
pub mod transactions;
pub mod workflow;
