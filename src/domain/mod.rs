//! Domain layer: programs, student profiles, registration records and the
//! ports the application layer drives.

pub mod payment;
pub mod ports;
pub mod profile;
pub mod program;
pub mod recommendation;
pub mod registration;
