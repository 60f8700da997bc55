pub mod program_writer;
pub mod registration_writer;
