use crate::domain::registration::Registration;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct RegistrationRow<'a> {
    id: String,
    sequence: Option<u64>,
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    rank: Option<&'static str>,
    program_code: &'a str,
    program_name: &'a str,
    amount: String,
    currency: &'a str,
    status: &'static str,
    created_at: String,
}

/// Writes stored registrations as CSV for the admin view.
pub struct RegistrationWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RegistrationWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_registrations(&mut self, registrations: &[Registration]) -> Result<()> {
        for r in registrations {
            self.writer.serialize(RegistrationRow {
                id: r.id.to_string(),
                sequence: r.sequence,
                name: &r.name,
                email: &r.email,
                phone: r.phone.as_deref(),
                rank: r.rank.map(|rank| rank.as_str()),
                program_code: &r.program_code,
                program_name: &r.program_name,
                amount: r.amount.to_string(),
                currency: r.currency.as_str(),
                status: r.status.as_str(),
                created_at: r.created_at.to_rfc3339(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
