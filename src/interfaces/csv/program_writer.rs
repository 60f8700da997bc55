use crate::domain::program::Program;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ProgramRow<'a> {
    code: &'a str,
    name: &'a str,
    institution: &'a str,
    fee: String,
    tags: String,
}

/// Writes programs as CSV with a header row.
pub struct ProgramWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ProgramWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_programs<'a>(&mut self, programs: impl IntoIterator<Item = &'a Program>) -> Result<()> {
        for program in programs {
            self.writer.serialize(ProgramRow {
                code: &program.code,
                name: &program.name,
                institution: &program.institution,
                fee: program.fee_label(),
                tags: program.tags.join(", "),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
