use anyhow::Result;
use serde::Serialize;

pub trait Exportable {
    /// Writes the object in its line-based text format.
    fn export(&self, f: &mut dyn std::io::Write) -> Result<()>;

    fn export_json(&self, f: &mut dyn std::io::Write) -> Result<()>
    where
        Self: Serialize,
    {
        serde_json::to_writer_pretty(&mut *f, self)?;
        Ok(writeln!(f)?)
    }
}

impl Exportable for String {
    fn export(&self, f: &mut dyn std::io::Write) -> Result<()> {
        Ok(writeln!(f, "{}", self)?)
    }
}
