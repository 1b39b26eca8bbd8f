use anyhow::Result;

pub trait Infoable {
    /// Writes a human-readable summary of the object.
    fn info(&self, f: &mut dyn std::io::Write) -> Result<()>;
}
