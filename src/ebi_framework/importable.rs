use anyhow::Result;
use std::io::BufRead;

pub trait Importable {
    fn import(reader: &mut dyn BufRead) -> Result<Self>
    where
        Self: Sized;
}
