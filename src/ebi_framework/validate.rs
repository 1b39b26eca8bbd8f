use anyhow::Result;
use std::io::BufRead;

use super::importable::Importable;

pub trait Validate: Importable {
    fn validate(reader: &mut dyn BufRead) -> Result<()>
    where
        Self: Sized,
    {
        Self::import(reader).map(|_| ())
    }
}

impl<T> Validate for T where T: Importable {}
