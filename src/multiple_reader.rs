use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Cursor, Read, Seek},
};

/// An input that can be read from the start as often as needed, so that several importers can be attempted on it.
pub enum MultipleReader {
    String(String),
    File(File),
    Bytes(Vec<u8>),
}

impl MultipleReader {
    pub fn from_stdin() -> Result<Self> {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("could not read from STDIN")?;
        log::info!("read {} bytes from STDIN", buf.len());
        Ok(Self::Bytes(buf))
    }

    pub fn from_file(file: File) -> Self {
        Self::File(file)
    }

    pub fn from_string(s: String) -> Self {
        Self::String(s)
    }

    pub fn get(&mut self) -> Result<Box<dyn BufRead + '_>> {
        match self {
            MultipleReader::String(s) => Ok(Box::new(Cursor::new(s.as_bytes()))),
            MultipleReader::File(file) => {
                file.rewind().context("could not rewind file")?;
                Ok(Box::new(BufReader::new(file)))
            }
            MultipleReader::Bytes(b) => Ok(Box::new(Cursor::new(b.as_slice()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Read};

    use super::MultipleReader;

    #[test]
    fn read_file_twice() {
        let mut reader = MultipleReader::from_file(File::open("testfiles/a.apnet").unwrap());

        let mut first = String::new();
        reader.get().unwrap().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        reader.get().unwrap().read_to_string(&mut second).unwrap();

        assert!(first.starts_with("accepting Petri net"));
        assert_eq!(first, second);
    }

    #[test]
    fn read_string() {
        let mut reader = MultipleReader::from_string("event log\n0\n".to_string());

        let mut content = String::new();
        reader.get().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "event log\n0\n");
    }
}
