use derivative::Derivative;
use std::fs;
use std::io;
use std::path::Path;

/// The one file the import widget holds between selection and upload.
#[derive(Derivative, Clone, PartialEq, Eq)]
#[derivative(Debug)]
pub struct SelectedFile {
    pub name: String,
    #[derivative(Debug = "ignore")]
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        let name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
            .to_string_lossy()
            .to_string();
        let bytes = fs::read(path)?;
        Ok(Self { name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Destination obtained and the bytes were accepted.
    Completed,
    /// The destination request failed; nothing was transferred.
    NoDestination,
    TransferFailed(String),
}
