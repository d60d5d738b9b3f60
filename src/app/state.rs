use crate::upload::{SelectedFile, UploadOutcome};

/// Handed to the upload task; its generation tells whether the result still applies.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    pub generation: u64,
    pub file: SelectedFile,
}

/// Local state of the import widget: one file slot and the upload in flight, if any.
#[derive(Debug, Default)]
pub struct ImportState {
    selected: Option<SelectedFile>,
    /// Bumped on every change of the slot so late upload results can be recognised.
    generation: u64,
    uploading: bool,
}

impl ImportState {
    pub fn select(&mut self, file: SelectedFile) {
        self.selected = Some(file);
        self.generation += 1;
        self.uploading = false;
    }

    pub fn remove(&mut self) {
        self.selected = None;
        self.generation += 1;
        self.uploading = false;
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn begin_upload(&mut self) -> Option<UploadTicket> {
        if self.uploading {
            log::warn!("Upload already in progress");
            return None;
        }
        let Some(file) = &self.selected else {
            log::error!("uploaded file is absent");
            return None;
        };

        self.uploading = true;
        Some(UploadTicket {
            generation: self.generation,
            file: file.clone(),
        })
    }

    /// Applies an upload result. Returns false when it belongs to a selection that is gone.
    pub fn finish_upload(&mut self, generation: u64, outcome: &UploadOutcome) -> bool {
        if generation != self.generation {
            log::debug!(
                "Ignoring upload result for selection {generation}, current is {}",
                self.generation
            );
            return false;
        }

        self.uploading = false;
        if *outcome == UploadOutcome::Completed {
            self.selected = None;
            self.generation += 1;
        }
        true
    }
}
