use super::state::ImportState;
use crate::notify::{NotificationBus, Severity};
use crate::upload::{SelectedFile, UploadFlow, UploadOutcome};
use crate::utils::file_size::format_size;
use eframe::egui::{self, RichText};
use rfd::FileDialog;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use tokio::runtime::Handle;

/// Upload widget for one import endpoint: pick a file, then remove it or upload it.
pub struct FileImport {
    title: String,
    resource_url: String,
    state: ImportState,
    flow: UploadFlow,
    bus: NotificationBus,
    runtime: Handle,
    results_sender: Sender<(u64, UploadOutcome)>,
    results: Receiver<(u64, UploadOutcome)>,
}

impl FileImport {
    pub fn new(
        title: impl Into<String>,
        resource_url: impl Into<String>,
        flow: UploadFlow,
        bus: NotificationBus,
        runtime: Handle,
    ) -> Self {
        let (results_sender, results) = channel();
        Self {
            title: title.into(),
            resource_url: resource_url.into(),
            state: ImportState::default(),
            flow,
            bus,
            runtime,
            results_sender,
            results,
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn choose_file(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("CSV", &["csv"])
            .add_filter("All files", &["*"])
            .pick_file()
        {
            self.load_file(&path);
        }
    }

    pub fn load_file(&mut self, path: &Path) {
        match SelectedFile::read(path) {
            Ok(file) => {
                log::info!("Selected {} ({})", file.name, format_size(file.size()));
                self.state.select(file);
            }
            Err(e) => {
                log::error!("Failed to read {path:?}: {e}");
                self.bus
                    .publish(format!("Could not read file: {e}"), Severity::Error);
            }
        }
    }

    pub fn select(&mut self, file: SelectedFile) {
        self.state.select(file);
    }

    pub fn remove_file(&mut self) {
        self.state.remove();
    }

    /// Starts the upload on the shared runtime; the result is picked up by [`FileImport::poll`].
    pub fn upload_file(&mut self, repaint: Option<egui::Context>) {
        let Some(ticket) = self.state.begin_upload() else {
            return;
        };

        let flow = self.flow.clone();
        let resource_url = self.resource_url.clone();
        let sender = self.results_sender.clone();

        self.runtime.spawn(async move {
            let outcome = flow.upload(&resource_url, &ticket.file).await;
            sender.send((ticket.generation, outcome)).unwrap_or_default();
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }

    pub fn poll(&mut self) {
        while let Ok((generation, outcome)) = self.results.try_recv() {
            if self.state.finish_upload(generation, &outcome) && outcome == UploadOutcome::Completed {
                log::info!("Upload finished, ready for the next file");
            }
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.heading(&self.title);
        ui.add_space(8.0);

        ui.group(|ui| {
            let selected = self
                .state
                .selected()
                .map(|file| (file.name.clone(), file.size()));

            match selected {
                None => {
                    ui.horizontal(|ui| {
                        if ui.button("📁 Choose file").clicked() {
                            self.choose_file();
                        }
                        ui.label(
                            RichText::new("No file selected")
                                .color(ui.visuals().text_color().gamma_multiply(0.7)),
                        );
                    });
                }
                Some((name, size)) => {
                    ui.label(format!("{name} ({})", format_size(size)));
                    ui.add_space(4.0);
                    ui.horizontal(|ui| {
                        let idle = !self.state.is_uploading();
                        if ui.add_enabled(idle, egui::Button::new("🗑 Remove file")).clicked() {
                            self.remove_file();
                        }
                        if ui.add_enabled(idle, egui::Button::new("📤 Upload file")).clicked() {
                            self.upload_file(Some(ui.ctx().clone()));
                        }
                        if !idle {
                            ui.spinner();
                        }
                    });
                }
            }
        });
    }
}
