use super::routes::Route;
use super::AdminApp;
use eframe::egui::{self, RichText};

impl AdminApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("navigation").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.add_enabled_ui(self.router.can_go_back(), |ui| {
                    if ui.button("⬅").on_hover_text("Back").clicked() {
                        self.router.back();
                    }
                });
                ui.separator();
                for route in Route::ALL {
                    let selected = self.router.current() == route;
                    if ui.selectable_label(selected, route.title()).clicked() {
                        self.router.navigate(route);
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(self.router.current().path())
                            .monospace()
                            .color(ui.visuals().text_color().gamma_multiply(0.6)),
                    );
                });
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                match self.router.current() {
                    Route::Home => self.render_home(ui),
                    Route::ProductImport => self.import.show(ui),
                }
            });
        });

        self.toaster.render(ctx);
    }

    fn render_home(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("Shop admin");
            ui.add_space(5.0);
            ui.label(
                RichText::new("Manage the product catalogue")
                    .color(ui.visuals().text_color().gamma_multiply(0.7)),
            );
            ui.add_space(20.0);
            if ui.button("📤 Import products").clicked() {
                self.router.navigate_path(Route::ProductImport.path());
            }
        });
    }
}
