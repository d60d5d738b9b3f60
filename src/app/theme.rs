use crate::config::ThemeConfig;
use crate::notify::Severity;
use crate::utils::color::ColorExt;
use eframe::egui::{self, Color32};

pub const DEFAULT_ACCENT: Color32 = Color32::from_rgb(161, 89, 225);

pub fn accent(theme: &ThemeConfig) -> Color32 {
    Color32::from_hex(&theme.accent).unwrap_or_else(|| {
        log::warn!("Invalid accent color {:?}, using default", theme.accent);
        DEFAULT_ACCENT
    })
}

pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Success => Color32::from_rgb(46, 125, 50),
        Severity::Error => Color32::from_rgb(211, 47, 47),
        Severity::Info => Color32::from_rgb(2, 136, 209),
        Severity::Warning => Color32::from_rgb(237, 108, 2),
    }
}

pub fn visuals(theme: &ThemeConfig) -> egui::Visuals {
    let accent = accent(theme);
    let mut visuals = if theme.dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    visuals.selection.bg_fill = accent;
    visuals.hyperlink_color = accent;
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, accent);
    visuals
}

pub fn apply(ctx: &egui::Context, theme: &ThemeConfig) {
    ctx.set_visuals(visuals(theme));
}
