use eframe::egui::Color32;

pub trait ColorExt {
    /// Parses `#rrggbb` or the short `#rgb` form; the leading `#` is optional.
    fn from_hex(hex: &str) -> Option<Self>
    where
        Self: Sized;
}

impl ColorExt for Color32 {
    fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        let [r, g, b] = match hex.len() {
            6 => [channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?],
            // `#abc` is `#aabbcc`.
            3 => [
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            ],
            _ => return None,
        };

        Some(Color32::from_rgb(r, g, b))
    }
}
