const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human readable size shown next to the selected file, e.g. `12.4 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{bytes} B"),
        _ => format!("{size:.1} {}", UNITS[unit]),
    }
}
