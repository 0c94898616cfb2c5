//! Distribution name normalisation.

/// Normalise a distribution name the way package indexes compare them:
/// lowercase, with every run of `-`, `_` and `.` collapsed to a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;

    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
                in_separator = true;
            }
        } else {
            normalized.extend(ch.to_lowercase());
            in_separator = false;
        }
    }

    normalized
}
