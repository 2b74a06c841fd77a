//! Progress reporting while a codex is being assembled

use indicatif::{ProgressBar, ProgressStyle};

pub const DEFAULT_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

/// Progress bar for one loading phase; hidden unless `visible`.
pub fn phase_bar(length: u64, description: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(length);
    if let Ok(style) = ProgressStyle::default_bar().template(DEFAULT_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(description.to_string());
    pb
}

/// Spinner for phases of unknown length, e.g. parsing a whole document.
pub fn phase_spinner(description: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_message(description.to_string());
    pb
}
