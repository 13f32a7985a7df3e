//! Shared CLI helpers used across multiple commands.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Run one pipeline stage behind a spinner.
///
/// The spinner is hidden when stderr is not a terminal.
pub fn stage<T>(message: &str, work: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = work();
    match &result {
        Ok(_) => pb.finish_with_message(format!("{message}: done")),
        Err(_) => pb.abandon_with_message(format!("{message}: failed")),
    }
    result
}

/// Indices of at most `rows` entries spread evenly over `len` items.
pub fn sample_rows(len: usize, rows: usize) -> impl Iterator<Item = usize> {
    let step = len.div_ceil(rows.max(1)).max(1);
    (0..len).step_by(step)
}
