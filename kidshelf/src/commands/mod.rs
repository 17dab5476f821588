pub mod assess;
pub mod discover;
pub mod enrich;
pub mod import;
pub mod reassess;
pub mod reset;
pub mod review;

use indicatif::{ProgressBar, ProgressStyle};

/// Shared progress bar style for the batch commands.
pub fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}
