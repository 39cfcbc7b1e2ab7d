//! Terminal output: banners, progress bars and log setup.

use indicatif::{ProgressBar, ProgressStyle, style::TemplateError};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const RULE: &str = "══════════════════════════════════════════════════════════════";

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub(crate) fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Print a boxed section title.
pub(crate) fn banner(title: &str) {
    println!("\n╔{RULE}╗");
    println!("║{:^62}║", title);
    println!("╚{RULE}╝\n");
}

/// Progress bar over `len` items.
pub(crate) fn progress_bar(len: usize, message: &'static str) -> Result<ProgressBar, TemplateError> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_length() {
        let pb = progress_bar(7, "working").unwrap();
        assert_eq!(pb.length(), Some(7));
        pb.finish_and_clear();
    }

    #[test]
    fn test_rule_fits_banner_width() {
        assert_eq!(RULE.chars().count(), 62);
    }
}
