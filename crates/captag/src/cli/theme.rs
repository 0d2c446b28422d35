//! Prompt theme and styled summary output.

use captag_core::RunCounters;
use console::{style, Style};
use dialoguer::theme::ColorfulTheme;
use std::time::Duration;

/// `ColorfulTheme` with cyan prompts, green success and red errors.
pub fn captag_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Print the run tallies to stderr.
pub fn print_summary(counters: &RunCounters, elapsed: Duration) {
    let green = Style::new().for_stderr().green();
    let yellow = Style::new().for_stderr().yellow();
    let red = Style::new().for_stderr().red();

    let rate = if elapsed.as_secs_f64() > 0.0 {
        counters.total() as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!(
        "    Processed:    {}",
        green.apply_to(format!("{:>8}", counters.processed))
    );
    if counters.skipped > 0 {
        eprintln!(
            "    Skipped:      {}",
            yellow.apply_to(format!("{:>8}", counters.skipped))
        );
    }
    if counters.failed > 0 {
        eprintln!(
            "    Failed:       {}",
            red.apply_to(format!("{:>8}", counters.failed))
        );
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", counters.total());
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.2} img/sec", rate);
    eprintln!("  ====================================");
}
