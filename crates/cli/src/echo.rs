use crate::VERSION;
use owo_colors::OwoColorize;
use quire_core::ResolutionReport;
use std::time::Duration;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Quire".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Resolve archived article trees into metadata records".dimmed());
    eprintln!();
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print a labelled detail line under the current step
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print the counts of one resolution pass
pub fn print_resolution_summary(report: &ResolutionReport, elapsed: Duration) {
    print_detail("Plugin", &report.plugin);
    print_detail("Articles", &report.articles.len().to_string());
    print_detail("Emitted", &report.emitted_records().to_string());

    let suppressed = report.suppressed_records();
    if suppressed > 0 {
        print_detail("Suppressed", &suppressed.to_string());
    }
    if !report.discarded.is_empty() {
        print_detail("Discarded", &report.discarded.len().to_string());
    }

    for conflict in &report.conflicts {
        print_warning(&format!(
            "{} {}: kept {}, rejected {}",
            conflict.key, conflict.role, conflict.kept, conflict.rejected
        ));
    }

    print_detail("Time", &format_duration(elapsed));
}

/// Format elapsed time for display
pub fn format_duration(elapsed: Duration) -> String {
    let millis = elapsed.as_secs_f64() * 1000.0;
    if millis >= 1000.0 { format!("{:.2}s", millis / 1000.0) } else { format!("{:.1}ms", millis) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.50s");
    }
}
