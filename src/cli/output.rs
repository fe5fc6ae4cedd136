//! Terminal output for scanlink
//!
//! Styled status lines in the manner of lint-staged and similar tools. Everything except
//! errors is suppressed in quiet mode.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Print a category header
    pub fn category(&self, category: &str) {
        if !self.quiet {
            println!("\n{}", style(category).bold().cyan());
        }
    }

    /// Print a count/summary line
    pub fn count(&self, icon: &str, message: &str, count: usize) {
        if !self.quiet {
            println!(
                "{} {} {}",
                style(icon).cyan().bold(),
                style(message).bold(),
                style(format!("({count})")).dim()
            );
        }
    }

    /// Print a key-value pair with consistent styling
    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        if !self.quiet {
            let styled_value = if highlight {
                style(value).green().bold()
            } else {
                style(value).white()
            };
            println!("  {:<18} {}", style(key).dim(), styled_value);
        }
    }

    /// Print one finding: rule, message and the file it points at
    pub fn detection(&self, rule: &str, message: &str, file: Option<&str>) {
        if !self.quiet {
            println!("    {} {} {}", style("•").red(), style(rule).yellow(), message);
            if let Some(file) = file {
                println!("      {}", style(file).underlined());
            }
        }
    }

    /// Print a batch failure; shown even in quiet mode
    pub fn batch_error(&self, batch_id: &str, code: &str, message: &str) {
        eprintln!(
            "    {} {} {} {}",
            style("✗").red().bold(),
            style(batch_id).dim(),
            style(format!("[{code}]")).red(),
            message
        );
    }

    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }
}
