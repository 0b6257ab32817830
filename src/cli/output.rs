//! Terminal output for the `init` and `config` commands.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Outcome shown in front of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Done,
    Skipped,
    Warning,
    Failed,
}

impl Mark {
    fn tag(self) -> &'static str {
        match self {
            Mark::Done => "[ok]",
            Mark::Skipped => "[skip]",
            Mark::Warning => "[warn]",
            Mark::Failed => "[fail]",
        }
    }

    fn symbol(self) -> String {
        match self {
            Mark::Done => "✓".green().bold().to_string(),
            Mark::Skipped => "○".yellow().to_string(),
            Mark::Warning => "!".yellow().bold().to_string(),
            Mark::Failed => "✗".red().bold().to_string(),
        }
    }
}

/// Line printer that honours `--no-color`.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    colored: bool,
}

impl Output {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// Prints a status line; failures go to stderr.
    pub fn status(&self, mark: Mark, message: &str) {
        let line = self.status_line(mark, message);
        if mark == Mark::Failed {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    pub fn section(&self, title: &str) {
        println!("\n{}", self.section_line(title));
    }

    /// Prints one `key: value` row of a listing.
    pub fn field(&self, key: &str, value: impl Display) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bold());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Prints a shell command the user can run next.
    pub fn shell(&self, command: &str) {
        if self.colored {
            println!("    {} {}", "$".dimmed(), command.cyan());
        } else {
            println!("    $ {}", command);
        }
    }

    fn status_line(&self, mark: Mark, message: &str) -> String {
        if self.colored {
            format!("  {} {}", mark.symbol(), message)
        } else {
            format!("  {} {}", mark.tag(), message)
        }
    }

    fn section_line(&self, title: &str) -> String {
        if self.colored {
            format!("  {}", title.bold().underline())
        } else {
            format!("  == {} ==", title)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_status_lines() {
        let output = Output::new(false);

        assert_eq!(output.status_line(Mark::Done, "written"), "  [ok] written");
        assert_eq!(output.status_line(Mark::Skipped, "data"), "  [skip] data");
        assert_eq!(output.status_line(Mark::Failed, "boom"), "  [fail] boom");
        assert_eq!(output.section_line("Next"), "  == Next ==");
    }

    #[test]
    fn test_colored_lines_keep_the_message() {
        let output = Output::new(true);

        let line = output.status_line(Mark::Warning, "usuarios.toml already exists");
        assert!(line.contains("usuarios.toml already exists"));
        assert!(!line.contains("[warn]"));
        assert!(output.section_line("Configuration").contains("Configuration"));
    }
}
