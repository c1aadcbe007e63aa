use anyhow::Result;
use clap::ValueEnum;
use colored::{Color, Colorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table, presets};
use serde::Serialize;

use crate::theme::{ICONS, THEME};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// One line per record
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub no_color: bool,
}

/// Data that can be rendered as a table or a compact summary.
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Table with the preset matching the color setting and a bold header row.
pub fn themed_table(options: &GlobalOptions, headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(if options.no_color {
        presets::ASCII_FULL
    } else {
        presets::UTF8_FULL_CONDENSED
    });
    let header = headers.iter().map(|h| {
        let cell = Cell::new(h).add_attribute(Attribute::Bold);
        if options.no_color { cell } else { cell.fg(TableColor::Cyan) }
    });
    table.set_header(header.collect::<Vec<_>>());
    table
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }
        match self.options.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Table => println!("{}", data.to_table(&self.options)),
            OutputFormat::Compact => println!("{}", data.to_compact()),
        }
        Ok(())
    }

    fn tagged(&self, icon: &str, color: Color, message: &str) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }

    pub fn success(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.tagged(ICONS.success, THEME.success, message));
        }
    }

    /// Errors are printed even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.tagged(ICONS.error, THEME.error, message));
    }

    pub fn warning(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.tagged(ICONS.warning, THEME.warning, message));
        }
    }

    pub fn info(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.tagged(ICONS.info, THEME.info, message));
        }
    }

    pub fn heading(&self, text: &str) {
        if self.options.quiet {
            return;
        }
        if self.options.no_color {
            println!("\n{text}\n{}", "=".repeat(text.chars().count()));
        } else {
            println!("\n{}", text.color(THEME.primary).bold());
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if self.options.quiet {
            return;
        }
        if self.options.no_color {
            println!("{key}: {value}");
        } else {
            println!("{}: {}", key.color(THEME.key).bold(), value.color(THEME.value));
        }
    }

    pub fn bullet(&self, text: &str) {
        if self.options.quiet {
            return;
        }
        if self.options.no_color {
            println!("  {} {text}", ICONS.bullet);
        } else {
            println!("  {} {text}", ICONS.bullet.color(THEME.muted));
        }
    }

    /// True when structured output was requested and prose should be skipped.
    pub fn is_json(&self) -> bool {
        self.options.output_format == OutputFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Tally {
        label: String,
        count: u64,
    }

    impl TableDisplay for Tally {
        fn to_table(&self, options: &GlobalOptions) -> Table {
            let mut table = themed_table(options, &["Label", "Count"]);
            table.add_row(vec![Cell::new(&self.label), Cell::new(self.count)]);
            table
        }

        fn to_compact(&self) -> String {
            format!("{}={}", self.label, self.count)
        }
    }

    #[test]
    fn json_output_serializes() {
        let manager = OutputManager::new(GlobalOptions {
            output_format: OutputFormat::Json,
            ..Default::default()
        });
        let data = Tally {
            label: "followers".to_string(),
            count: 3,
        };
        assert!(manager.display(&data).is_ok());
        assert!(manager.is_json());
    }

    #[test]
    fn quiet_output_is_silent() {
        let manager = OutputManager::new(GlobalOptions {
            quiet: true,
            ..Default::default()
        });
        let data = Tally {
            label: "following".to_string(),
            count: 0,
        };
        assert!(manager.display(&data).is_ok());
    }

    #[test]
    fn plain_tags_skip_color_codes() {
        let manager = OutputManager::new(GlobalOptions {
            no_color: true,
            ..Default::default()
        });
        assert_eq!(manager.tagged(ICONS.info, THEME.info, "hello"), format!("{} hello", ICONS.info));
    }
}
