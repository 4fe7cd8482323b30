//! Terminal UI: status lines, command blocks, and the request spinner.
//!
//! Rendering functions take a `&mut impl Write` so tests can capture output
//! without touching the real terminal; `main` passes locked stdout.

use std::{io::Write, time::Duration};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Braille spinner frames, same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn icon_info() -> console::StyledObject<&'static str> {
    style("ℹ").blue().bold()
}
fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
fn icon_warn() -> console::StyledObject<&'static str> {
    style("!").yellow().bold()
}

// ─── Lines ────────────────────────────────────────────────────────────────────

/// `ℹ  <msg>`
pub fn info(w: &mut impl Write, msg: &str) -> std::io::Result<()> {
    writeln!(w, "{}  {msg}", icon_info())
}

/// `✓  <msg>`
pub fn success(w: &mut impl Write, msg: &str) -> std::io::Result<()> {
    writeln!(w, "{}  {msg}", icon_ok())
}

/// `!  <msg>` in yellow.
pub fn warning(w: &mut impl Write, msg: &str) -> std::io::Result<()> {
    writeln!(w, "{}  {}", icon_warn(), style(msg).yellow())
}

/// A dimmed follow-up hint.
pub fn suggestion(w: &mut impl Write, msg: &str) -> std::io::Result<()> {
    writeln!(w, "{}", style(msg).dim())
}

/// A success heading followed by an indented block of lines.
///
/// Lines are written unstyled so they can be copied straight into a shell.
pub fn success_block<I, S>(w: &mut impl Write, heading: &str, lines: I) -> std::io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    success(w, heading)?;
    writeln!(w)?;
    for line in lines {
        writeln!(w, "    {}", line.as_ref())?;
    }
    writeln!(w)
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Create and start an indeterminate spinner for `label`.
///
/// Draws to stderr and stays hidden when stderr is not a terminal.  Clear it
/// with [`ProgressBar::finish_and_clear`] before printing results.
pub fn spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(s.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).into_owned()
    }

    #[test]
    fn info_line_has_icon_and_message() {
        let out = render(|w| info(w, "Using predefined targets"));
        assert_eq!(out, "ℹ  Using predefined targets\n");
    }

    #[test]
    fn block_lines_are_indented_verbatim() {
        let out = render(|w| success_block(w, "Run these", ["a > b", "c 'd'"]));
        assert_eq!(out, "✓  Run these\n\n    a > b\n    c 'd'\n\n");
    }

    #[test]
    fn warning_keeps_message() {
        let out = render(|w| warning(w, "could not create dir"));
        assert!(out.contains("could not create dir"));
    }

    #[test]
    fn spinner_finishes_cleanly() {
        // Smoke test: must not panic without a terminal.
        let pb = spinner("Sending");
        pb.finish_and_clear();
        assert!(pb.is_finished());
    }
}
