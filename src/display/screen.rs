use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

/// The handful of terminal operations the board needs.
pub trait Screen {
    /// `(columns, rows)`; `(0, 0)` when the size cannot be determined.
    fn size(&self) -> (u16, u16);
    fn clear(&mut self) -> io::Result<()>;
    fn print_lines(&mut self, lines: &[String], color: Color) -> io::Result<()>;
    fn hide_cursor(&mut self) -> io::Result<()>;
    /// Shows the cursor and resets colors.
    fn restore(&mut self) -> io::Result<()>;
}

/// A [`Screen`] over any writer, driven with crossterm escape sequences.
pub struct TerminalScreen<W: Write> {
    out: W,
    fixed_size: Option<(u16, u16)>,
}

impl TerminalScreen<Stdout> {
    pub fn stdout() -> Self {
        TerminalScreen::new(io::stdout())
    }
}

impl<W: Write> TerminalScreen<W> {
    pub fn new(out: W) -> Self {
        TerminalScreen {
            out,
            fixed_size: None,
        }
    }

    /// Pins the reported size instead of asking the terminal.
    pub fn with_size(out: W, columns: u16, rows: u16) -> Self {
        TerminalScreen {
            out,
            fixed_size: Some((columns, rows)),
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Screen for TerminalScreen<W> {
    fn size(&self) -> (u16, u16) {
        self.fixed_size
            .or_else(|| terminal::size().ok())
            .unwrap_or((0, 0))
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()
    }

    fn print_lines(&mut self, lines: &[String], color: Color) -> io::Result<()> {
        queue!(self.out, SetForegroundColor(color))?;
        for line in lines {
            queue!(self.out, Print(line), Print("\n"))?;
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, Hide)?;
        self.out.flush()
    }

    fn restore(&mut self) -> io::Result<()> {
        queue!(self.out, ResetColor, Show)?;
        self.out.flush()
    }
}
