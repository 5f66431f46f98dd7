use anyhow::Result;
use crossterm::style::Color;

pub use screen::{Screen, TerminalScreen};
pub use typeface::{FigletTypeface, Typeface};

/// 終端機輸出
pub mod screen;
/// 大字型
pub mod typeface;

const PRICE_COLOR: Color = Color::Green;
const ERROR_COLOR: Color = Color::Red;

/// The big price on screen, plus the memory of what is currently shown.
///
/// `last_displayed` only changes after a successful redraw; error screens do
/// not touch it.
pub struct PriceBoard<S: Screen> {
    screen: S,
    typeface: Box<dyn Typeface + Send + Sync>,
    last_displayed: Option<String>,
    redraws: usize,
}

impl<S: Screen> PriceBoard<S> {
    pub fn new(screen: S, typeface: Box<dyn Typeface + Send + Sync>) -> Self {
        PriceBoard {
            screen,
            typeface,
            last_displayed: None,
            redraws: 0,
        }
    }

    /// Redraws the board when `price` differs from what is on screen.
    ///
    /// Returns `true` when a redraw happened.
    pub fn update(&mut self, price: &str) -> Result<bool> {
        if self.last_displayed.as_deref() == Some(price) {
            return Ok(false);
        }

        let art = self.typeface.render(price)?;
        let (columns, rows) = self.screen.size();

        self.screen.clear()?;
        self.screen
            .print_lines(&layout(&art, columns, rows), PRICE_COLOR)?;

        self.last_displayed = Some(price.to_string());
        self.redraws += 1;

        Ok(true)
    }

    /// Clears the screen and prints `Error: <message>` in red.
    pub fn show_error(&mut self, message: &str) -> Result<()> {
        self.screen.clear()?;
        self.screen
            .print_lines(&[format!("Error: {}", message)], ERROR_COLOR)?;
        Ok(())
    }

    pub fn hide_cursor(&mut self) -> Result<()> {
        Ok(self.screen.hide_cursor()?)
    }

    pub fn restore(&mut self) -> Result<()> {
        Ok(self.screen.restore()?)
    }

    pub fn last_displayed(&self) -> Option<&str> {
        self.last_displayed.as_deref()
    }

    pub fn redraws(&self) -> usize {
        self.redraws
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }
}

/// Centers `lines` inside a `columns` x `rows` terminal.
///
/// The result starts with the blank lines of the top padding, followed by
/// each art line shifted right. Both paddings clamp at zero when the art is
/// larger than the terminal.
pub fn layout(lines: &[String], columns: u16, rows: u16) -> Vec<String> {
    let top = ((rows as i64 - lines.len() as i64) / 2).max(0) as usize;
    let mut centered = Vec::with_capacity(top + lines.len());
    centered.resize(top, String::new());

    for line in lines {
        let width = line.chars().count() as i64;
        let left = ((columns as i64 - width) / 2).max(0) as usize;
        centered.push(format!("{}{}", " ".repeat(left), line));
    }

    centered
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io;

    use anyhow::anyhow;

    use super::*;

    /// Screen fake that records calls instead of drawing.
    #[derive(Default)]
    pub(crate) struct RecordingScreen {
        pub size: (u16, u16),
        pub clears: usize,
        pub printed: Vec<(Vec<String>, Color)>,
        pub cursor_hidden: bool,
    }

    impl Screen for RecordingScreen {
        fn size(&self) -> (u16, u16) {
            self.size
        }

        fn clear(&mut self) -> io::Result<()> {
            self.clears += 1;
            Ok(())
        }

        fn print_lines(&mut self, lines: &[String], color: Color) -> io::Result<()> {
            self.printed.push((lines.to_vec(), color));
            Ok(())
        }

        fn hide_cursor(&mut self) -> io::Result<()> {
            self.cursor_hidden = true;
            Ok(())
        }

        fn restore(&mut self) -> io::Result<()> {
            self.cursor_hidden = false;
            Ok(())
        }
    }

    /// Renders text as itself, one line.
    pub(crate) struct PlainTypeface;

    impl Typeface for PlainTypeface {
        fn render(&self, text: &str) -> Result<Vec<String>> {
            Ok(vec![text.to_string()])
        }
    }

    struct BrokenTypeface;

    impl Typeface for BrokenTypeface {
        fn render(&self, _text: &str) -> Result<Vec<String>> {
            Err(anyhow!("no glyphs"))
        }
    }

    pub(crate) fn board() -> PriceBoard<RecordingScreen> {
        let screen = RecordingScreen {
            size: (20, 5),
            ..Default::default()
        };
        PriceBoard::new(screen, Box::new(PlainTypeface))
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut board = board();

        assert!(board.update("$67 235").unwrap());
        assert!(!board.update("$67 235").unwrap());

        assert_eq!(board.redraws(), 1);
        assert_eq!(board.screen().clears, 1);
        assert_eq!(board.screen().printed.len(), 1);
        assert_eq!(board.last_displayed(), Some("$67 235"));
    }

    #[test]
    fn test_update_redraws_on_change() {
        let mut board = board();

        board.update("$1").unwrap();
        board.update("$2").unwrap();
        board.update("$1").unwrap();

        assert_eq!(board.redraws(), 3);
        assert_eq!(board.last_displayed(), Some("$1"));
    }

    #[test]
    fn test_update_centers_in_green() {
        let mut board = board();
        board.update("$999").unwrap();

        let (lines, color) = &board.screen().printed[0];
        assert_eq!(*color, Color::Green);
        // 5 列畫面放 1 行字：上方留 2 行；20 欄放 4 字：左邊留 8 格
        assert_eq!(
            lines,
            &vec![
                String::new(),
                String::new(),
                format!("{}$999", " ".repeat(8))
            ]
        );
    }

    #[test]
    fn test_failed_render_keeps_state() {
        let mut board = PriceBoard::new(RecordingScreen::default(), Box::new(BrokenTypeface));

        assert!(board.update("$1").is_err());
        assert_eq!(board.last_displayed(), None);
        assert_eq!(board.redraws(), 0);
        assert_eq!(board.screen().clears, 0);
    }

    #[test]
    fn test_show_error() {
        let mut board = board();
        board.update("$5").unwrap();
        board.show_error("connection refused").unwrap();

        let (lines, color) = board.screen().printed.last().unwrap();
        assert_eq!(*color, Color::Red);
        assert_eq!(lines, &vec!["Error: connection refused".to_string()]);
        assert_eq!(board.screen().clears, 2);
        assert_eq!(board.last_displayed(), Some("$5"));
    }

    #[test]
    fn test_cursor_lifecycle() {
        let mut board = board();
        board.hide_cursor().unwrap();
        assert!(board.screen().cursor_hidden);
        board.restore().unwrap();
        assert!(!board.screen().cursor_hidden);
    }

    #[test]
    fn test_layout_odd_sizes() {
        let art = vec!["abc".to_string(), "abcde".to_string()];
        let centered = layout(&art, 10, 7);

        assert_eq!(
            centered,
            vec![
                "".to_string(),
                "".to_string(),
                "   abc".to_string(),
                "  abcde".to_string()
            ]
        );
    }

    #[test]
    fn test_layout_clamps() {
        let art = vec!["wider than screen".to_string(); 4];
        let centered = layout(&art, 5, 2);

        assert_eq!(centered, art);
        assert_eq!(layout(&art, 0, 0), art);
        assert!(layout(&[], 10, 10).iter().all(String::is_empty));
    }
}
