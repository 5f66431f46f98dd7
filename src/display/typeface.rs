use std::path::Path;

use anyhow::{anyhow, Result};
use figlet_rs::FIGfont;

/// Turns a short string into multi-line block letters.
pub trait Typeface {
    fn render(&self, text: &str) -> Result<Vec<String>>;
}

/// 內建 Big 字型，只保留價格會用到的字元
const BIG_FONT: &str = include_str!("fonts/big.flf");

/// FIGlet block letters, either the built-in Big font or a `.flf` file.
pub struct FigletTypeface {
    font: FIGfont,
}

impl FigletTypeface {
    pub fn big() -> Result<Self> {
        let font = FIGfont::from_content(BIG_FONT)
            .map_err(|why| anyhow!("Failed to load the Big FIGlet font because {}", why))?;
        Ok(FigletTypeface { font })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let font = FIGfont::from_file(&path.to_string_lossy()).map_err(|why| {
            anyhow!(
                "Failed to load FIGlet font {} because {}",
                path.display(),
                why
            )
        })?;
        Ok(FigletTypeface { font })
    }

    /// Uses `path` when given, the built-in font otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::big(),
        }
    }
}

impl Typeface for FigletTypeface {
    fn render(&self, text: &str) -> Result<Vec<String>> {
        let figure = self
            .font
            .convert(text)
            .ok_or_else(|| anyhow!("Failed to render '{}' with FIGlet", text))?;

        let mut lines: Vec<String> = figure.to_string().lines().map(str::to_string).collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        Ok(lines)
    }
}
