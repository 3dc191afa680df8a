//! Derivation of the denial dialog text.
//!
//! The dialog body is a styled chunk sequence rather than a flat string so
//! that presenters can paint the permission name differently from its
//! explanation. Deriving the text is pure: the same denied/tip pair always
//! yields the same chunks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Foreground color presenters apply to highlighted chunks.
pub const HIGHLIGHT_COLOR: &str = "#37ADA4";

/// A run of dialog text with a single visual attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    text: String,
    highlighted: bool,
}

impl TextChunk {
    /// The text of this run.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the run should be painted with [`HIGHLIGHT_COLOR`].
    #[must_use]
    pub const fn is_highlighted(&self) -> bool {
        self.highlighted
    }
}

/// A styled block of dialog text, built up as chunk runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledText {
    chunks: Vec<TextChunk>,
}

impl StyledText {
    /// Creates an empty block.
    #[must_use]
    pub const fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Appends an unstyled run.
    pub fn push_plain(&mut self, text: impl Into<String>) {
        self.chunks.push(TextChunk {
            text: text.into(),
            highlighted: false,
        });
    }

    /// Appends a highlighted run.
    pub fn push_highlighted(&mut self, text: impl Into<String>) {
        self.chunks.push(TextChunk {
            text: text.into(),
            highlighted: true,
        });
    }

    /// The chunk runs in display order.
    #[must_use]
    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    /// Returns `true` if the block contains no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl fmt::Display for StyledText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in &self.chunks {
            f.write_str(&chunk.text)?;
        }
        Ok(())
    }
}

/// Builds the denial dialog body from denied permissions and their tips.
///
/// Each denied permission with an in-range tip contributes one line of the
/// form `<short name>: <tip>`, where the short name is the identifier's last
/// dot-separated segment, highlighted. Lines are separated by `\n` with no
/// trailing break. A denied permission without a matching tip contributes
/// nothing.
#[must_use]
pub fn denial_text(denied: &[String], tips: &[String]) -> StyledText {
    let mut text = StyledText::new();
    for (index, permission) in denied.iter().enumerate() {
        let Some(tip) = tips.get(index) else {
            continue;
        };
        if !text.is_empty() {
            text.push_plain("\n");
        }
        text.push_highlighted(short_name(permission));
        text.push_plain(": ");
        text.push_plain(tip.as_str());
    }
    text
}

/// The last dot-separated segment of a permission identifier.
///
/// `android.permission.CAMERA` becomes `CAMERA`; an identifier without a
/// separator is returned whole.
fn short_name(permission: &str) -> &str {
    permission.rsplit('.').next().unwrap_or(permission)
}
