//! Small shared UI building blocks.

use unicode_width::UnicodeWidthStr;

use crate::events::RequestId;

/// Truncates `text` to `max_width` display columns, appending an ellipsis
/// when anything was cut. Width-aware so wide characters do not overflow.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('\u{2026}');
    out
}

/// Single-line text input with end-of-line cursor.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub value: String,
}

impl TextField {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    /// Display form with every character replaced by a bullet.
    pub fn masked(&self) -> String {
        "\u{2022}".repeat(self.value.chars().count())
    }
}

/// Remote data slot for a view.
///
/// `Loading` carries the id of the request whose result is still welcome;
/// results tagged with any other id are stale and dropped.
#[derive(Debug, Clone, Default)]
pub enum Remote<T> {
    #[default]
    NotLoaded,
    Loading {
        req: RequestId,
    },
    Ready(T),
    Failed(String),
}

impl<T> Remote<T> {
    /// True when `req` matches the in-flight request.
    pub fn accepts(&self, req: RequestId) -> bool {
        matches!(self, Remote::Loading { req: current } if *current == req)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading { .. })
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Remote::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Remote::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RequestSeq;

    /// Test: only the request id recorded in Loading is accepted.
    #[test]
    fn test_remote_accepts_only_latest() {
        let mut seq = RequestSeq::default();
        let stale = seq.next();
        let latest = seq.next();

        let slot: Remote<Vec<u32>> = Remote::Loading { req: latest };
        assert!(!slot.accepts(stale));
        assert!(slot.accepts(latest));

        let ready: Remote<Vec<u32>> = Remote::Ready(vec![1]);
        assert!(!ready.accepts(latest));
    }

    /// Test: masked field hides every character.
    #[test]
    fn test_masked_field() {
        let mut field = TextField::default();
        for c in "secret".chars() {
            field.push(c);
        }
        assert_eq!(field.masked(), "\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}");
        field.backspace();
        assert_eq!(field.value, "secre");
    }

    /// Test: truncation counts display columns and appends an ellipsis.
    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("longer text", 7), "longer\u{2026}");
    }
}
