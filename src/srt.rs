/// A single caption as handed over by the caption provider.
///
/// Positions are frame offsets at the frame rate the caption list was produced
/// with. They are signed so a bad provider value can be reported instead of
/// wrapping around; the serialiser rejects anything negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub(crate) sequence_number: Option<usize>,
    pub(crate) start_frame: i64,
    pub(crate) end_frame: i64,
    pub(crate) text: Vec<String>,
}

impl Caption {
    pub fn new(text: &str, start_frame: i64, end_frame: i64) -> Self {
        Self {
            sequence_number: None,
            start_frame,
            end_frame,
            text: text.lines().map(String::from).collect(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.iter().all(|line| line.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_splits_embedded_line_breaks() {
        let caption = Caption::new("first line\nsecond line", 0, 10);
        assert_eq!(caption.text, vec!["first line", "second line"]);
        assert_eq!(caption.sequence_number, None);
    }

    #[test]
    fn blank_detection() {
        assert!(Caption::new("", 0, 1).is_blank());
        assert!(Caption::new("  \t\n   ", 0, 1).is_blank());
        assert!(!Caption::new("\n ok", 0, 1).is_blank());
    }
}
