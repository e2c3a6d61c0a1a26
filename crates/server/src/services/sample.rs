//! Built-in title counts served while the first real computation warms up.

use ecfr_core::Error;

use super::titles::TitleWordCount;

const SAMPLE_TITLE_COUNTS: &str = include_str!("../../data/sample_title_counts.json");

/// The built-in per-title counts, one entry per title.
pub fn title_counts() -> Result<Vec<TitleWordCount>, Error> {
    Ok(serde_json::from_str(SAMPLE_TITLE_COUNTS)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_parses() {
        let counts = title_counts().unwrap();
        assert_eq!(counts.len(), 50);
        assert_eq!(counts[0].title, "1");
        assert_eq!(counts[0].word_count, 69393);
    }

    #[test]
    fn test_sample_keeps_error_entry() {
        let counts = title_counts().unwrap();
        let reserved = counts.iter().find(|c| c.title == "35").unwrap();
        assert_eq!(reserved.word_count, 0);
        assert_eq!(reserved.status_code, Some(404));
        assert!(reserved.error.is_some());
    }
}
