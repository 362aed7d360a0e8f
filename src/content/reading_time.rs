//! Reading time estimation

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::ContentBlock;
use crate::error::{Error, Result};

/// Assumed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\S+").unwrap();
}

/// Word total of a post and the resulting whole minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingTime {
    pub words: usize,
    pub minutes: usize,
}

/// Count whitespace-delimited words
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Estimate reading time over headings and body text of every block
///
/// Empty headings or bodies count as zero words. A block that lacks a
/// heading or a rich-text body is malformed content and fails the estimate.
pub fn estimate(blocks: &[ContentBlock]) -> Result<ReadingTime> {
    let mut words = 0;

    for (index, block) in blocks.iter().enumerate() {
        let heading = block.heading.as_deref().ok_or_else(|| {
            Error::malformed(format!("content block {} has no heading", index))
        })?;
        let body = block.body.as_ref().ok_or_else(|| {
            Error::malformed(format!("content block {} has no body", index))
        })?;

        words += count_words(heading) + count_words(&body.as_text());
    }

    Ok(ReadingTime {
        words,
        minutes: words.div_ceil(WORDS_PER_MINUTE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichText;
    use serde_json::json;

    fn block(heading: Option<&str>, body: Option<&str>) -> ContentBlock {
        ContentBlock {
            heading: heading.map(str::to_string),
            body: body.map(|text| {
                serde_json::from_value::<RichText>(json!([
                    { "type": "paragraph", "text": text, "spans": [] }
                ]))
                .unwrap()
            }),
        }
    }

    #[test]
    fn test_single_block() {
        let blocks = [block(
            Some("Hello World"),
            Some("a b c d e f g h i j k l m n o p q r s t"),
        )];
        assert_eq!(
            estimate(&blocks).unwrap(),
            ReadingTime { words: 22, minutes: 1 }
        );
    }

    #[test]
    fn test_rounds_up() {
        let body = vec!["word"; 199].join(" ");
        let blocks = [block(Some("two words"), Some(&body))];
        assert_eq!(
            estimate(&blocks).unwrap(),
            ReadingTime { words: 201, minutes: 2 }
        );

        let body = vec!["word"; 198].join("\n\t ");
        let blocks = [block(Some("two words"), Some(&body))];
        assert_eq!(estimate(&blocks).unwrap().minutes, 1);
    }

    #[test]
    fn test_sums_across_blocks_and_nodes() {
        let mut multi = block(Some("one"), Some("two three"));
        if let Some(body) = multi.body.as_mut() {
            body.0.extend(block(None, Some("four five six")).body.unwrap().0);
        }
        let blocks = [multi, block(Some("seven eight"), Some("nine"))];
        assert_eq!(estimate(&blocks).unwrap().words, 9);
    }

    #[test]
    fn test_empty_fields_count_zero() {
        let blocks = [
            block(Some(""), Some("")),
            block(Some("   "), Some("just three words")),
        ];
        assert_eq!(estimate(&blocks).unwrap(), ReadingTime { words: 3, minutes: 1 });
        assert_eq!(estimate(&[]).unwrap(), ReadingTime { words: 0, minutes: 0 });
    }

    #[test]
    fn test_missing_fields_fail() {
        let err = estimate(&[block(Some("ok"), Some("ok")), block(None, Some("body"))])
            .unwrap_err();
        assert!(err.to_string().contains("content block 1 has no heading"));

        let err = estimate(&[block(Some("heading"), None)]).unwrap_err();
        assert!(matches!(err, Error::MalformedContent(_)));
    }
}
