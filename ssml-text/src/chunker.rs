//! Budget-aware text splitting.
//!
//! Text is cut at the nearest punctuation or whitespace before the budget,
//! after reserving room for the worst-case growth caused by escaping.

use log::debug;

use crate::config::ChunkBudget;
use crate::error::{Result, TextError};
use crate::escape::estimate_cost_chars;
use crate::paragraph::Paragraph;

/// Characters a chunk may be cut in front of, full-width and half-width.
const BOUNDARY_CHARS: &[char] = &[
    '。', '！', '!', '？', '?', '\n', '\t', '，', ',', '、', '　', ' ', '（', '）', '(', ')', '「',
    '」', '；', '﹔',
];

/// Splits flat text into paragraphs that fit a [`ChunkBudget`].
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    budget: ChunkBudget,
}

impl TextChunker {
    pub fn new(budget: ChunkBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> ChunkBudget {
        self.budget
    }

    /// Split text into paragraphs.
    ///
    /// Never returns an empty list: empty input yields one empty paragraph.
    /// Concatenating the returned paragraphs reproduces `text` exactly.
    ///
    /// # Errors
    /// * [`TextError::ExcessiveEscapeOverhead`] when the escaping cost of a
    ///   candidate chunk alone consumes the whole limit
    /// * [`TextError::ExcessiveFinalOverhead`] when the escaping cost of the
    ///   final remainder exceeds the elastic allowance
    pub fn split(&self, text: &str) -> Result<Vec<Paragraph>> {
        let limit = self.budget.limit;
        let chars: Vec<char> = text.chars().collect();

        if chars.len() <= limit {
            return Ok(vec![Paragraph::new(text)]);
        }

        let mut result = Vec::new();
        let mut start = 0;
        let mut cut = limit;

        while cut < chars.len() {
            let cost = estimate_cost_chars(&chars[start..cut]);
            if cost >= limit {
                return Err(TextError::ExcessiveEscapeOverhead { cost, limit });
            }

            cut -= cost;
            if let Some(boundary) = (start + 1..cut).rev().find(|&i| is_boundary(chars[i])) {
                cut = boundary;
            }

            debug!("Cutting chunk at char {} (escape reserve {})", cut, cost);
            result.push(Paragraph::new(chars[start..cut].iter().collect::<String>()));
            start = cut;
            cut = start + limit;
        }

        let remainder = &chars[start..];
        let cost = estimate_cost_chars(remainder);
        if cost > self.budget.elastic {
            return Err(TextError::ExcessiveFinalOverhead {
                cost,
                elastic: self.budget.elastic,
            });
        }
        result.push(Paragraph::new(remainder.iter().collect::<String>()));

        Ok(result)
    }
}

fn is_boundary(c: char) -> bool {
    BOUNDARY_CHARS.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker(limit: usize, elastic: usize) -> TextChunker {
        TextChunker::new(ChunkBudget::new(limit, elastic).unwrap())
    }

    fn texts(paragraphs: &[Paragraph]) -> Vec<&str> {
        paragraphs.iter().map(Paragraph::text).collect()
    }

    #[test]
    fn test_short_text_single_paragraph() {
        let paragraphs = chunker(20, 0).split("Hello world.").unwrap();
        assert_eq!(texts(&paragraphs), vec!["Hello world."]);
    }

    #[test]
    fn test_empty_text_yields_one_empty_paragraph() {
        let paragraphs = chunker(20, 0).split("").unwrap();
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].is_empty());
    }

    #[test]
    fn test_cut_before_punctuation() {
        let paragraphs = chunker(10, 0).split("今天天氣很好，我們去公園散步吧。").unwrap();
        assert_eq!(texts(&paragraphs), vec!["今天天氣很好", "，我們去公園散步吧。"]);
    }

    #[test]
    fn test_cut_at_whitespace() {
        let paragraphs = chunker(8, 0).split("one two three four").unwrap();
        assert_eq!(texts(&paragraphs), vec!["one two", " three", " four"]);
    }

    #[test]
    fn test_hard_cut_without_boundary() {
        let paragraphs = chunker(4, 0).split("abcdefghij").unwrap();
        assert_eq!(texts(&paragraphs), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_escape_cost_shrinks_cut() {
        // One '&' reserves 6 characters, so the first cut lands at 4 instead of 10
        let paragraphs = chunker(10, 6).split("a&bcdefghijkl").unwrap();
        assert_eq!(paragraphs[0].text(), "a&bc");
        assert_eq!(paragraphs.concat_text(), "a&bcdefghijkl");
    }

    #[test]
    fn test_final_paragraph_uses_elastic_allowance() {
        let paragraphs = chunker(10, 12).split("abcdefghij&&k").unwrap();
        assert_eq!(texts(&paragraphs), vec!["abcdefghij", "&&k"]);

        let last = paragraphs.last().unwrap();
        let cost = crate::escape::estimate_cost(last.text());
        assert_eq!(cost, 12);
        assert!(last.len() + cost <= 10 + 12);
    }

    #[test]
    fn test_excessive_escape_overhead() {
        let result = chunker(12, 100).split("&&&&&&&&&&&&&&&&&&&&");
        assert!(matches!(
            result,
            Err(TextError::ExcessiveEscapeOverhead { cost: 72, limit: 12 })
        ));
    }

    #[test]
    fn test_excessive_final_overhead() {
        let result = chunker(10, 5).split("abcdefghij&k");
        assert!(matches!(
            result,
            Err(TextError::ExcessiveFinalOverhead { cost: 6, elastic: 5 })
        ));
    }

    trait ConcatText {
        fn concat_text(&self) -> String;
    }

    impl ConcatText for Vec<Paragraph> {
        fn concat_text(&self) -> String {
            self.iter().map(Paragraph::text).collect()
        }
    }

    proptest! {
        #[test]
        fn prop_short_text_is_unchanged(text in "[a-z，。 ]{0,30}") {
            let paragraphs = chunker(30, 0).split(&text).unwrap();
            prop_assert_eq!(paragraphs.len(), 1);
            prop_assert_eq!(paragraphs[0].text(), text.as_str());
        }

        #[test]
        fn prop_split_is_lossless_and_bounded(
            text in "[a-z你好，。! \n]{0,200}",
            limit in 1usize..40,
        ) {
            let paragraphs = chunker(limit, 0).split(&text).unwrap();
            prop_assert!(!paragraphs.is_empty());
            prop_assert_eq!(paragraphs.concat_text(), text);
            for paragraph in &paragraphs {
                prop_assert!(paragraph.len() <= limit);
            }
        }

        #[test]
        fn prop_reserved_chars_respect_budget(
            text in "[a-z&<> ]{0,120}",
            limit in 8usize..60,
        ) {
            if let Ok(paragraphs) = chunker(limit, 24).split(&text) {
                prop_assert_eq!(paragraphs.concat_text(), text);
                let last = paragraphs.len() - 1;
                for paragraph in &paragraphs[..last] {
                    let cost = crate::escape::estimate_cost(paragraph.text());
                    prop_assert!(paragraph.len() + cost <= limit);
                }
                if last > 0 {
                    let final_paragraph = &paragraphs[last];
                    let cost = crate::escape::estimate_cost(final_paragraph.text());
                    prop_assert!(final_paragraph.len() <= limit);
                    prop_assert!(final_paragraph.len() + cost <= limit + 24);
                }
            }
        }
    }
}
