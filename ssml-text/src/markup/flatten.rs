//! Pre-order flattening of an SSML element tree.

use roxmltree::{Document, Node, ParsingOptions};

use super::{MarkupSegment, TagKind};
use crate::error::{Result, TextError};

enum Step<'a, 'input> {
    Element(Node<'a, 'input>, usize),
    Trailing(String, usize),
}

/// Flatten an element and its descendants into document-ordered segments.
///
/// Each element yields one segment carrying its own leading text. Text that
/// follows a child's closing tag becomes a [`TagKind::TrailingText`] segment
/// at the parent's depth, emitted right after the child's subtree. Comments
/// and processing instructions are skipped and the text around them joined.
pub fn flatten(root: Node<'_, '_>, depth: usize) -> Vec<MarkupSegment> {
    let mut segments = Vec::new();
    let mut stack = vec![Step::Element(root, depth)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Element(node, depth) => {
                let mut segment = MarkupSegment::new(
                    depth,
                    TagKind::from_name(node.tag_name().name()),
                    text_run(node.first_child()),
                );
                for attribute in node.attributes() {
                    segment
                        .attributes
                        .insert(attribute.name().to_string(), attribute.value().to_string());
                }
                segments.push(segment);

                let children: Vec<_> = node.children().filter(|n| n.is_element()).collect();
                for child in children.into_iter().rev() {
                    let tail = text_run(child.next_sibling());
                    if !tail.is_empty() {
                        stack.push(Step::Trailing(tail, depth));
                    }
                    stack.push(Step::Element(child, depth + 1));
                }
            }
            Step::Trailing(text, depth) => {
                segments.push(MarkupSegment::new(depth, TagKind::TrailingText, text));
            }
        }
    }

    segments
}

/// Text of every text node from `first` up to the next element sibling.
fn text_run(first: Option<Node<'_, '_>>) -> String {
    std::iter::successors(first, |n| n.next_sibling())
        .take_while(|n| !n.is_element())
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Parse an SSML string and flatten its root element at depth 1.
///
/// A `<!DOCTYPE>` header is accepted.
pub fn parse_and_flatten(markup: &str) -> Result<Vec<MarkupSegment>> {
    parse_with_options(
        markup,
        ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        },
    )
}

fn parse_with_options<'a>(markup: &'a str, options: ParsingOptions<'a>) -> Result<Vec<MarkupSegment>> {
    let document = Document::parse_with_options(markup, options).map_err(classify_parse_error)?;
    Ok(flatten(document.root_element(), 1))
}

/// Resource limits are read failures; everything else is malformed content.
fn classify_parse_error(error: roxmltree::Error) -> TextError {
    match error {
        roxmltree::Error::NodesLimitReached
        | roxmltree::Error::AttributesLimitReached
        | roxmltree::Error::NamespacesLimitReached
        | roxmltree::Error::DtdDetected => TextError::MarkupReadFailure(error.to_string()),
        other => TextError::MalformedMarkup(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(segments: &[MarkupSegment]) -> Vec<(usize, String, String)> {
        segments
            .iter()
            .map(|s| (s.depth, s.kind.name().to_string(), s.text.clone()))
            .collect()
    }

    #[test]
    fn test_flatten_interleaves_trailing_text() {
        let segments = parse_and_flatten(
            r#"<speak><prosody rate="1.1">你好<phoneme ph="ㄏㄠˇ">好</phoneme>的<break time="500ms"/>再見</prosody>謝謝</speak>"#,
        )
        .unwrap();

        let expected = vec![
            (1, "speak", ""),
            (2, "prosody", "你好"),
            (3, "phoneme", "好"),
            (2, "tail", "的"),
            (3, "break", ""),
            (2, "tail", "再見"),
            (1, "tail", "謝謝"),
        ];
        let expected: Vec<_> = expected
            .into_iter()
            .map(|(d, k, t)| (d, k.to_string(), t.to_string()))
            .collect();
        assert_eq!(summary(&segments), expected);
    }

    #[test]
    fn test_flatten_strips_namespace_and_keeps_attributes() {
        let segments = parse_and_flatten(
            r#"<speak xmlns="http://www.w3.org/2001/10/synthesis"><voice name="Aurora">哈囉</voice></speak>"#,
        )
        .unwrap();

        assert_eq!(segments[0].kind, TagKind::Other("speak".to_string()));
        assert_eq!(segments[1].kind, TagKind::Voice);
        assert_eq!(segments[1].attribute("name"), Some("Aurora"));
        assert_eq!(segments[1].text, "哈囉");
    }

    #[test]
    fn test_flatten_decodes_entities() {
        let segments = parse_and_flatten("<speak>A &amp; B</speak>").unwrap();
        assert_eq!(segments[0].text, "A & B");
    }

    #[test]
    fn test_flatten_custom_start_depth() {
        let document = Document::parse("<prosody><break/></prosody>").unwrap();
        let segments = flatten(document.root_element(), 3);
        assert_eq!(segments[0].depth, 3);
        assert_eq!(segments[1].depth, 4);
    }

    #[test]
    fn test_flatten_joins_text_around_comments() {
        let segments = parse_and_flatten(
            r#"<prosody rate="1.1"><!-- note -->你好<break time="1ms"/><!-- c -->再見<?pi x?>了</prosody>"#,
        )
        .unwrap();

        let expected = vec![(1, "prosody", "你好"), (2, "break", ""), (1, "tail", "再見了")];
        let expected: Vec<_> = expected
            .into_iter()
            .map(|(d, k, t)| (d, k.to_string(), t.to_string()))
            .collect();
        assert_eq!(summary(&segments), expected);
    }

    #[test]
    fn test_flatten_accepts_doctype() {
        let segments =
            parse_and_flatten("<!DOCTYPE speak>\n<prosody rate=\"1.1\">你好</prosody>").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, TagKind::Prosody);
        assert_eq!(segments[0].text, "你好");
    }

    #[test]
    fn test_node_limit_is_read_failure() {
        let options = ParsingOptions {
            nodes_limit: 3,
            ..ParsingOptions::default()
        };
        let result = parse_with_options("<speak><a/><b/><c/><d/></speak>", options);
        assert!(matches!(result, Err(TextError::MarkupReadFailure(_))));
    }

    #[test]
    fn test_malformed_markup() {
        let result = parse_and_flatten("<speak><prosody>unclosed</speak>");
        assert!(matches!(result, Err(TextError::MalformedMarkup(_))));
    }
}
