use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// A code fence and the word glued to it.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```([A-Za-z0-9_+-]*)").expect("valid fence regex"));

/// Remove Markdown code-fence markers, keeping everything between them.
///
/// Fences alternate between opening and closing. Only an opening fence
/// carries a language tag; text right after a closing fence is kept.
pub fn strip_code_fences(raw: &str) -> Cow<'_, str> {
    let mut opening = true;
    FENCE_RE.replace_all(raw, |caps: &regex::Captures<'_>| {
        let kept = if opening { "" } else { &caps[1] };
        opening = !opening;
        kept.to_string()
    })
}

/// The candidate object span: first `{` through last `}` inclusive.
///
/// Returns `None` when either brace is absent or the last closing brace
/// precedes the first opening one.
pub fn locate_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_with_language_tag() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "\n{\"a\":1}\n");
    }

    #[test]
    fn test_strip_fences_without_tag() {
        assert_eq!(strip_code_fences("```{}```"), "{}");
    }

    #[test]
    fn test_text_after_closing_fence_is_kept() {
        assert_eq!(
            strip_code_fences("```json\n{\"a\":1}\n```Note: values are estimates"),
            "\n{\"a\":1}\nNote: values are estimates"
        );
        assert_eq!(strip_code_fences("```{}```ok ```js\n[]```"), "{}ok \n[]");
    }

    #[test]
    fn test_strip_fences_leaves_plain_text() {
        assert_eq!(strip_code_fences("plain {\"a\":1}"), "plain {\"a\":1}");
    }

    #[test]
    fn test_locate_object_in_prose() {
        assert_eq!(
            locate_object("Here: {\"a\": {\"b\": 1}} done"),
            Some("{\"a\": {\"b\": 1}}")
        );
    }

    #[test]
    fn test_locate_object_missing_braces() {
        assert_eq!(locate_object("nothing"), None);
        assert_eq!(locate_object("{ open only"), None);
        assert_eq!(locate_object("close only }"), None);
    }

    #[test]
    fn test_locate_object_inverted_braces() {
        assert_eq!(locate_object("} backwards {"), None);
    }
}
