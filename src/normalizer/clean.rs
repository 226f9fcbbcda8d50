use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Boilerplate removed from summaries, applied in this order. Open-ended
/// clauses swallow up to 200 trailing characters.
const BOILERPLATE: [&str; 10] = [
    r"we use cookies to ensure[\s\S]{0,200}",
    r"by continued use, you (agree|accept)[\s\S]{0,200}",
    r"click (find out more|here for more)",
    r"i agree",
    r"find out more",
    r"advertisement",
    r"filtered by:\s*\w+",
    r"read more",
    r"continue reading",
    r"subscribe",
];

static BOILERPLATE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    BOILERPLATE
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("valid boilerplate regex")
        })
        .collect()
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Strips cookie banners, calls to action and markup from a feed summary.
///
/// The passes repeat until the text stops changing, since decoding entities
/// or dropping a tag can expose new markup or boilerplate. Each pass that
/// changes the text shortens it or normalises whitespace, so this terminates.
///
/// Returns `None` when nothing readable is left, never an empty string.
pub fn clean_summary(text: Option<&str>) -> Option<String> {
    let mut current = text?.to_string();

    loop {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    (!current.is_empty()).then_some(current)
}

fn clean_pass(text: &str) -> String {
    let mut s = text.to_string();
    for re in BOILERPLATE_RES.iter() {
        s = re.replace_all(&s, " ").into_owned();
    }

    let s = TAG_RE.replace_all(&s, " ");
    let s = decode_html_entities(&s);
    let s = WHITESPACE_RE.replace_all(&s, " ");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn clean(s: &str) -> Option<String> {
        clean_summary(Some(s))
    }

    #[test]
    fn test_none_and_empty() {
        assert_eq!(clean_summary(None), None);
        assert_eq!(clean(""), None);
        assert_eq!(clean("   \n\t "), None);
    }

    #[test]
    fn test_only_boilerplate_leaves_residue() {
        assert_eq!(clean("I AGREE <b>Subscribe</b> now"), Some("now".into()));
    }

    #[test]
    fn test_cookie_banner_and_markup_cleans_to_none() {
        assert_eq!(
            clean("<p>We use cookies to ensure the best experience. Read more</p>"),
            None
        );
    }

    #[test]
    fn test_open_ended_clause_consumes_at_most_200_chars() {
        let tail = "x".repeat(250);
        let input = format!("Intro. We use cookies to ensure {}", tail);
        assert_eq!(clean(&input), Some(format!("Intro. {}", "x".repeat(51))));
    }

    #[test]
    fn test_continued_use_clause() {
        let input = "News body. By continued use, you accept our terms.";
        assert_eq!(clean(input), Some("News body.".into()));
    }

    #[test]
    fn test_filtered_by_removes_one_word() {
        assert_eq!(
            clean("Filtered by: Regions Typhoon update"),
            Some("Typhoon update".into())
        );
    }

    #[test]
    fn test_click_phrases() {
        assert_eq!(
            clean("Flood warning. Click here for more. click FIND OUT MORE"),
            Some("Flood warning. .".into())
        );
    }

    #[test]
    fn test_entities_decoded_after_tags_stripped() {
        assert_eq!(
            clean("<p>Rice&nbsp;prices &amp; supply</p><br/>ADVERTISEMENT"),
            Some("Rice prices & supply".into())
        );
        // Escaped markup is decoded and then stripped like any other tag.
        assert_eq!(clean("a &lt;b&gt; c"), Some("a c".into()));
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(
            clean("  one\n\n two\t\tthree  "),
            Some("one two three".into())
        );
    }

    #[test]
    fn test_continue_reading_case_insensitive() {
        assert_eq!(
            clean("Story text… CONTINUE READING"),
            Some("Story text…".into())
        );
    }

    #[test]
    fn test_idempotent_on_realistic_summaries() {
        let samples = [
            "<p>We use cookies to ensure the best experience. Read more</p>",
            "I AGREE <b>Subscribe</b> now",
            "<div class=\"x\">Typhoon <em>Kristine</em> makes landfall &amp; more</div>",
            "Filtered by: Nation The senate approved the bill. Continue reading",
            "Plain prose with no noise at all.",
        ];
        for sample in samples {
            let once = clean(sample);
            let twice = clean_summary(once.as_deref());
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_boilerplate_exposed_by_decoding_or_tags_is_removed() {
        assert_eq!(clean("read<b></b> more now"), Some("now".into()));
        assert_eq!(clean("i agr&#101;e today"), Some("today".into()));
        assert_eq!(clean("&amp;lt;i&amp;gt;x"), Some("x".into()));
    }

    proptest! {
        #[test]
        fn prop_clean_is_idempotent(s in "[<>&#;/ a-z0-9]{0,80}") {
            let once = clean(&s);
            prop_assert_eq!(clean_summary(once.as_deref()), once.clone());
            if let Some(text) = once {
                prop_assert!(!text.is_empty());
                prop_assert_eq!(text.trim(), text.as_str());
            }
        }


        #[test]
        fn prop_plain_text_only_normalizes_whitespace(s in "[0-9 .,;:!?\t\n-]{0,80}") {
            let expected = s.split_whitespace().collect::<Vec<_>>().join(" ");
            let cleaned = clean(&s);
            prop_assert_eq!(cleaned.clone(), (!expected.is_empty()).then_some(expected));
            prop_assert_eq!(clean_summary(cleaned.as_deref()), cleaned);
        }
    }
}
