//! Structured view over generated post text.
//!
//! Models are asked to answer in a fixed layout:
//!
//! ```text
//! TITLE: ...
//! CONTENT: ...
//! HASHTAGS: ...
//! CALL_TO_ACTION: ...
//! ```
//!
//! Parsing is lenient: a response that ignores the layout becomes a post
//! whose content is the whole (cleaned) text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));
static ASTERISKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*+").expect("valid regex"));
static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{1F000}-\x{1FAFF}\x{2600}-\x{27BF}\x{2B00}-\x{2BFF}\x{FE0F}\x{200D}]")
        .expect("valid regex")
});
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static BULLETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[•▪▫◦‣⁃]\s*|[-*][ \t]+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Title,
    Content,
    Hashtags,
    CallToAction,
}

impl Section {
    fn from_marker(line: &str) -> Option<(Self, &str)> {
        [
            ("TITLE:", Section::Title),
            ("CONTENT:", Section::Content),
            ("HASHTAGS:", Section::Hashtags),
            ("CALL_TO_ACTION:", Section::CallToAction),
        ]
        .into_iter()
        .find_map(|(marker, section)| line.strip_prefix(marker).map(|rest| (section, rest)))
    }
}

/// A LinkedIn post split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub content: String,
    pub hashtags: String,
    pub call_to_action: String,
}

impl BlogPost {
    pub fn parse(text: &str) -> Self {
        let mut title = Vec::new();
        let mut content = Vec::new();
        let mut hashtags = Vec::new();
        let mut cta = Vec::new();
        let mut current: Option<Section> = None;
        let mut saw_marker = false;

        for raw in text.lines() {
            let line = raw.trim();
            let (section, rest) = match Section::from_marker(line) {
                Some((section, rest)) => {
                    saw_marker = true;
                    current = Some(section);
                    (section, rest.trim())
                }
                None => match current {
                    Some(section) => (section, line),
                    None => continue,
                },
            };

            let bucket = match section {
                Section::Title => &mut title,
                Section::Content => &mut content,
                Section::Hashtags => &mut hashtags,
                Section::CallToAction => &mut cta,
            };
            if !(bucket.is_empty() && rest.is_empty()) {
                bucket.push(rest);
            }
        }

        if !saw_marker {
            return Self {
                content: clean_content(text),
                ..Self::default()
            };
        }

        Self {
            title: clean_inline(&title.join(" ")),
            content: clean_content(&content.join("\n")),
            hashtags: normalize_hashtags(&hashtags.join(" ")),
            call_to_action: clean_inline(&cta.join("\n")),
        }
    }

    /// Title for subjects and file headers.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }
}

fn clean_inline(text: &str) -> String {
    let text = ASTERISKS.replace_all(text, "");
    EMOJI.replace_all(&text, "").trim().to_string()
}

fn clean_content(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = BULLETS.replace_all(&text, "");
    let text = ASTERISKS.replace_all(&text, "");
    let text = EMOJI.replace_all(&text, "");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Bare words become `#Word`; tags already written with `#` are kept as is.
/// Punctuation and emojis go.
fn normalize_hashtags(text: &str) -> String {
    let text = EMOJI.replace_all(text, "");
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(hashtag)
        .collect::<Vec<_>>()
        .join(" ")
}

fn hashtag(token: &str) -> Option<String> {
    let token = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '_' && c != '#');
    let (tagged, word) = match token.strip_prefix('#') {
        Some(rest) => (true, rest.trim_start_matches('#')),
        None => (false, token),
    };

    let well_formed = !word.is_empty() && word.chars().all(|c| c.is_alphanumeric() || c == '_');
    // Bare words like "2025" are not tags unless the model wrote the `#`.
    let starts_ok = tagged || word.chars().next().is_some_and(char::is_alphabetic);
    (well_formed && starts_ok).then(|| format!("#{}", word))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "TITLE: **Why AI Trends Matter** 🚀\n\
        \n\
        CONTENT: AI is reshaping **every** industry.\n\
        \n\
        \n\
        \n\
        - Automation frees up *time*\n\
        • Data becomes a product\n\
        \n\
        HASHTAGS: AI, #MachineLearning Future_of_Work 🔥\n\
        CALL_TO_ACTION: What trend are you watching? 💡";

    #[test]
    fn parses_all_sections() {
        let post = BlogPost::parse(RESPONSE);

        assert_eq!(post.title, "Why AI Trends Matter");
        assert_eq!(post.hashtags, "#AI #MachineLearning #Future_of_Work");
        assert_eq!(post.call_to_action, "What trend are you watching?");
    }

    #[test]
    fn content_is_cleaned() {
        let post = BlogPost::parse(RESPONSE);

        assert_eq!(
            post.content,
            "AI is reshaping every industry.\n\nAutomation frees up time\nData becomes a product"
        );
        assert!(!post.content.contains('*'));
    }

    #[test]
    fn multi_line_sections_are_joined() {
        let post = BlogPost::parse("TITLE: One\nCONTENT: first\nsecond\nCALL_TO_ACTION: ask\nmore");

        assert_eq!(post.content, "first\nsecond");
        assert_eq!(post.call_to_action, "ask\nmore");
        assert!(post.hashtags.is_empty());
    }

    #[test]
    fn written_tags_keep_leading_digits() {
        let post = BlogPost::parse("TITLE: t\nCONTENT: c\nHASHTAGS: #5G #2025Goals #AI 2025 ##Cloud!");

        assert_eq!(post.hashtags, "#5G #2025Goals #AI #Cloud");
    }

    #[test]
    fn unstructured_text_becomes_content() {
        let post = BlogPost::parse("Just a plain paragraph with **bold**.");

        assert_eq!(post.title, "");
        assert_eq!(post.display_title(), "Untitled");
        assert_eq!(post.content, "Just a plain paragraph with bold.");
    }
}
