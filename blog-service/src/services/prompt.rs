//! Prompt construction for post generation and topic suggestions.

use crate::models::GenerationRequest;
use std::fmt::Write;

/// Phrase that marks a topic-suggestion prompt.
pub const TOPIC_LIST_MARKER: &str = "Format your response as a numbered list";

/// Most topics a suggestion response is trusted for.
pub const MAX_SUGGESTIONS: usize = 10;

/// Word-range hint for the model around the requested target.
fn length_guideline(target: u32) -> String {
    let low = target.saturating_sub(target / 5).max(1);
    let high = target.saturating_add(target / 5);
    format!("approximately {} words ({}-{} words)", target, low, high)
}

pub fn blog_prompt(request: &GenerationRequest) -> String {
    let tone = request.tone();
    let audience = request.target_audience();

    let mut prompt = format!(
        "Create a professional LinkedIn blog post with the following specifications:\n\n\
         Topic: {topic}\n\
         Tone: {tone}\n\
         Length: {length}\n\
         Target Audience: {audience}\n\n\
         IMPORTANT FORMATTING GUIDELINES:\n\
         - Use clean, professional text WITHOUT asterisks (*) for emphasis\n\
         - DO NOT use emojis in the main content\n\
         - Use proper paragraphs with clear line breaks\n\
         - Focus on valuable insights and actionable advice\n\
         - Keep the {tone} tone throughout\n\n\
         CONTENT REQUIREMENTS:\n",
        topic = request.topic(),
        length = length_guideline(request.target_length()),
    );

    let mut requirements = vec![
        "Create an engaging, professional title (no emojis)".to_string(),
        "Write a compelling opening paragraph".to_string(),
        "Include 2-3 main points with practical insights".to_string(),
        format!("Make it valuable and shareable for {audience}"),
    ];
    if request.include_hashtags() {
        requirements.push("Include 5-8 relevant hashtags (hashtags only)".to_string());
    }
    if request.include_call_to_action() {
        requirements.push(
            "End with a professional call-to-action that encourages meaningful engagement"
                .to_string(),
        );
    }
    for (n, requirement) in requirements.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", n + 1, requirement);
    }

    prompt.push_str(
        "\nFORMAT YOUR RESPONSE EXACTLY AS FOLLOWS:\n\
         TITLE: [Clean professional title here]\n\n\
         CONTENT: [Main blog post content in clear paragraphs, no asterisks or emojis]\n",
    );
    if request.include_hashtags() {
        prompt.push_str("\nHASHTAGS: [Only hashtags, separated by spaces]\n");
    }
    if request.include_call_to_action() {
        prompt.push_str("\nCALL_TO_ACTION: [Professional call to action]\n");
    }

    prompt
}

pub fn topic_prompt(industry: &str, keywords: &[String]) -> String {
    let keywords = if keywords.is_empty() {
        "general topics".to_string()
    } else {
        keywords.join(", ")
    };

    let mut prompt = String::new();
    // Writing to a String cannot fail.
    let _ = write!(
        prompt,
        "Suggest {MAX_SUGGESTIONS} trending and engaging LinkedIn blog post topics for the {industry} industry.\n\n\
         Consider these keywords: {keywords}\n\n\
         Make sure the topics are relevant to current industry trends, valuable to \
         professionals in this field, and actionable.\n\n\
         {TOPIC_LIST_MARKER}:\n\
         1. Topic 1\n\
         2. Topic 2\n"
    );
    prompt
}

/// Pull `N. topic` lines (N in 1..=10) out of a model answer.
pub fn parse_topic_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let (number, rest) = line.split_once('.')?;
            let n: usize = number.trim().parse().ok()?;
            if !(1..=MAX_SUGGESTIONS).contains(&n) {
                return None;
            }
            let topic = rest.trim().trim_matches('*').trim();
            (!topic.is_empty()).then(|| topic.to_string())
        })
        .take(MAX_SUGGESTIONS)
        .collect()
}
