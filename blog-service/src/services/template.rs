//! Deterministic post text used when no model can answer.

use crate::models::{GenerationRequest, Tone};

/// Model name results from this module are attributed to.
pub const TEMPLATE_MODEL: &str = "template";

fn opening(tone: Tone, topic: &str, audience: &str) -> String {
    match tone {
        Tone::Professional => format!(
            "{topic} is reshaping how {audience} plan, decide and deliver. \
             Teams that understand it early will set the pace for everyone else."
        ),
        Tone::Casual => format!(
            "Let's talk about {topic}. It keeps coming up in conversations with {audience}, \
             and for good reason."
        ),
        Tone::Inspirational => format!(
            "Every shift starts with a few people willing to look ahead. Right now, \
             {topic} is that shift for {audience}."
        ),
        Tone::Educational => format!(
            "If you are among the {audience} trying to make sense of {topic}, \
             here is a short primer on what matters and why."
        ),
        Tone::Conversational => format!(
            "I have been thinking a lot about {topic} lately, and I would love to hear \
             how other {audience} see it."
        ),
    }
}

fn title(tone: Tone, topic: &str) -> String {
    match tone {
        Tone::Professional => format!("What {topic} Means for Your Organization"),
        Tone::Casual => format!("A Few Thoughts on {topic}"),
        Tone::Inspirational => format!("Why {topic} Is Worth Leaning Into"),
        Tone::Educational => format!("{topic}: The Essentials"),
        Tone::Conversational => format!("Let's Talk About {topic}"),
    }
}

fn hashtags(topic: &str) -> String {
    let mut tags: Vec<String> = topic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .take(3)
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => format!("#{}{}", first.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect();
    tags.push("#LinkedIn".to_string());
    tags.push("#ProfessionalGrowth".to_string());
    tags.join(" ")
}

/// Render a post for `request` in the same TITLE/CONTENT layout the model
/// is asked for. Identical requests always produce identical text.
pub fn render(request: &GenerationRequest) -> String {
    let topic = request.topic();
    let audience = request.target_audience();
    let tone = request.tone();

    let mut text = format!(
        "TITLE: {title}\n\n\
         CONTENT: {opening}\n\n\
         Three things are worth keeping in mind. First, start small: pick one area where \
         {topic} can make a measurable difference and learn from it. Second, share what you \
         learn with your team so progress does not depend on a single person. Third, revisit \
         your assumptions regularly, because the landscape around {topic} changes quickly.\n\n\
         The organizations that benefit most are rarely the ones with the biggest budgets. \
         They are the ones that stay curious and act on what they find.\n",
        title = title(tone, topic),
        opening = opening(tone, topic, audience),
    );

    if request.include_hashtags() {
        text.push_str(&format!("\nHASHTAGS: {}\n", hashtags(topic)));
    }
    if request.include_call_to_action() {
        text.push_str(&format!(
            "\nCALL_TO_ACTION: How is {topic} showing up in your work? Share your experience in the comments.\n"
        ));
    }

    text
}
