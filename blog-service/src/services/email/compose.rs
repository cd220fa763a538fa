//! Email subject, bodies and attachments for packaged posts.

use super::EmailAttachment;
use crate::models::{BlogPost, Tone};
use crate::services::packager::ExportBundle;
use askama::Template;

const SIGNATURE: &str = "LinkedIn Blog Agent";

/// The parts of one post an email shows.
struct PostView {
    title: String,
    content: String,
    hashtags: String,
    call_to_action: String,
    generated_at: String,
    topic: String,
    tone: Tone,
}

impl PostView {
    fn from_bundle(bundle: &ExportBundle) -> Self {
        let post = BlogPost::parse(bundle.text_str());
        let meta = &bundle.meta;
        Self {
            title: meta.title.clone(),
            content: post.content,
            hashtags: post.hashtags,
            call_to_action: post.call_to_action,
            generated_at: meta.generated_at.to_rfc3339(),
            topic: meta.topic.clone(),
            tone: meta.tone,
        }
    }
}

#[derive(Template)]
#[template(path = "email/post_details.txt")]
struct PostDetails<'a> {
    post: &'a PostView,
    signature: &'a str,
}

#[derive(Template)]
#[template(path = "email/post.txt")]
struct PostText<'a> {
    details: PostDetails<'a>,
}

#[derive(Template)]
#[template(path = "email/post.html")]
struct PostHtml<'a> {
    post: &'a PostView,
    signature: &'a str,
}

#[derive(Template)]
#[template(path = "email/combined.txt")]
struct CombinedText<'a> {
    sections: Vec<PostDetails<'a>>,
}

pub fn subject(prefix: &str, bundle: &ExportBundle) -> String {
    format!("{}: {}", prefix, bundle.meta.title)
}

pub fn combined_subject(count: usize) -> String {
    format!("Multiple LinkedIn Blog Posts - {} Posts Generated", count)
}

pub fn text_body(bundle: &ExportBundle) -> Result<String, askama::Error> {
    let post = PostView::from_bundle(bundle);
    PostText {
        details: PostDetails {
            post: &post,
            signature: SIGNATURE,
        },
    }
    .render()
}

pub fn html_body(bundle: &ExportBundle) -> Result<String, askama::Error> {
    let post = PostView::from_bundle(bundle);
    PostHtml {
        post: &post,
        signature: SIGNATURE,
    }
    .render()
}

/// One plain-text email carrying every post, numbered in order.
pub fn combined_text_body(bundles: &[ExportBundle]) -> Result<String, askama::Error> {
    let posts: Vec<PostView> = bundles.iter().map(PostView::from_bundle).collect();
    CombinedText {
        sections: posts
            .iter()
            .map(|post| PostDetails {
                post,
                signature: SIGNATURE,
            })
            .collect(),
    }
    .render()
}

/// The JSON and text exports as file attachments.
pub fn export_attachments(bundle: &ExportBundle) -> Vec<EmailAttachment> {
    vec![
        EmailAttachment {
            file_name: bundle.json_file_name(),
            content_type: "application/json".to_string(),
            content: bundle.json.clone(),
        },
        EmailAttachment {
            file_name: bundle.text_file_name(),
            content_type: "text/plain; charset=utf-8".to_string(),
            content: bundle.text.clone(),
        },
    ]
}
