//! HTML rendering for a single post detail page.

use std::fmt::Write as _;

use shared::protocol::Post;

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn render_post(post: &Post) -> String {
    let title = escape_html(&post.title);
    let mut tags = String::new();
    for tag in &post.tags {
        let _ = writeln!(tags, "      <li class=\"tag\">#{}</li>", escape_html(tag));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
</head>
<body>
  <article class="post" data-post-id="{id}">
    <h1>{title}</h1>
    <p class="post-body">{body}</p>
    <div class="reactions">
      <span>Likes: {likes}</span>
      <span>Dislikes: {dislikes}</span>
    </div>
    <p class="views">Views: {views}</p>
    <ul class="tags">
{tags}    </ul>
  </article>
</body>
</html>
"#,
        id = post.id,
        body = escape_html(&post.body),
        likes = post.reactions.likes,
        dislikes = post.reactions.dislikes,
        views = post.views,
    )
}
