use super::{escape_xml as escape_html, FeedSnapshot};

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

fn render_post(out: &mut String, title: &str, content: &str) {
    out.push_str("      <article class=\"post\">\n");
    out.push_str(&format!(
        "        <h5 class=\"post-title\">{}</h5>\n",
        escape_html(title)
    ));
    out.push_str(&format!(
        "        <p class=\"post-content\">{}</p>\n",
        escape_html(content)
    ));
    out.push_str("      </article>\n");
}

/// A standalone page laid out like the live feed: the `#scroller`
/// container, the `#post_template` template and the `#sentinal` element.
pub fn render_html(feed: &FeedSnapshot<'_>) -> Vec<u8> {
    let json = serde_json::to_string(feed).unwrap_or_else(|_| "{}".to_string());
    let json = json_for_script_tag(&json);

    let mut posts = String::new();
    for post in feed.posts {
        render_post(&mut posts, &post.title, &post.content);
    }

    let error = match feed.error {
        Some(message) => format!(
            "    <div id=\"load-error\" class=\"error\">{}</div>\n",
            escape_html(message)
        ),
        None => String::new(),
    };

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Users</title>
  <style>
    body {{ font-family: sans-serif; max-width: 720px; margin: 2rem auto; }}
    .post {{ border: 1px solid #ddd; border-radius: 0.375rem; padding: 0.75rem 1rem; margin-bottom: 0.75rem; }}
    .post-title {{ margin: 0 0 0.25rem 0; }}
    .post-content {{ margin: 0; white-space: pre-wrap; }}
    #sentinal {{ text-align: center; color: #666; padding: 1rem; }}
    .error {{ color: #b00020; text-align: center; }}
  </style>
</head>
<body>
  <script type="application/json" id="feed-data">{json}</script>
  <main>
    <div id="scroller" data-offset="{offset}">
{posts}    </div>
    <template id="post_template">
      <article class="post">
        <h5 class="post-title"></h5>
        <p class="post-content"></p>
      </article>
    </template>
{error}    <div id="sentinal">{sentinel}</div>
  </main>
</body>
</html>
"####,
        json = json,
        offset = feed.offset,
        posts = posts,
        error = error,
        sentinel = escape_html(feed.sentinel),
    );
    html.into_bytes()
}
