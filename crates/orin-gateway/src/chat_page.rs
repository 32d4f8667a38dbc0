//! Server-rendered HTML for the chat surface.

use orin_store::Turn;

pub const UPSTREAM_NOTICE: &str = "upstream";

const PAGE_STYLE: &str = r#"
    :root { color-scheme: dark; }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      min-height: 100vh;
      background: #0f0f0f;
      color: #f5f5f5;
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
    }
    header {
      display: flex;
      justify-content: space-between;
      align-items: baseline;
      padding: 1rem 1.5rem;
      border-bottom: 1px solid #27272a;
    }
    header h1 { margin: 0; font-size: 1.2rem; }
    .account { font-size: 0.85rem; color: #a1a1aa; }
    .account a { color: #10a37f; margin-left: 0.75rem; }
    main { width: min(760px, calc(100% - 2rem)); margin: 0 auto; padding: 1.5rem 0 3rem; }
    .notice {
      border: 1px solid #f59e0b;
      border-radius: 8px;
      padding: 0.75rem 1rem;
      margin-bottom: 1rem;
      color: #fbbf24;
    }
    .turn {
      border-radius: 12px;
      padding: 0.75rem 1rem;
      margin-bottom: 0.75rem;
      line-height: 1.5;
      white-space: pre-wrap;
      overflow-wrap: anywhere;
    }
    .turn.user { background: #1f2937; margin-left: 3rem; }
    .turn.assistant { background: #111827; margin-right: 3rem; }
    .empty { color: #71717a; text-align: center; padding: 2rem 0; }
    .pending { font-size: 0.85rem; color: #a1a1aa; margin: 0.5rem 0; }
    form.composer { display: flex; gap: 0.5rem; margin-top: 1rem; }
    form.composer textarea {
      flex: 1;
      min-height: 3.5rem;
      resize: vertical;
      border: 1px solid #27272a;
      border-radius: 8px;
      background: #18181b;
      color: inherit;
      padding: 0.6rem 0.8rem;
      font: inherit;
    }
    button {
      border: none;
      border-radius: 8px;
      background: #10a37f;
      color: #ffffff;
      padding: 0.6rem 1.2rem;
      font-weight: 600;
      cursor: pointer;
    }
    form.upload { display: flex; gap: 0.5rem; align-items: center; margin-top: 0.75rem; }
    form.upload input[type="file"] { color: #a1a1aa; font-size: 0.85rem; }
    form.upload button { background: #27272a; }
"#;

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn notice_fragment(notice: Option<&str>) -> String {
    let Some(notice) = notice else {
        return String::new();
    };
    let text = if notice == UPSTREAM_NOTICE {
        "The model is unreachable right now. Your message was not recorded, please try again."
            .to_string()
    } else {
        html_escape(notice)
    };
    format!("<div class=\"notice\">{text}</div>\n")
}

fn transcript_fragment(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "<p class=\"empty\">No messages yet. Say hello to get started.</p>\n".to_string();
    }

    let mut fragment = String::new();
    for turn in turns {
        fragment.push_str(&format!(
            "<div class=\"turn user\">{}</div>\n<div class=\"turn assistant\">{}</div>\n",
            html_escape(&turn.user),
            html_escape(&turn.assistant),
        ));
    }
    fragment
}

fn pending_fragment(pending_upload: Option<&str>) -> String {
    match pending_upload {
        Some(file_name) => format!(
            "<p class=\"pending\">Attached: {}. It will be included with your next message.</p>\n",
            html_escape(file_name)
        ),
        None => String::new(),
    }
}

/// Renders the signed-in chat page for `identity`.
pub fn render_chat_page(
    identity: &str,
    turns: &[Turn],
    pending_upload: Option<&str>,
    notice: Option<&str>,
) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Orin</title>
  <style>{PAGE_STYLE}</style>
</head>
<body>
  <header>
    <h1>Orin</h1>
    <div class="account"><span>{identity}</span><a href="/logout">Sign out</a></div>
  </header>
  <main>
    {notice}<section class="transcript">
      {transcript}</section>
    {pending}<form class="composer" method="post" action="/chat">
      <textarea name="message" placeholder="Message Orin" autofocus></textarea>
      <button type="submit">Send</button>
    </form>
    <form class="upload" method="post" action="/upload" enctype="multipart/form-data">
      <input type="file" name="file" accept=".pdf,.txt,.docx">
      <button type="submit">Attach</button>
    </form>
  </main>
</body>
</html>
"#,
        identity = html_escape(identity),
        notice = notice_fragment(notice),
        transcript = transcript_fragment(turns),
        pending = pending_fragment(pending_upload),
    )
}

/// Renders a bare error page with an escaped message.
pub fn render_error_page(message: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Orin</title>
  <style>{PAGE_STYLE}</style>
</head>
<body>
  <main>
    <div class="notice">{message}</div>
    <p class="empty"><a href="/">Back to chat</a></p>
  </main>
</body>
</html>
"#,
        message = html_escape(message),
    )
}
