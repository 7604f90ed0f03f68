use pulldown_cmark::escape::escape_html;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use regex::Regex;
use std::sync::OnceLock;

/// CSS class carried by rendered note links; the UI dispatches clicks on it.
pub const NOTE_LINK_CLASS: &str = "note-link";

fn wiki_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\[\]\n]+)\]\]").expect("wiki-link pattern is valid"))
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

enum Chunk<'a> {
    /// Adjacent prose text joined back together; the parser splits it at brackets.
    Prose(String),
    Other(Event<'a>),
}

/// Parse `content`, keeping code spans and code blocks apart from prose.
fn chunks(content: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut prose = String::new();
    let mut in_code_block = false;

    for event in Parser::new_ext(content, options()) {
        match event {
            Event::Text(text) if !in_code_block => prose.push_str(&text),
            other => {
                if !prose.is_empty() {
                    chunks.push(Chunk::Prose(std::mem::take(&mut prose)));
                }
                match &other {
                    Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                    Event::End(Tag::CodeBlock(_)) => in_code_block = false,
                    _ => {}
                }
                chunks.push(Chunk::Other(other));
            }
        }
    }
    if !prose.is_empty() {
        chunks.push(Chunk::Prose(prose));
    }
    chunks
}

/// Non-empty `[[...]]` titles in `text` with their byte ranges.
fn link_spans(text: &str) -> impl Iterator<Item = (usize, usize, &str)> {
    wiki_link_re().captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let title = caps.get(1)?.as_str().trim();
        (!title.is_empty()).then(|| (whole.start(), whole.end(), title))
    })
}

/// Titles referenced by `[[...]]` in `content`, in order of appearance.
/// Link syntax inside code is not a reference.
pub fn links_in(content: &str) -> Vec<String> {
    chunks(content)
        .iter()
        .filter_map(|chunk| match chunk {
            Chunk::Prose(text) => Some(text),
            Chunk::Other(_) => None,
        })
        .flat_map(|text| link_spans(text).map(|(_, _, title)| title.to_string()))
        .collect()
}

/// Render `content` to HTML for the preview pane.
pub fn render_preview(content: &str) -> String {
    let events = chunks(content).into_iter().flat_map(|chunk| match chunk {
        Chunk::Prose(text) => link_events(&text),
        Chunk::Other(event) => vec![event],
    });

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn link_events<'a>(text: &str) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut last = 0;
    for (start, end, title) in link_spans(text) {
        if start > last {
            events.push(Event::Text(CowStr::from(text[last..start].to_string())));
        }
        events.push(Event::Html(CowStr::from(anchor(title))));
        last = end;
    }
    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
    events
}

fn anchor(title: &str) -> String {
    let mut escaped = String::with_capacity(title.len());
    // Writing into a String cannot fail.
    let _ = escape_html(&mut escaped, title);
    format!(
        r##"<a href="#" class="{}" data-note="{}">{}</a>"##,
        NOTE_LINK_CLASS, escaped, escaped
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_in() {
        let content = "See [[Plan]] and [[ Ideas ]], not [[]] or [single].";
        assert_eq!(links_in(content), vec!["Plan".to_string(), "Ideas".to_string()]);
    }

    #[test]
    fn test_render_heading_and_link() {
        let html = render_preview("# Title\n\nGo to [[Next Step]].");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains(r#"class="note-link" data-note="Next Step""#));
        assert!(html.contains("Go to <a"));
        assert!(html.contains("</a>.</p>"));
    }

    #[test]
    fn test_link_title_is_escaped() {
        let html = render_preview("[[a \"quoted\" & b]]");
        assert!(html.contains("data-note=\"a &quot;quoted&quot; &amp; b\""));
    }

    #[test]
    fn test_links_inside_code_are_literal() {
        let content = "use `[[Plan]]` literally\n\n```\n[[Plan]]\n```\n";
        let html = render_preview(content);
        assert!(!html.contains(NOTE_LINK_CLASS));
        assert!(html.contains("<code>[[Plan]]</code>"));
        assert!(html.contains("<pre><code>[[Plan]]\n</code></pre>"));
        assert!(links_in(content).is_empty());
    }

    #[test]
    fn test_code_and_prose_links_mixed() {
        let content = "`[[Skip]]` but [[Keep]]";
        assert_eq!(links_in(content), vec!["Keep".to_string()]);
        let html = render_preview(content);
        assert!(html.contains(r#"data-note="Keep""#));
        assert!(!html.contains(r#"data-note="Skip""#));
    }

    #[test]
    fn test_tables_enabled() {
        let html = render_preview("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }
}
