use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, TagEnd, html};
use regex_lite::Regex;

use crate::app::error::{EditorError, Result};

/// Converts markdown source into HTML.
pub trait Renderer {
    fn render(&self, markdown: &str) -> Result<String>;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> Result<String>,
{
    fn render(&self, markdown: &str) -> Result<String> {
        self(markdown)
    }
}

/// The default renderer, backed by pulldown-cmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String> {
        Ok(render_markdown(markdown))
    }
}

/// Output format for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Raw,
    Html,
    Text,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Raw => "raw",
            ExportFormat::Html => "html",
            ExportFormat::Text => "text",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raw" | "markdown" | "md" => Ok(ExportFormat::Raw),
            "html" => Ok(ExportFormat::Html),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(EditorError::Config(format!("unknown export format: {other}"))),
        }
    }
}

/// Convert markdown into `format`. Raw is returned untouched.
pub fn convert(markdown: &str, format: ExportFormat, renderer: &dyn Renderer) -> Result<String> {
    match format {
        ExportFormat::Raw => Ok(markdown.to_string()),
        ExportFormat::Html => renderer.render(markdown),
        ExportFormat::Text => Ok(plain_text(markdown)),
    }
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Render markdown text to HTML.
pub fn render_markdown(text: &str) -> String {
    let source = normalize_atx_headings(text);
    let parser = Parser::new_ext(&source, parser_options());
    let mut html_output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}

/// Strip markdown down to its text, one line per block.
pub fn plain_text(text: &str) -> String {
    let source = normalize_atx_headings(text);
    let mut out = String::with_capacity(source.len());
    for event in Parser::new_ext(&source, parser_options()) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(end) if ends_block(&end) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    out
}

fn ends_block(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock
    )
}

static ATX_NO_SPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^( {0,3})(#{1,6})([^#\s])").expect("static heading pattern")
});

/// `#title` is a heading in older markdown dialects but a paragraph in
/// CommonMark. Insert the missing space outside fenced code.
fn normalize_atx_headings(text: &str) -> Cow<'_, str> {
    if !text.contains('#') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut fence: Option<(char, usize)> = None;
    let mut changed = false;

    for line in text.split_inclusive('\n') {
        if let Some(marker) = fence_marker(line) {
            fence = match fence {
                None => Some(marker),
                Some((ch, len)) if marker.0 == ch && marker.1 >= len => None,
                open => open,
            };
            out.push_str(line);
            continue;
        }

        if fence.is_none() {
            if let Cow::Owned(fixed) = ATX_NO_SPACE.replace(line, "${1}${2} ${3}") {
                out.push_str(&fixed);
                changed = true;
                continue;
            }
        }
        out.push_str(line);
    }

    if changed { Cow::Owned(out) } else { Cow::Borrowed(text) }
}

fn fence_marker(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let ch = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}
