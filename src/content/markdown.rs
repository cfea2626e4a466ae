//! Markdown rendering with optional syntax highlighting

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::MarkdownOptions;

/// Markdown renderer backing the `markdown` template filter
pub struct MarkdownRenderer {
    options: MarkdownOptions,
    highlighter: Option<Highlighter>,
}

struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer with default options
    pub fn new() -> Self {
        Self::with_options(MarkdownOptions::default())
    }

    /// Create with custom settings
    pub fn with_options(options: MarkdownOptions) -> Self {
        let highlighter = options.highlight.then(|| Highlighter {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        });
        Self {
            options,
            highlighter,
        }
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_FOOTNOTES | Options::ENABLE_HEADING_ATTRIBUTES;
        if self.options.gfm {
            options |= Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM;
        }
        if self.options.smartypants {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        let parser = Parser::new_ext(markdown, self.parser_options());

        let Some(highlighter) = &self.highlighter else {
            let mut html_output = String::new();
            html::push_html(&mut html_output, parser);
            return Ok(html_output);
        };

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                        _ => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let highlighted = self.highlight_code(
                        highlighter,
                        &code_block_content,
                        code_block_lang.as_deref(),
                    );
                    events.push(Event::Html(CowStr::from(highlighted)));
                    in_code_block = false;
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Highlight a code block
    fn highlight_code(&self, highlighter: &Highlighter, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        let syntax = highlighter
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| highlighter.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| highlighter.syntax_set.find_syntax_plain_text());

        let theme = highlighter
            .theme_set
            .themes
            .get(&self.options.highlight_theme)
            .or_else(|| highlighter.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &highlighter.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(highlighted) if self.options.line_numbers => {
                self.add_line_numbers(&highlighted, lang)
            }
            Some(highlighted) => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                lang, highlighted
            ),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                lang,
                html_escape(code)
            ),
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            lang,
            gutter,
            lines.join("\n")
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
