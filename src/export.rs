// Export of the current response as markdown, plain text or standalone HTML.

use crate::classify::{classify, VisualTag};
use crate::store::Palette;
use serde::Deserialize;

/// Accent used for the frozen/drone presentation.
const FREEZE_ACCENT: &str = "#22d3ee";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Text,
    Html,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Html => "text/html; charset=utf-8",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
            ExportFormat::Html => "html",
        }
    }
}

pub fn export(text: &str, format: ExportFormat, palette: &Palette) -> String {
    match format {
        ExportFormat::Markdown => text.to_string(),
        ExportFormat::Text => to_plain_text(text),
        ExportFormat::Html => to_html(text, palette),
    }
}

// ─── Plain text ───

pub fn to_plain_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let body = trimmed.trim_start_matches('#').trim_start();
            let body = if trimmed.starts_with('#') { body } else { trimmed };
            let body = body.strip_prefix('>').map(str::trim_start).unwrap_or(body);
            let indent = &line[..line.len() - trimmed.len()];
            format!("{}{}", indent, strip_inline(body))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_inline(line: &str) -> String {
    line.replace("**", "").replace('`', "").replace('*', "")
}

// ─── HTML ───

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Bold, italic and inline code. Unterminated markers stay literal.
fn render_inline(line: &str) -> String {
    let mut out = String::new();
    let mut rest = line;

    while !rest.is_empty() {
        let (marker, tag) = if rest.starts_with("**") {
            ("**", "strong")
        } else if rest.starts_with('*') {
            ("*", "em")
        } else if rest.starts_with('`') {
            ("`", "code")
        } else {
            let next = rest.find(['*', '`']).unwrap_or(rest.len());
            let next = if next == 0 { rest.chars().next().map_or(1, char::len_utf8) } else { next };
            out.push_str(&escape_html(&rest[..next]));
            rest = &rest[next..];
            continue;
        };

        let after = &rest[marker.len()..];
        match after.find(marker) {
            Some(end) if end > 0 => {
                out.push_str(&format!("<{}>{}</{}>", tag, escape_html(&after[..end]), tag));
                rest = &after[end + marker.len()..];
            }
            _ => {
                out.push_str(&escape_html(marker));
                rest = after;
            }
        }
    }
    out
}

/// A line that is only a bold label, e.g. `**Core Devices**:`.
fn section_label(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("**")?;
    let inner = inner
        .strip_suffix("**:")
        .or_else(|| inner.strip_suffix("**"))?;
    if inner.is_empty() || inner.contains("**") {
        None
    } else {
        Some(inner)
    }
}

fn ordered_item(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

fn switch_list(html: &mut String, open: &mut Option<ListKind>, want: Option<ListKind>) {
    if *open != want {
        if let Some(kind) = open.take() {
            html.push_str(&format!("</{}>\n", kind.tag()));
        }
        if let Some(kind) = want {
            html.push_str(&format!("<{}>\n", kind.tag()));
        }
        *open = want;
    }
}

fn render_body(text: &str) -> String {
    let mut html = String::new();
    let mut open: Option<ListKind> = None;

    for raw in text.lines() {
        let line = raw.trim();

        let item = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
            .map(|item| (ListKind::Unordered, item))
            .or_else(|| ordered_item(line).map(|item| (ListKind::Ordered, item)));

        if let Some((kind, item)) = item {
            switch_list(&mut html, &mut open, Some(kind));
            html.push_str(&format!("<li>{}</li>\n", render_inline(item)));
            continue;
        }
        switch_list(&mut html, &mut open, None);

        if line.is_empty() {
            continue;
        }
        if let Some(h) = line.strip_prefix("### ") {
            html.push_str(&format!("<h3>{}</h3>\n", render_inline(h)));
        } else if let Some(h) = line.strip_prefix("## ") {
            html.push_str(&format!("<h2>{}</h2>\n", render_inline(h)));
        } else if let Some(h) = line.strip_prefix("# ") {
            html.push_str(&format!("<h1>{}</h1>\n", render_inline(h)));
        } else if let Some(label) = section_label(line) {
            html.push_str(&format!("<h4>{}</h4>\n", escape_html(label)));
        } else if let Some(quote) = line.strip_prefix('>') {
            html.push_str(&format!("<blockquote>{}</blockquote>\n", render_inline(quote.trim_start())));
        } else {
            html.push_str(&format!("<p>{}</p>\n", render_inline(line)));
        }
    }
    switch_list(&mut html, &mut open, None);
    html
}

pub fn to_html(text: &str, palette: &Palette) -> String {
    let accent = if classify(text).contains(&VisualTag::Freeze) {
        FREEZE_ACCENT
    } else {
        palette.accent.as_str()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Livewire Architect Guide</title>
<style>
body {{ background: {base}; color: {text}; font-family: -apple-system, "Segoe UI", sans-serif; line-height: 1.6; margin: 0; }}
main {{ max-width: 46rem; margin: 2rem auto; padding: 2rem; background: {surface}; border: 1px solid {border}; border-radius: 12px; }}
h1, h2 {{ border-bottom: 1px solid {border}; padding-bottom: 0.3rem; }}
h3 {{ color: {accent}; }}
h4 {{ color: {muted}; text-transform: uppercase; letter-spacing: 0.1em; font-size: 0.85rem; }}
li::marker {{ color: {accent}; }}
em {{ color: {accent}; font-style: normal; }}
code {{ background: {panel}; border: 1px solid {border}; border-radius: 4px; padding: 0 0.3rem; }}
blockquote {{ border-left: 4px solid {accent}; background: {panel}; margin: 1rem 0; padding: 0.75rem 1rem; font-style: italic; }}
</style>
</head>
<body>
<main>
{body}</main>
</body>
</html>
"#,
        base = palette.base,
        surface = palette.surface,
        panel = palette.panel,
        border = palette.border,
        text = palette.text,
        muted = palette.muted,
        accent = accent,
        body = render_body(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ThemePreset;

    const GUIDE: &str = "## Dark Techno Bass\n**Concept**:\nA *rolling* sub with `Operator`.\n\n1. Load **Operator**\n2. Add **Saturator**\n- Drive: 6 dB\n> Tip: press Cmd+G to group";

    #[test]
    fn test_markdown_is_verbatim() {
        let palette = ThemePreset::Live.palette();
        assert_eq!(export(GUIDE, ExportFormat::Markdown, &palette), GUIDE);
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let text = to_plain_text(GUIDE);
        assert!(text.starts_with("Dark Techno Bass\nConcept:\nA rolling sub with Operator."));
        assert!(text.contains("1. Load Operator"));
        assert!(text.contains("- Drive: 6 dB"));
        assert!(text.contains("Tip: press Cmd+G to group"));
        assert!(!text.contains('*'));
        assert!(!text.contains('#'));
    }

    #[test]
    fn test_html_structure() {
        let palette = ThemePreset::Midnight.palette();
        let html = to_html(GUIDE, &palette);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h2>Dark Techno Bass</h2>"));
        assert!(html.contains("<h4>Concept</h4>"));
        assert!(html.contains("<p>A <em>rolling</em> sub with <code>Operator</code>.</p>"));
        assert!(html.contains("<ol>\n<li>Load <strong>Operator</strong></li>\n<li>Add <strong>Saturator</strong></li>\n</ol>\n<ul>\n<li>Drive: 6 dB</li>\n</ul>"));
        assert!(html.contains("<blockquote>Tip: press Cmd+G to group</blockquote>"));
        assert!(html.contains(&palette.base));
        assert!(html.contains(&palette.accent));
    }

    #[test]
    fn test_html_escapes_content() {
        let html = to_html("Route <Audio To> & \"Sends\"", &ThemePreset::Live.palette());
        assert!(html.contains("<p>Route &lt;Audio To&gt; &amp; &quot;Sends&quot;</p>"));
    }

    #[test]
    fn test_unterminated_markers_stay_literal() {
        assert_eq!(render_inline("3 * 4 = 12"), "3 * 4 = 12");
        assert_eq!(render_inline("**open"), "**open");
    }

    #[test]
    fn test_freeze_responses_use_freeze_accent() {
        let palette = ThemePreset::Live.palette();
        let html = to_html("Set Hybrid Reverb to Freeze", &palette);
        assert!(html.contains(FREEZE_ACCENT));
        assert!(!html.contains(&palette.accent));
    }

    #[test]
    fn test_format_wire_names() {
        let format: ExportFormat = serde_json::from_str("\"html\"").unwrap();
        assert_eq!(format, ExportFormat::Html);
        assert_eq!(format.file_extension(), "html");
    }
}
