//! HTML rendering of a prepared motive.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::motive::PreparedMotive;

const BUILTIN_TEMPLATE: &str = "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>{{title}}</title>\
<style>body { margin: 0; background: #111; color: #eee; font-family: sans-serif; }\n\
figure { margin: 0; height: 100vh; display: flex; align-items: center; justify-content: center; }\n\
img { max-width: 100%; max-height: 100vh; object-fit: contain; }\n\
header { position: fixed; left: 0; right: 0; bottom: 0; padding: 16px 24px; background: rgba(0, 0, 0, 0.55); }\n\
h1 { margin: 0 0 4px 0; font-size: 1.6rem; }\n\
p { margin: 2px 0; color: #ccc; }</style></head>\
<body><figure><img src=\"{{image_url}}\" width=\"{{image_width}}\" height=\"{{image_height}}\" alt=\"{{title}}\"></figure>\
<header><h1>{{title}}</h1>{{descriptions}}</header></body></html>";

/// Page layout with `{{placeholder}}` slots.
///
/// Supported slots: `title`, `descriptions`, `query`, `image_url`,
/// `image_width`, `image_height`. Every value is HTML-escaped.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    source: String,
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self {
            source: BUILTIN_TEMPLATE.to_string(),
        }
    }
}

impl PageTemplate {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template at {}", path.display()))?;
        Ok(Self::new(source))
    }

    /// Fill every slot in one pass; substituted values are never re-expanded.
    /// Unknown slots are kept verbatim.
    #[must_use]
    pub fn render(&self, motive: &PreparedMotive) -> String {
        let mut out = String::with_capacity(self.source.len() + 256);
        let mut rest = self.source.as_str();
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };
            match slot_value(&after[..end], motive) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }
}

fn slot_value(name: &str, motive: &PreparedMotive) -> Option<String> {
    let value = match name {
        "title" => escape_html(&motive.theme.title),
        "descriptions" => {
            let mut descriptions = String::new();
            for description in &motive.theme.descriptions {
                write!(&mut descriptions, "<p>{}</p>", escape_html(description)).ok();
            }
            descriptions
        }
        "query" => escape_html(&motive.query),
        "image_url" => escape_html(&motive.image.url),
        "image_width" => motive.image.width.to_string(),
        "image_height" => motive.image.height.to_string(),
        _ => return None,
    };
    Some(value)
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectedImage;
    use crate::themes::Theme;
    use std::sync::Arc;

    fn motive() -> PreparedMotive {
        PreparedMotive {
            theme: Arc::new(Theme {
                title: "Ocean & <Sea>".into(),
                descriptions: vec!["Waves".into(), "Salt \"air\"".into()],
                queries: vec!["ocean".into(), "sea".into()],
            }),
            query: "ocean, sea".into(),
            image: SelectedImage {
                url: "https://live.example/o.jpg?a=1&b=2".into(),
                width: 1920,
                height: 1080,
            },
        }
    }

    #[test]
    fn builtin_layout_escapes_values() {
        let html = PageTemplate::default().render(&motive());
        assert!(html.contains("<h1>Ocean &amp; &lt;Sea&gt;</h1>"));
        assert!(html.contains("src=\"https://live.example/o.jpg?a=1&amp;b=2\""));
        assert!(html.contains("<p>Salt &quot;air&quot;</p>"));
        assert!(html.contains("width=\"1920\" height=\"1080\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn custom_template_slots() {
        let template =
            PageTemplate::new("{{query}}|{{image_width}}x{{image_height}}|{{descriptions}}");
        assert_eq!(
            template.render(&motive()),
            "ocean, sea|1920x1080|<p>Waves</p><p>Salt &quot;air&quot;</p>"
        );
    }

    #[test]
    fn template_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<title>{{title}}</title>").unwrap();
        let template = PageTemplate::from_file(&path).unwrap();
        assert_eq!(
            template.render(&motive()),
            "<title>Ocean &amp; &lt;Sea&gt;</title>"
        );
        assert!(PageTemplate::from_file(dir.path().join("missing.html")).is_err());
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let mut motive = motive();
        motive.theme = Arc::new(Theme {
            title: "Use {{image_url}}".into(),
            descriptions: vec!["{{query}}".into()],
            queries: vec!["ocean".into()],
        });
        let template = PageTemplate::new("<h1>{{title}}</h1>{{descriptions}}|{{image_url}}");
        assert_eq!(
            template.render(&motive),
            "<h1>Use {{image_url}}</h1><p>{{query}}</p>|https://live.example/o.jpg?a=1&amp;b=2"
        );
    }

    #[test]
    fn unknown_and_unclosed_slots_stay_verbatim() {
        let template = PageTemplate::new("{{nope}} {{query}} {{open");
        assert_eq!(template.render(&motive()), "{{nope}} ocean, sea {{open");
    }
}
