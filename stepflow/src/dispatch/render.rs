//! Template renderer collaborator.

use crate::errors::RenderError;
use serde_json::Value;

/// Renders a named template with data into markup.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Renders `template` with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error when the template is unknown or fails to render.
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError>;
}

/// Minimal renderer that prints the template name and its data as escaped
/// JSON inside an HTML page. Useful for demos and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTemplateRenderer;

impl TemplateRenderer for JsonTemplateRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError> {
        let pretty = serde_json::to_string_pretty(data)
            .map_err(|err| RenderError::new(template, err.to_string()))?;

        Ok(format!(
            "<!doctype html>\n<html><head><title>{title}</title></head>\
             <body><pre data-template=\"{title}\">{body}</pre></body></html>",
            title = escape_html(template),
            body = escape_html(&pretty),
        ))
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_renderer_escapes() {
        let html = JsonTemplateRenderer
            .render("tasks/index", &json!({"title": "<b>bold</b>"}))
            .unwrap();

        assert!(html.contains("data-template=\"tasks/index\""));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_mock_renderer() {
        let mut renderer = MockTemplateRenderer::new();
        renderer
            .expect_render()
            .withf(|template, _| template == "missing")
            .returning(|template, _| Err(RenderError::new(template, "not found")));

        let err = renderer.render("missing", &json!({})).unwrap_err();
        assert_eq!(err.template, "missing");
    }
}
