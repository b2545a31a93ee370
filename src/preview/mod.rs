use crate::session::AppPayload;

pub mod css;
pub mod harness;
pub mod keys;

/// One fully prepared, isolated render of an [`AppPayload`]. Each render gets
/// a fresh container id and namespace and wholly replaces the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewDocument {
    pub container_id: String,
    pub namespace: String,
    pub title: String,
    pub icon: String,
    pub description: Option<String>,
    pub html: String,
    pub scoped_css: String,
    pub harness_js: String,
}

pub fn container_id_for(timestamp_millis: u128) -> String {
    format!("preview-content-{timestamp_millis}")
}

/// Prepares a sandboxed preview: scopes the payload CSS under a unique
/// container, wraps the payload JS in the untrusted-code harness, and leaves
/// the HTML verbatim for embedding inside the container element.
pub fn render(payload: &AppPayload, timestamp_millis: u128) -> PreviewDocument {
    let container_id = container_id_for(timestamp_millis);
    let namespace = harness::namespace_for(timestamp_millis);
    PreviewDocument {
        scoped_css: css::scoped_stylesheet(&payload.css, &container_id),
        harness_js: harness::build_harness(&payload.javascript, &namespace, &container_id),
        container_id,
        namespace,
        title: payload.title.clone(),
        icon: payload.icon.clone(),
        description: payload.description.clone(),
        html: payload.html.clone(),
    }
}

impl PreviewDocument {
    /// Complete scoped HTML document for viewing the preview in a browser.
    /// Unlike the raw test document this one keeps the container isolation.
    pub fn standalone_document(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title} - \
Preview</title>\n<style>\n{css}\n</style>\n</head>\n<body>\n<div id=\"{container}\">\n{html}\n\
</div>\n<script>\n{js}\n</script>\n</body>\n</html>\n",
            title = self.title,
            css = self.scoped_css,
            container = self.container_id,
            html = self.html,
            js = self.harness_js,
        )
    }
}
