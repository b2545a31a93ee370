use crate::session::AppPayload;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const EXPORT_VERSION: &str = "1.0";

/// Portable app document written on export and accepted back on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub exported: String,
    pub app: AppPayload,
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn exports_dir() -> PathBuf {
    home_dir().join(".appstudio").join("exports")
}

/// Filesystem-safe name derived from an app title.
pub fn slugify_title(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "app".to_string()
    } else {
        // Collapse runs of dashes left by non-alphanumeric spans.
        let mut out = String::with_capacity(trimmed.len());
        for ch in trimmed.chars() {
            if ch == '-' && out.ends_with('-') {
                continue;
            }
            out.push(ch);
        }
        out
    }
}

pub fn export_json(app: &AppPayload) -> serde_json::Result<String> {
    let document = ExportDocument {
        version: EXPORT_VERSION.to_string(),
        exported: Utc::now().to_rfc3339(),
        app: app.clone(),
    };
    serde_json::to_string_pretty(&document)
}

pub fn export_file_name(app: &AppPayload) -> String {
    format!("{}.json", slugify_title(&app.title))
}

pub fn write_export(app: &AppPayload) -> io::Result<PathBuf> {
    let dir = exports_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(export_file_name(app));
    let json = export_json(app)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    fs::write(&path, json)?;
    Ok(path)
}

pub fn import_app(path: &Path) -> io::Result<AppPayload> {
    let data = fs::read(path)?;
    let document: ExportDocument = serde_json::from_slice(&data)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    if document.version != EXPORT_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown export version: {}", document.version),
        ));
    }
    Ok(document.app)
}

/// Full standalone page for the "test in browser" action. Deliberately
/// unscoped: the point is to run the app outside the preview sandbox.
pub fn test_document(app: &AppPayload) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title} - Test</title>\n\
<style>\n{css}\n</style>\n</head>\n<body>\n{html}\n<script>\nvar appNamespace = 'test_app';\n\
window[appNamespace] = window[appNamespace] || {{}};\n{javascript}\n\
if (window[appNamespace].init) {{ window[appNamespace].init(); }}\n</script>\n</body>\n</html>\n",
        title = app.title,
        css = app.css,
        html = app.html,
        javascript = app.javascript,
    )
}

pub fn write_test_document(app: &AppPayload) -> io::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!(
        "appstudio-test-{}-{}.html",
        slugify_title(&app.title),
        crate::session::timestamp_millis()
    ));
    fs::write(&path, test_document(app))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> AppPayload {
        AppPayload {
            title: "My Cost Tracker!".to_string(),
            icon: "💰".to_string(),
            html: "<div>costs</div>".to_string(),
            css: ".row { color: blue }".to_string(),
            javascript: "window[appNamespace].init = function() {};".to_string(),
            description: None,
        }
    }

    #[test]
    fn titles_slugify_to_safe_file_names() {
        assert_eq!(slugify_title("My Cost Tracker!"), "my-cost-tracker");
        assert_eq!(slugify_title("  Weird   --- Name  "), "weird-name");
        assert_eq!(slugify_title("!!!"), "app");
    }

    #[test]
    fn export_then_import_round_trips_the_app() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("export.json");
        fs::write(&path, export_json(&payload()).expect("export json"))
            .expect("write export");

        let imported = import_app(&path).expect("import");
        assert_eq!(imported, payload());
    }

    #[test]
    fn import_rejects_unknown_versions() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("export.json");
        let json = serde_json::to_value(ExportDocument {
            version: "9.9".to_string(),
            exported: "2026-01-01T00:00:00Z".to_string(),
            app: payload(),
        })
        .expect("to value");
        fs::write(&path, json.to_string()).expect("write export");

        let error = import_app(&path).expect_err("version mismatch");
        assert!(error.to_string().contains("unknown export version"));
    }

    #[test]
    fn export_document_carries_version_and_timestamp() {
        let json = export_json(&payload()).expect("export json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["version"], "1.0");
        assert!(value["exported"].as_str().is_some_and(|s| s.contains('T')));
        assert_eq!(value["app"]["title"], "My Cost Tracker!");
    }

    #[test]
    fn test_document_embeds_source_verbatim_and_calls_init() {
        let html = test_document(&payload());
        assert!(html.contains(".row { color: blue }"));
        assert!(html.contains("<div>costs</div>"));
        assert!(html.contains("var appNamespace = 'test_app';"));
        assert!(html.contains("if (window[appNamespace].init) { window[appNamespace].init(); }"));
    }
}
