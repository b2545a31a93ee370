//! Untrusted code execution boundary. The studio never runs generated
//! JavaScript in-process: it emits a harness script that, inside the preview
//! document, constructs the isolated namespace and the restricted `app`
//! capability object, wraps the generated code in error containment, and
//! gates `app.onKey` handlers behind the preview focus flag.

pub fn namespace_for(timestamp_millis: u128) -> String {
    format!("preview_app_{timestamp_millis}")
}

/// Builds the complete harness script around one payload's JavaScript.
/// Pure string construction; the generated text mirrors the `KeyRouter`
/// transitions (preview click focuses, Escape/Tab return focus).
pub fn build_harness(javascript: &str, namespace: &str, container_id: &str) -> String {
    format!(
        r##"(function () {{
    var appNamespace = "{namespace}";
    window[appNamespace] = window[appNamespace] || {{}};
    var __containerId = "{container_id}";
    var __container = document.getElementById(__containerId);
    var __previewFocused = false;

    if (__container) {{
        __container.addEventListener("click", function () {{
            __previewFocused = true;
        }});
    }}
    document.addEventListener("keydown", function (event) {{
        if (event.key === "Escape" || event.key === "Tab") {{
            __previewFocused = false;
        }}
    }}, true);

    function __showError(err) {{
        if (!__container) {{ return; }}
        var block = document.createElement("div");
        block.style.cssText = "color: red; padding: 10px; background: #ffe6e6; " +
            "border: 1px solid #ff9999; border-radius: 4px; margin: 10px;";
        block.textContent = "JavaScript Error: " + (err && err.message ? err.message : err);
        __container.appendChild(block);
    }}

    var app = {{
        id: "preview-app",
        getElementById: function (id) {{
            return document.getElementById(__containerId + "_" + id) ||
                document.getElementById(id);
        }},
        querySelector: function (selector) {{
            return document.querySelector("#" + __containerId + " " + selector);
        }},
        querySelectorAll: function (selector) {{
            return document.querySelectorAll("#" + __containerId + " " + selector);
        }},
        onKey: function (eventType, handler) {{
            document.addEventListener(eventType, function (event) {{
                if (__previewFocused) {{
                    handler(event);
                }}
            }});
        }},
        data: {{}}
    }};

    try {{
{javascript}
    }} catch (err) {{
        console.warn("app javascript execution error:", err);
        __showError(err);
    }}

    if (window[appNamespace] && typeof window[appNamespace].init === "function") {{
        try {{
            window[appNamespace].init();
        }} catch (err) {{
            console.log("preview init error (expected for host-dependent apps):", err.message);
        }}
    }}
}})();
"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "preview_app_1700000000000";
    const CONTAINER: &str = "preview-content-1700000000000";

    #[test]
    fn harness_creates_namespace_before_running_untrusted_code() {
        let harness = build_harness("window[appNamespace].count = 1;", NS, CONTAINER);
        let namespace_at = harness
            .find("window[appNamespace] = window[appNamespace] || {}")
            .expect("namespace setup should be present");
        let payload_at = harness
            .find("window[appNamespace].count = 1;")
            .expect("payload should be embedded verbatim");
        assert!(namespace_at < payload_at);
        assert!(harness.contains(&format!("var appNamespace = \"{NS}\"")));
    }

    #[test]
    fn helper_object_exposes_the_restricted_method_set() {
        let harness = build_harness("", NS, CONTAINER);
        for method in ["getElementById", "querySelector", "querySelectorAll", "onKey"] {
            assert!(
                harness.contains(&format!("{method}: function")),
                "app helper should expose {method}"
            );
        }
        // Container-prefixed lookup with document-wide fallback.
        assert!(harness.contains("__containerId + \"_\" + id"));
        assert!(harness.contains("\"#\" + __containerId + \" \" + selector"));
    }

    #[test]
    fn untrusted_code_and_init_run_in_separate_containment() {
        let harness = build_harness("throw new Error('boom');", NS, CONTAINER);
        assert!(harness.contains("throw new Error('boom');"));
        assert!(harness.contains("__showError(err)"));
        assert!(harness.contains("window[appNamespace].init();"));
        // Two separate try blocks: one for the payload, one for init.
        assert_eq!(harness.matches("try {").count(), 2);
    }

    #[test]
    fn on_key_handlers_are_gated_by_the_focus_flag() {
        let harness = build_harness("", NS, CONTAINER);
        assert!(harness.contains("if (__previewFocused)"));
        assert!(harness.contains("event.key === \"Escape\" || event.key === \"Tab\""));
    }
}
