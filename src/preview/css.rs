use regex::Regex;
use std::sync::OnceLock;

// Host content-root convention: generated apps target "#content_<appId>".
fn content_root_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"#content_[A-Za-z0-9_-]+").expect("content root pattern should compile")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Rule,
    AtGroup,
    Keyframes,
}

/// Full scoped stylesheet for one render: hard containment rules first, then
/// the payload CSS with every selector rewritten under the container id.
pub fn scoped_stylesheet(css: &str, container_id: &str) -> String {
    format!(
        "{}\n{}",
        containment_rules(container_id),
        scope_selectors(css, container_id)
    )
}

/// Defensive rules preventing the embedded app from escaping its box: the
/// container is pinned relative with a fixed height, descendant fixed/absolute
/// inline positioning is demoted, and canvases are forced to block display.
pub fn containment_rules(container_id: &str) -> String {
    format!(
        "#{id} {{\n    position: relative !important;\n    overflow: auto !important;\n    \
width: 100% !important;\n    height: 500px !important;\n    contain: layout style paint \
!important;\n    box-sizing: border-box !important;\n}}\n\n#{id} > * {{\n    position: \
relative !important;\n    max-width: 100% !important;\n}}\n\n#{id} canvas {{\n    position: \
relative !important;\n    display: block !important;\n}}\n\n#{id} *[style*=\"position: \
fixed\"],\n#{id} *[style*=\"position: absolute\"] {{\n    position: relative !important;\n}}\n",
        id = container_id
    )
}

/// Rewrites every rule selector so it only matches inside the container:
/// host content-root selectors are renamed to the container id, each
/// comma-separated selector gets a `#<container> ` prefix, `@`-rule prologue
/// lines stay untouched and `@keyframes` interiors are never scoped.
/// Idempotent: selectors already under the container id are left alone.
pub fn scope_selectors(css: &str, container_id: &str) -> String {
    let css = content_root_pattern().replace_all(css, format!("#{container_id}").as_str());

    let mut out = String::with_capacity(css.len() + css.len() / 4);
    let mut stack: Vec<Block> = Vec::new();
    let mut chunk = String::new();

    for ch in css.chars() {
        match ch {
            '{' => {
                let trimmed = chunk.trim();
                let block = if trimmed.starts_with('@') {
                    if trimmed.starts_with("@keyframes") || trimmed.starts_with("@-webkit-keyframes")
                    {
                        Block::Keyframes
                    } else {
                        Block::AtGroup
                    }
                } else {
                    Block::Rule
                };

                if block == Block::Rule && can_scope(&stack) && !trimmed.is_empty() {
                    let lead_len = chunk.len() - chunk.trim_start().len();
                    out.push_str(&chunk[..lead_len]);
                    out.push_str(&scope_selector_list(trimmed, container_id));
                    out.push_str(" {");
                } else {
                    out.push_str(&chunk);
                    out.push('{');
                }
                stack.push(block);
                chunk.clear();
            }
            '}' => {
                out.push_str(&chunk);
                out.push('}');
                chunk.clear();
                stack.pop();
            }
            _ => chunk.push(ch),
        }
    }
    out.push_str(&chunk);
    out
}

// Scope at the top level and directly inside conditional group rules
// (@media, @supports); never inside @keyframes, whose selectors are offsets.
fn can_scope(stack: &[Block]) -> bool {
    stack.iter().all(|block| *block == Block::AtGroup)
}

fn scope_selector_list(selector_list: &str, container_id: &str) -> String {
    let prefix = format!("#{container_id}");
    selector_list
        .split(',')
        .map(str::trim)
        .filter(|selector| !selector.is_empty())
        .map(|selector| {
            if selector.starts_with(&prefix) {
                selector.to_string()
            } else {
                format!("{prefix} {selector}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: &str = "preview-content-1700000000000";

    #[test]
    fn every_comma_separated_selector_is_scoped_independently() {
        let scoped = scope_selectors(".foo, .bar { color: red }", CONTAINER);
        assert!(scoped.contains(&format!("#{CONTAINER} .foo")));
        assert!(scoped.contains(&format!("#{CONTAINER} .bar")));
        assert_eq!(scoped, format!("#{CONTAINER} .foo, #{CONTAINER} .bar {{ color: red }}"));
    }

    #[test]
    fn scoping_is_idempotent() {
        let once = scope_selectors(".foo { color: red }\n#app .btn { margin: 0 }", CONTAINER);
        let twice = scope_selectors(&once, CONTAINER);
        assert_eq!(once, twice);
    }

    #[test]
    fn host_content_root_selectors_are_renamed_to_the_container() {
        let scoped = scope_selectors("#content_app-development-studio { padding: 4px }", CONTAINER);
        assert_eq!(scoped, format!("#{CONTAINER} {{ padding: 4px }}"));
        assert!(!scoped.contains("#content_"));
    }

    #[test]
    fn at_rule_prologue_lines_stay_untouched() {
        let css = "@media (max-width: 600px) {\n  .foo { color: red }\n}\n\
@keyframes spin {\n  from { transform: rotate(0) }\n  to { transform: rotate(360deg) }\n}";
        let scoped = scope_selectors(css, CONTAINER);
        assert!(scoped.contains("@media (max-width: 600px) {"));
        assert!(scoped.contains("@keyframes spin {"));
        // Rules inside conditional groups are scoped; keyframe offsets are not.
        assert!(scoped.contains(&format!("#{CONTAINER} .foo {{ color: red }}")));
        assert!(scoped.contains("from { transform: rotate(0) }"));
        assert!(scoped.contains("to { transform: rotate(360deg) }"));
    }

    #[test]
    fn containment_rules_pin_the_container_and_demote_escapes() {
        let rules = containment_rules(CONTAINER);
        assert!(rules.contains(&format!("#{CONTAINER} {{")));
        assert!(rules.contains("overflow: auto !important"));
        assert!(rules.contains("height: 500px !important"));
        assert!(rules.contains("*[style*=\"position: fixed\"]"));
        assert!(rules.contains(&format!("#{CONTAINER} canvas {{")));
    }

    #[test]
    fn scoped_stylesheet_places_containment_before_payload_rules() {
        let sheet = scoped_stylesheet(".foo { color: red }", CONTAINER);
        let containment_at = sheet
            .find("contain: layout style paint")
            .expect("containment rules should be present");
        let rule_at = sheet
            .find(".foo")
            .expect("payload rule should be present");
        assert!(containment_at < rule_at);
    }
}
