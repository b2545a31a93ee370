#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Create,
    Edit,
}

impl RequestKind {
    pub fn is_edit(self) -> bool {
        matches!(self, Self::Edit)
    }
}

// Phrases that signal the user explicitly wants a fresh app even though one
// already exists. Tuned by trial; ambiguous phrasing like "can you also build
// an app that..." intentionally classifies as Create.
const NEW_APP_KEYWORDS: [&str; 12] = [
    "create a new",
    "make a new",
    "build a new",
    "new app",
    "different app",
    "another app",
    "start over",
    "from scratch",
    "create an app",
    "make an app",
    "build an app",
    "generate a new",
];

/// Conservative default-to-edit policy: once an app exists, every follow-up is
/// treated as a refinement unless the message unambiguously asks for a fresh one.
pub fn classify_request(message: &str, has_current_app: bool) -> RequestKind {
    if !has_current_app {
        return RequestKind::Create;
    }

    let lowered = message.to_lowercase();
    if NEW_APP_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        RequestKind::Create
    } else {
        RequestKind::Edit
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_request, RequestKind};

    #[test]
    fn no_current_app_always_classifies_as_create() {
        assert_eq!(
            classify_request("make the buttons bigger", false),
            RequestKind::Create
        );
        assert_eq!(classify_request("make a game", false), RequestKind::Create);
    }

    #[test]
    fn new_app_keyword_classifies_as_create_even_with_current_app() {
        assert_eq!(
            classify_request("Please start over with a timer instead", true),
            RequestKind::Create
        );
        assert_eq!(
            classify_request("build me a NEW APP for notes", true),
            RequestKind::Create
        );
        assert_eq!(
            classify_request("rebuild it from scratch", true),
            RequestKind::Create
        );
    }

    #[test]
    fn follow_up_without_keywords_classifies_as_edit() {
        assert_eq!(
            classify_request("make the buttons bigger", true),
            RequestKind::Edit
        );
        assert_eq!(
            classify_request("fix the score display", true),
            RequestKind::Edit
        );
    }

    #[test]
    fn ambiguous_build_an_app_phrasing_is_an_accepted_create() {
        // Documented heuristic limitation, preserved on purpose.
        assert_eq!(
            classify_request("can you also build an app that tracks habits", true),
            RequestKind::Create
        );
    }
}
