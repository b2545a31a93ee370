/// Focus-aware key routing between the studio chrome and the embedded preview
/// app. A single focus flag plus handler-side gating replaces per-focus-change
/// listener churn: multiple generated apps can register handlers and only the
/// focused side ever sees an event.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    StudioFocused,
    PreviewFocused,
}

/// Studio chrome elements whose activation returns focus to the studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioControl {
    SendButton,
    ChatInput,
    SaveButton,
    ChatContainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
    KeyPress,
}

impl KeyEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::KeyPress => "keypress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub key: String,
}

impl KeyEvent {
    pub fn down(key: impl Into<String>) -> Self {
        Self {
            kind: KeyEventKind::KeyDown,
            key: key.into(),
        }
    }

    fn is_focus_return_key(&self) -> bool {
        self.kind == KeyEventKind::KeyDown && (self.key == "Escape" || self.key == "Tab")
    }
}

/// What the capturing-phase dispatch decided to do with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDecision {
    /// Studio focused, text input active: leave the event entirely alone.
    NativeTyping,
    /// Studio focused: Escape/Tab handled as a studio shortcut.
    StudioShortcut,
    /// Preview focused: delivered to handlers registered via `app.onKey`.
    DeliveredToPreview,
    /// Nobody wanted it.
    Ignored,
}

type KeyHandler = Box<dyn FnMut(&KeyEvent)>;

pub struct KeyRouter {
    state: FocusState,
    handlers: Vec<(KeyEventKind, KeyHandler)>,
}

impl KeyRouter {
    pub fn new() -> Self {
        Self {
            state: FocusState::StudioFocused,
            handlers: Vec::new(),
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    /// A click inside the registered preview container.
    pub fn click_preview(&mut self) {
        self.state = FocusState::PreviewFocused;
    }

    /// A click on any designated studio control.
    pub fn click_control(&mut self, _control: StudioControl) {
        self.state = FocusState::StudioFocused;
    }

    /// Registration point backing the preview's `app.onKey(eventType, handler)`.
    /// The focus gate lives here, not in the caller's handler.
    pub fn on_key(&mut self, kind: KeyEventKind, handler: impl FnMut(&KeyEvent) + 'static) {
        self.handlers.push((kind, Box::new(handler)));
    }

    /// Drops all preview handlers; called when a render replaces the preview.
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    /// The single document-level dispatch rule. `typing_in_text_input` mirrors
    /// "the active element is a text input/textarea/content-editable".
    pub fn dispatch(&mut self, event: &KeyEvent, typing_in_text_input: bool) -> KeyDecision {
        match self.state {
            FocusState::StudioFocused => {
                if typing_in_text_input {
                    return KeyDecision::NativeTyping;
                }
                if event.is_focus_return_key() {
                    return KeyDecision::StudioShortcut;
                }
                KeyDecision::Ignored
            }
            FocusState::PreviewFocused => {
                if event.is_focus_return_key() {
                    self.state = FocusState::StudioFocused;
                    return KeyDecision::StudioShortcut;
                }
                let mut delivered = false;
                for (kind, handler) in &mut self.handlers {
                    if *kind == event.kind {
                        handler(event);
                        delivered = true;
                    }
                }
                if delivered {
                    KeyDecision::DeliveredToPreview
                } else {
                    KeyDecision::Ignored
                }
            }
        }
    }
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::new()
    }
}
