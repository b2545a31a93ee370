use crate::classify::{classify_request, RequestKind};
use crate::data_registry::{describe_registry, ApiRegistry, InMemoryApiRegistry, InMemoryDataRegistry};
use crate::diagnose::{build_diagnosis_prompt, interpret_diagnosis, DIAGNOSIS_FALLBACK_MESSAGE};
use crate::event::AppEvent;
use crate::host::{save_app, InMemoryHostShell};
use crate::images;
use crate::interpret::{interpret_reply, ReplyOutcome};
use crate::llm::{LlmPurpose, StudioLlm};
use crate::preview::keys::{FocusState, KeyRouter, StudioControl};
use crate::preview::{self, PreviewDocument};
use crate::prompt::{build_create_prompt, build_edit_prompt, EnvironmentContext};
use crate::session::{
    self, store, AppPayload, Role, SessionState, SuggestionSet,
};
use crate::system_apps;
use crate::theme::Theme;
use eframe::egui::{self, RichText, ScrollArea};
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};
use std::sync::mpsc::{Receiver, TryRecvError};

pub struct StudioApp {
    rx: Receiver<AppEvent>,
    llm: StudioLlm,
    llm_configured: bool,
    session: SessionState,
    host: InMemoryHostShell,
    data_registry: InMemoryDataRegistry,
    api_registry: InMemoryApiRegistry,
    suggestions: Option<SuggestionSet>,
    current_preview: Option<PreviewDocument>,
    key_router: KeyRouter,
    markdown_cache: CommonMarkCache,
    diagnostics_log: Vec<String>,
    alert: Option<String>,
    input_buffer: String,
    image_path_input: String,
    scroll_to_bottom: bool,
    theme: Theme,
}

impl StudioApp {
    pub fn new(rx: Receiver<AppEvent>, llm: StudioLlm, llm_configured: bool) -> Self {
        Self {
            rx,
            llm,
            llm_configured,
            session: SessionState::new(),
            host: InMemoryHostShell::new(),
            data_registry: InMemoryDataRegistry::new(),
            api_registry: InMemoryApiRegistry::new(),
            suggestions: None,
            current_preview: None,
            key_router: KeyRouter::new(),
            markdown_cache: CommonMarkCache::default(),
            diagnostics_log: Vec::new(),
            alert: None,
            input_buffer: String::new(),
            image_path_input: String::new(),
            scroll_to_bottom: false,
            theme: Theme::default(),
        }
    }

    pub fn data_registry_mut(&mut self) -> &mut InMemoryDataRegistry {
        &mut self.data_registry
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", session::timestamp(), message.into()));
    }

    fn environment(&self) -> EnvironmentContext {
        EnvironmentContext {
            theme_name: self.theme.name.to_string(),
            data_objects: describe_registry(&self.data_registry),
            api_descriptors: self.api_registry.prompt_info(),
        }
    }

    /// Entry point for every user request: typed messages, suggestion
    /// clicks, and system-app launches all come through here.
    fn submit_request(&mut self, message: String, ctx: &egui::Context) {
        if self.session.is_processing || message.trim().is_empty() {
            return;
        }
        if !self.llm_configured {
            self.session.push_assistant(
                "I can't reach the model right now: no API key is configured. \
Set APPSTUDIO_API_KEY and restart the studio.",
            );
            self.scroll_to_bottom = true;
            return;
        }

        let images = self.session.pending_images.drain();
        self.session.push_user(message.clone(), images.clone());
        self.suggestions = None;
        self.scroll_to_bottom = true;

        let kind = classify_request(&message, self.session.current_app.is_some());
        let env = self.environment();
        let prompt = match kind {
            RequestKind::Create => build_create_prompt(&message, &env),
            RequestKind::Edit => {
                match build_edit_prompt(&message, &env, self.session.current_app.as_ref()) {
                    Ok(prompt) => prompt,
                    Err(err) => {
                        self.log_diagnostic(format!("edit prompt failed: {err}"));
                        build_create_prompt(&message, &env)
                    }
                }
            }
        };

        self.session.is_processing = true;
        self.llm.send(
            prompt,
            images,
            LlmPurpose::Generate {
                kind,
                user_message: message,
            },
        );
        ctx.request_repaint();
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event, Some(ctx)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent, ctx: Option<&egui::Context>) {
        match event {
            AppEvent::LlmReply { purpose, reply } => match purpose {
                LlmPurpose::Generate { kind, .. } => {
                    match interpret_reply(&reply) {
                        ReplyOutcome::App(payload) => self.accept_app(payload, kind),
                        ReplyOutcome::Suggestions(set) => {
                            self.session.push_assistant(set.question.clone());
                            self.suggestions = Some(set);
                            self.session.is_processing = false;
                        }
                        ReplyOutcome::Text(text) => {
                            self.session.push_assistant(text);
                            self.session.is_processing = false;
                        }
                    }
                    self.scroll_to_bottom = true;
                }
                LlmPurpose::Diagnose { .. } => {
                    match interpret_diagnosis(&reply) {
                        Some(set) => {
                            self.session.push_assistant(set.question.clone());
                            self.suggestions = Some(set);
                        }
                        None => {
                            self.session.push_assistant(DIAGNOSIS_FALLBACK_MESSAGE);
                        }
                    }
                    self.session.is_processing = false;
                    self.scroll_to_bottom = true;
                }
            },
            AppEvent::LlmFailed { purpose, message } => match purpose {
                LlmPurpose::Generate { user_message, .. } => {
                    // Generation failures get one diagnosis round trip before
                    // anything is shown; processing stays on until it lands.
                    self.log_diagnostic(format!("generation failed: {message}"));
                    let prompt = build_diagnosis_prompt(
                        &message,
                        &user_message,
                        self.session.current_app.as_ref(),
                    );
                    self.llm.send(
                        prompt,
                        Vec::new(),
                        LlmPurpose::Diagnose {
                            original_request: user_message,
                        },
                    );
                }
                LlmPurpose::Diagnose { .. } => {
                    self.log_diagnostic(format!("diagnosis failed: {message}"));
                    self.session.push_assistant(DIAGNOSIS_FALLBACK_MESSAGE);
                    self.session.is_processing = false;
                    self.scroll_to_bottom = true;
                }
            },
        }

        if let Some(ctx) = ctx {
            ctx.request_repaint();
        }
    }

    fn accept_app(&mut self, payload: AppPayload, kind: RequestKind) {
        let summary = match kind {
            RequestKind::Create => format!(
                "Great! I've created a {} app for you. You can see it in the preview \
panel. Feel free to ask for any changes or improvements!",
                payload.title
            ),
            RequestKind::Edit => {
                let mut text = format!("Perfect! I've updated your {} app.", payload.title);
                if let Some(description) = &payload.description {
                    text.push_str(&format!("\n\n**Modifications made:** {description}"));
                }
                text
            }
        };

        self.session.accept_app(payload, kind);
        let document = self
            .session
            .current_app
            .as_ref()
            .map(|app| preview::render(app, session::timestamp_millis()));
        self.current_preview = document;
        self.key_router.clear_handlers();
        self.key_router.click_control(StudioControl::ChatContainer);
        self.session.push_assistant(summary);
        self.session.is_processing = false;
    }

    fn attach_image_from_path_input(&mut self) {
        let path_text = self.image_path_input.trim().to_string();
        if path_text.is_empty() {
            return;
        }
        match images::attachment_from_path(std::path::Path::new(&path_text)) {
            Ok(attachment) => {
                self.session.pending_images.push(attachment);
                self.image_path_input.clear();
            }
            Err(err) => self.alert = Some(err.to_string()),
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|input| input.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = file.path {
                match images::attachment_from_path(&path) {
                    Ok(attachment) => self.session.pending_images.push(attachment),
                    Err(err) => self.log_diagnostic(format!("dropped file rejected: {err}")),
                }
            }
        }
    }

    /// Pasting a path to an image file attaches it, the desktop analogue of
    /// pasting an image into the composer.
    fn handle_pasted_paths(&mut self, ctx: &egui::Context) {
        let pasted: Vec<String> = ctx.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Paste(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        });
        for text in pasted {
            let path = std::path::Path::new(text.trim());
            if path.is_file() {
                if let Ok(attachment) = images::attachment_from_path(path) {
                    self.session.pending_images.push(attachment);
                }
            }
        }
    }

    fn save_current_app(&mut self) {
        match save_app(&mut self.host, &mut self.session) {
            Ok(report) => {
                let verb = if report.updated { "updated" } else { "saved" };
                self.alert = Some(format!("\"{}\" {verb} in AI-OS.", report.title));
            }
            Err(err) => self.alert = Some(err.to_string()),
        }
    }

    fn export_current_app(&mut self) {
        let Some(app) = self.session.current_app.clone() else {
            self.alert = Some("Nothing to export yet.".to_string());
            return;
        };
        match store::write_export(&app) {
            Ok(path) => self.alert = Some(format!("Exported to {}", path.display())),
            Err(err) => self.alert = Some(format!("Export failed: {err}")),
        }
    }

    fn test_current_app(&mut self) {
        let Some(app) = self.session.current_app.clone() else {
            self.alert = Some("Nothing to test yet.".to_string());
            return;
        };
        match store::write_test_document(&app) {
            Ok(path) => {
                if let Err(err) = open::that(&path) {
                    self.alert = Some(format!("Failed to open browser: {err}"));
                } else {
                    self.log_diagnostic(format!("test document opened: {}", path.display()));
                }
            }
            Err(err) => self.alert = Some(format!("Test document failed: {err}")),
        }
    }

    fn open_preview_in_browser(&mut self) {
        let Some(document) = &self.current_preview else {
            return;
        };
        let path = std::env::temp_dir().join(format!("{}.html", document.container_id));
        match std::fs::write(&path, document.standalone_document()) {
            Ok(()) => {
                if let Err(err) = open::that(&path) {
                    self.alert = Some(format!("Failed to open browser: {err}"));
                }
            }
            Err(err) => self.alert = Some(format!("Preview write failed: {err}")),
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let has_app = self.session.current_app.is_some();
        let mut save = false;
        let mut export = false;
        let mut test = false;
        let mut clear = false;

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("App Development Studio");
                ui.separator();
                if self.session.is_processing {
                    ui.spinner();
                    ui.label(RichText::new("Generating...").color(self.theme.text_muted));
                } else if self.llm_configured {
                    ui.label(RichText::new("Ready").color(self.theme.success));
                } else {
                    ui.label(RichText::new("No API key").color(self.theme.danger));
                }
                ui.separator();
                save = ui.add_enabled(has_app, egui::Button::new("Save to AI-OS")).clicked();
                export = ui.add_enabled(has_app, egui::Button::new("Export")).clicked();
                test = ui.add_enabled(has_app, egui::Button::new("Test in Browser")).clicked();
                clear = ui.button("Clear Chat").clicked();
            });
        });

        if save {
            self.key_router.click_control(StudioControl::SaveButton);
            self.save_current_app();
        }
        if export {
            self.export_current_app();
        }
        if test {
            self.test_current_app();
        }
        if clear {
            self.session.clear_chat();
            self.suggestions = None;
            self.scroll_to_bottom = true;
        }
    }

    fn render_left_panel(&mut self, ctx: &egui::Context) {
        let mut launch: Option<&'static str> = None;
        egui::SidePanel::left("system_apps_panel")
            .resizable(true)
            .show(ctx, |ui| {
                ui.heading("System Apps");
                ui.separator();
                for definition in system_apps::system_apps() {
                    let label = format!("{} {}", definition.icon, definition.name);
                    if ui
                        .add_enabled(!self.session.is_processing, egui::Button::new(label))
                        .clicked()
                    {
                        launch = Some(definition.name);
                    }
                }

                ui.separator();
                ui.strong("Shared Data");
                let descriptors = describe_registry(&self.data_registry);
                if descriptors.is_empty() {
                    ui.label(RichText::new("No data registered").color(self.theme.text_muted));
                } else {
                    for descriptor in descriptors {
                        ui.label(descriptor.prompt_line());
                    }
                }
            });

        if let Some(name) = launch {
            if let Some(definition) = system_apps::find_system_app(name) {
                self.submit_request(definition.prompt.to_string(), ctx);
            }
        }
    }

    fn render_preview_panel(&mut self, ctx: &egui::Context) {
        let mut open_preview = false;
        let mut clicked_preview = false;

        egui::SidePanel::right("preview_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Preview");
                ui.separator();

                match &self.current_preview {
                    Some(document) => {
                        let frame = self.theme.card_frame();
                        let response = frame
                            .show(ui, |ui| {
                                ui.label(
                                    RichText::new(format!("{} {}", document.icon, document.title))
                                        .strong(),
                                );
                                if let Some(description) = &document.description {
                                    ui.label(RichText::new(description).color(self.theme.text_muted));
                                }
                                ui.label(
                                    RichText::new(format!("sandbox: {}", document.container_id))
                                        .color(self.theme.text_muted)
                                        .small(),
                                );
                            })
                            .response;
                        clicked_preview = response.interact(egui::Sense::click()).clicked();

                        open_preview = ui.button("Open sandboxed preview").clicked();

                        let focus_label = match self.key_router.state() {
                            FocusState::PreviewFocused => {
                                RichText::new("App focused (Esc/Tab returns to chat)")
                                    .color(self.theme.preview_focus_ring)
                            }
                            FocusState::StudioFocused => {
                                RichText::new("Click the app card to route keys to it")
                                    .color(self.theme.text_muted)
                            }
                        };
                        ui.label(focus_label);
                    }
                    None => {
                        ui.label(
                            RichText::new("Describe an app in the chat to see it here.")
                                .color(self.theme.text_muted),
                        );
                    }
                }
            });

        if clicked_preview {
            self.key_router.click_preview();
        }
        if open_preview {
            self.open_preview_in_browser();
        }
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        let mut send_now = false;
        let mut attach_now = false;
        let mut remove_image: Option<usize> = None;
        let mut picked_suggestion: Option<String> = None;
        let mut dismiss_alert = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Chat");
            ui.separator();

            if let Some(alert) = &self.alert {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(alert).color(self.theme.accent_primary));
                    dismiss_alert = ui.small_button("x").clicked();
                });
                ui.separator();
            }

            let transcript_height = (ui.available_height() - 190.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for message in &self.session.chat_history {
                        match message.role {
                            Role::User => {
                                let mut text = format!("[You] {}", message.text);
                                if !message.images.is_empty() {
                                    text.push_str(&format!(
                                        " ({} image{})",
                                        message.images.len(),
                                        if message.images.len() == 1 { "" } else { "s" }
                                    ));
                                }
                                self.theme
                                    .bubble_frame(self.theme.user_bubble)
                                    .show(ui, |ui| {
                                        ui.label(text);
                                    });
                            }
                            Role::Assistant => {
                                self.theme
                                    .bubble_frame(self.theme.assistant_bubble)
                                    .show(ui, |ui| {
                                        CommonMarkViewer::new().show(
                                            ui,
                                            &mut self.markdown_cache,
                                            &message.text,
                                        );
                                    });
                            }
                        }
                    }

                    if self.scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
            self.scroll_to_bottom = false;

            if let Some(set) = &self.suggestions {
                ui.separator();
                for option in set.panel_options() {
                    let button = egui::Button::new(&option.label);
                    if ui.add_enabled(!self.session.is_processing, button).clicked() {
                        picked_suggestion = Some(option.label.clone());
                    }
                    if let Some(description) = &option.description {
                        ui.label(RichText::new(description).color(self.theme.text_muted).small());
                    }
                }
            }

            ui.separator();
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("diagnostics_log")
                        .max_height(90.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for entry in &self.diagnostics_log {
                                ui.label(entry);
                            }
                        });
                });

            ui.separator();
            if !self.session.pending_images.is_empty() {
                ui.horizontal_wrapped(|ui| {
                    for (index, attachment) in
                        self.session.pending_images.items().iter().enumerate()
                    {
                        ui.label(&attachment.file_name);
                        if ui.small_button("x").clicked() {
                            remove_image = Some(index);
                        }
                    }
                });
            }

            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.image_path_input)
                        .desired_width(220.0)
                        .hint_text("Attach image by path..."),
                );
                attach_now = ui.button("Attach").clicked();
            });

            let input_enabled = !self.session.is_processing;
            let hint = if self.session.is_processing {
                "Waiting for response..."
            } else {
                "Describe the app you want..."
            };

            let composer = self.theme.composer_frame();
            composer.show(ui, |ui| {
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        input_enabled,
                        egui::TextEdit::singleline(&mut self.input_buffer)
                            .desired_width(f32::INFINITY)
                            .hint_text(hint),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        send_now = true;
                    }

                    let clicked = ui
                        .add_enabled(
                            input_enabled && !self.input_buffer.trim().is_empty(),
                            egui::Button::new("Send")
                                .stroke(self.theme.subtle_button_stroke())
                                .min_size(egui::vec2(72.0, self.theme.button_height)),
                        )
                        .clicked();
                    send_now |= clicked;
                });
            });
        });

        if dismiss_alert {
            self.alert = None;
        }
        if let Some(index) = remove_image {
            self.session.pending_images.remove(index);
        }
        if attach_now {
            self.attach_image_from_path_input();
        }
        if let Some(label) = picked_suggestion {
            self.suggestions = None;
            self.submit_request(label, ctx);
        }
        if send_now && !self.session.is_processing {
            self.key_router.click_control(StudioControl::SendButton);
            let message = std::mem::take(&mut self.input_buffer);
            self.submit_request(message, ctx);
        }
    }

    fn route_focus_keys(&mut self, ctx: &egui::Context) {
        let escape = ctx.input(|input| input.key_pressed(egui::Key::Escape));
        let tab = ctx.input(|input| input.key_pressed(egui::Key::Tab));
        if !(escape || tab) {
            return;
        }
        let typing = ctx.memory(|memory| memory.focused().is_some());
        let key = if escape { "Escape" } else { "Tab" };
        self.key_router
            .dispatch(&crate::preview::keys::KeyEvent::down(key), typing);
    }
}


impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_visuals(ctx);
        self.drain_events(ctx);
        self.handle_dropped_files(ctx);
        self.handle_pasted_paths(ctx);
        self.route_focus_keys(ctx);
        self.render_top_bar(ctx);
        self.render_left_panel(ctx);
        self.render_preview_panel(ctx);
        self.render_center_panel(ctx);
    }
}
