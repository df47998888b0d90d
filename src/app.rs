use crate::chat::session::{ChatSession, SessionPhase};
use crate::chat::{ChatMessage, Sender};
use crate::event::{AppEvent, Dispatcher};
use crate::notify::{ToastLevel, Toasts};
use crate::project::form::ProjectForm;
use crate::project::{Project, ProjectRegistry};
use crate::theme::Theme;
use eframe::egui::{self, Align, Align2, Layout, RichText, ScrollArea, Sense};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

const TOAST_REPAINT: Duration = Duration::from_millis(250);

pub struct DashboardApp {
    rx: Receiver<AppEvent>,
    dispatcher: Dispatcher,
    reveal_tick: Duration,
    backend_label: String,
    theme: Theme,
    registry: ProjectRegistry,
    form: ProjectForm,
    create_panel_open: bool,
    session: Option<ChatSession>,
    open_project: Option<Uuid>,
    composer: String,
    toasts: Toasts,
}

impl DashboardApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        dispatcher: Dispatcher,
        reveal_tick: Duration,
        backend_label: String,
    ) -> Self {
        Self {
            rx,
            dispatcher,
            reveal_tick,
            backend_label,
            theme: Theme::default(),
            registry: ProjectRegistry::default(),
            form: ProjectForm::default(),
            create_panel_open: false,
            session: None,
            open_project: None,
            composer: String::new(),
            toasts: Toasts::default(),
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ProjectCreated { result } => {
                let created = self
                    .form
                    .on_created(result, &mut self.registry, &mut self.toasts);
                if created.is_some() {
                    self.create_panel_open = false;
                }
            }
            other => {
                let consumed = match self.session.as_mut() {
                    Some(session) => session.handle_event(other, &mut self.toasts),
                    None => false,
                };
                if !consumed {
                    debug!("dropping event for a closed chat session");
                }
            }
        }
    }

    fn open_chat(&mut self, project_id: Uuid) {
        let Some(project) = self.registry.get(project_id) else {
            return;
        };
        if self.session.is_some() && self.open_project == Some(project.id) {
            return;
        }

        self.session = Some(ChatSession::new(
            project.name.clone(),
            self.dispatcher.clone(),
            self.reveal_tick,
        ));
        self.open_project = Some(project.id);
        self.composer.clear();
    }

    fn close_chat(&mut self) {
        self.session = None;
        self.open_project = None;
        self.composer.clear();
    }

    fn submit_composer(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.submit_message(&self.composer) {
            Ok(()) => self.composer.clear(),
            Err(err) => debug!(%err, "message not sent"),
        }
    }

    fn open_create_panel(&mut self) {
        self.create_panel_open = true;
    }

    fn close_create_panel(&mut self) {
        if self.form.is_creating() {
            return;
        }
        self.form.reset();
        self.create_panel_open = false;
    }

    fn collect_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if dropped.is_empty() || self.form.is_creating() {
            return;
        }

        let offered = dropped.len();
        let added = self.form.add_paths(dropped);
        debug!(offered, added, "files dropped");
        self.open_create_panel();
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("DocChat");
                ui.separator();
                ui.label(RichText::new(&self.backend_label).color(self.theme.text_muted));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("+ Create Project").clicked() {
                        self.create_panel_open = true;
                    }
                });
            });
        });
    }

    fn render_dashboard(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(self.theme.spacing_8);
            ui.heading("Projects Dashboard");
            ui.add_space(self.theme.spacing_16);

            if self.registry.is_empty() {
                self.render_empty_state(ui);
                return;
            }

            let mut clicked_project: Option<Uuid> = None;
            ScrollArea::vertical()
                .id_salt("project_grid")
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing = egui::vec2(
                            self.theme.spacing_24,
                            self.theme.spacing_24,
                        );
                        for project in self.registry.projects() {
                            let response = self
                                .theme
                                .card_frame()
                                .show(ui, |ui| {
                                    ui.set_width(self.theme.card_width);
                                    ui.label(
                                        RichText::new(&project.name)
                                            .size(18.0)
                                            .strong()
                                            .color(self.theme.text_primary),
                                    );
                                    ui.label(
                                        RichText::new(project.file_count_label())
                                            .color(self.theme.text_muted),
                                    );
                                    ui.label(
                                        RichText::new(project.created_label())
                                            .size(12.0)
                                            .color(self.theme.text_muted),
                                    );
                                })
                                .response
                                .interact(Sense::click())
                                .on_hover_cursor(egui::CursorIcon::PointingHand)
                                .on_hover_text(file_names(project));
                            if response.clicked() {
                                clicked_project = Some(project.id);
                            }
                        }
                    });
                });

            if let Some(project_id) = clicked_project {
                self.open_chat(project_id);
            }
        });
    }

    fn render_empty_state(&mut self, ui: &mut egui::Ui) {
        let mut create = false;
        self.theme.card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.add_space(self.theme.spacing_24);
                ui.label(RichText::new("No Projects Yet").size(20.0).strong());
                ui.label(
                    RichText::new(
                        "Get started by creating your first project. Upload PDF or TXT files to begin analyzing your documents.",
                    )
                    .color(self.theme.text_muted),
                );
                ui.add_space(self.theme.spacing_12);
                if ui.button("+ Create Your First Project").clicked() {
                    create = true;
                }
                ui.add_space(self.theme.spacing_24);
            });
        });
        if create {
            self.open_create_panel();
        }
    }

    fn render_create_panel(&mut self, ctx: &egui::Context) {
        if !self.create_panel_open {
            return;
        }

        let creating = self.form.is_creating();
        let mut open = true;
        let mut cancel = false;
        let mut submit = false;
        let mut add_typed = false;
        let mut remove: Option<usize> = None;

        egui::Window::new("Create New Project")
            .anchor(Align2::RIGHT_TOP, [-16.0, 48.0])
            .collapsible(false)
            .resizable(false)
            .default_width(400.0)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.strong("Project Name");
                ui.add_enabled(
                    !creating,
                    egui::TextEdit::singleline(&mut self.form.name)
                        .desired_width(f32::INFINITY),
                );

                ui.add_space(self.theme.spacing_8);
                ui.strong("Upload Files (PDF/TXT)");
                self.theme.drop_zone_frame().show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("Drag and drop files onto the window").color(self.theme.text_muted));
                        ui.label(RichText::new("PDF or TXT files").size(12.0).color(self.theme.text_muted));
                    });
                });

                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        !creating,
                        egui::TextEdit::singleline(&mut self.form.path_input)
                            .desired_width(ui.available_width() - 70.0)
                            .hint_text("/path/to/document.pdf"),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        add_typed = true;
                    }
                    if ui.add_enabled(!creating, egui::Button::new("Add")).clicked() {
                        add_typed = true;
                    }
                });

                if !self.form.files().is_empty() {
                    ui.label(RichText::new("Selected files:").color(self.theme.text_muted));
                    ui.horizontal_wrapped(|ui| {
                        for (index, file) in self.form.files().iter().enumerate() {
                            ui.label(format!("{} ({})", file.name, file.media.label()));
                            if ui
                                .add_enabled(!creating, egui::Button::new("✕").small())
                                .clicked()
                            {
                                remove = Some(index);
                            }
                        }
                    });
                }

                ui.add_space(self.theme.spacing_12);
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    let label = if creating { "Creating..." } else { "Create" };
                    if ui.add_enabled(!creating, egui::Button::new(label)).clicked() {
                        submit = true;
                    }
                    if ui.add_enabled(!creating, egui::Button::new("Cancel")).clicked() {
                        cancel = true;
                    }
                    if creating {
                        ui.spinner();
                    }
                });
            });

        if add_typed && self.form.add_typed_path() == 0 {
            debug!("typed path was not an accepted file");
        }
        if let Some(index) = remove {
            self.form.remove_file(index);
        }
        if submit {
            if let Err(err) = self.form.create_project(&self.dispatcher, &mut self.toasts) {
                debug!(%err, "project not submitted");
            }
        }
        if cancel || !open {
            self.close_create_panel();
        }
    }

    fn render_chat_drawer(&mut self, ctx: &egui::Context) {
        if self.session.is_none() {
            return;
        }

        let mut close = false;
        let mut send = false;
        let mut stop = false;

        egui::SidePanel::right("chat_drawer")
            .resizable(true)
            .default_width(560.0)
            .min_width(380.0)
            .show(ctx, |ui| {
                let Some(session) = self.session.as_ref() else {
                    return;
                };

                ui.add_space(self.theme.spacing_8);
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.heading(session.project_id());
                        ui.label(RichText::new("AI Assistant").size(12.0).color(self.theme.text_muted));
                        ui.label("Chat with your project data and get insights");
                    });
                    ui.with_layout(Layout::right_to_left(Align::TOP), |ui| {
                        if ui.button("✕").clicked() {
                            close = true;
                        }
                    });
                });
                ui.separator();

                let transcript_height = (ui.available_height() - 70.0).max(120.0);
                ScrollArea::vertical()
                    .id_salt("chat_transcript")
                    .max_height(transcript_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for message in session.transcript() {
                            render_message(ui, &self.theme, message);
                        }

                        let phase = session.phase();
                        if phase != SessionPhase::Idle {
                            self.theme.bubble_frame(false).show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    ui.label(
                                        RichText::new("AI Assistant")
                                            .size(12.0)
                                            .color(self.theme.accent_primary),
                                    );
                                    ui.spinner();
                                    if phase == SessionPhase::Streaming
                                        && ui.small_button("■ Stop").clicked()
                                    {
                                        stop = true;
                                    }
                                });
                            });
                        }
                    });

                ui.separator();
                let busy = session.is_busy();
                self.theme.composer_frame().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let response = ui.add(
                            egui::TextEdit::singleline(&mut self.composer)
                                .desired_width(ui.available_width() - 70.0)
                                .hint_text("Ask about your project files..."),
                        );
                        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            send = true;
                        }

                        let can_send = !busy && !self.composer.trim().is_empty();
                        if ui.add_enabled(can_send, egui::Button::new("Send")).clicked() {
                            send = true;
                        }
                    });
                });
            });

        if stop {
            if let Some(session) = self.session.as_mut() {
                session.cancel_stream();
            }
        }
        if send {
            self.submit_composer();
        }
        if close {
            self.close_chat();
        }
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }

        let mut dismissed: Option<u64> = None;
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_TOP, [-16.0, 56.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in self.toasts.iter() {
                    let response = self
                        .theme
                        .toast_frame(toast.level)
                        .show(ui, |ui| {
                            ui.set_width(300.0);
                            match toast.level {
                                ToastLevel::Success => {
                                    ui.label(RichText::new("Success").strong().color(self.theme.success));
                                }
                                ToastLevel::Error(category) => {
                                    ui.label(RichText::new(category.title()).strong().color(self.theme.danger));
                                }
                            }
                            ui.label(toast.message.as_str());
                        })
                        .response
                        .interact(Sense::click());
                    if response.clicked() {
                        dismissed = Some(toast.id);
                    }
                }
            });

        if let Some(id) = dismissed {
            self.toasts.dismiss(id);
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        let session_busy = self.session.as_ref().is_some_and(ChatSession::is_busy);
        if session_busy || self.form.is_creating() {
            ctx.request_repaint_after(self.reveal_tick);
        } else if !self.toasts.is_empty() {
            ctx.request_repaint_after(TOAST_REPAINT);
        }
    }
}

fn file_names(project: &Project) -> String {
    project
        .files
        .iter()
        .map(|file| file.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_message(ui: &mut egui::Ui, theme: &Theme, message: &ChatMessage) {
    let from_user = message.sender == Sender::User;
    let layout = if from_user {
        Layout::right_to_left(Align::TOP)
    } else {
        Layout::left_to_right(Align::TOP)
    };

    ui.push_id(message.id, |ui| {
        ui.with_layout(layout, |ui| {
            let max_width = ui.available_width() * 0.8;
            theme.bubble_frame(from_user).show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.vertical(|ui| {
                    if !from_user {
                        ui.label(
                            RichText::new(message.sender_label())
                                .size(12.0)
                                .color(theme.accent_primary),
                        );
                    }
                    let text_color = if from_user {
                        theme.text_on_accent
                    } else {
                        theme.text_primary
                    };
                    ui.label(RichText::new(&message.text).color(text_color));
                    ui.label(
                        RichText::new(message.time_label())
                            .size(11.0)
                            .color(text_color.gamma_multiply(0.5)),
                    );
                });
            });
        });
    });
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.toasts.expire(Instant::now());
        self.collect_dropped_files(ctx);

        self.render_top_bar(ctx);
        self.render_chat_drawer(ctx);
        self.render_dashboard(ctx);
        self.render_create_panel(ctx);
        self.render_toasts(ctx);

        self.schedule_repaint(ctx);
    }
}
