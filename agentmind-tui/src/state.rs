//! Application state and view state definitions.

use crate::config::TuiConfig;
use crate::keys::{Action, InputMode};
use crate::nav::View;
use crate::notifications::{Notification, NotificationLevel};
use crate::theme::SynthBruteTheme;
use agentmind_client::{
    AgentTransport, EventReceiver, KeyValueStore, ReplyStatus, SessionEvent, SettingsStore,
    Session, SpeechEvent, SpeechRecognizer, SpeechSink,
};
use agentmind_core::{AgentSettings, ChatMessage, FieldDraft, FieldId, MessageId, SchemaEditor};
use chrono::Utc;
use std::sync::Arc;

/// Settings persisted through whichever store the binary was started with.
pub type AppSettings = SettingsStore<Box<dyn KeyValueStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthState {
    #[default]
    Unknown,
    Ready,
    Unavailable,
}

impl HealthState {
    pub fn label(&self) -> &'static str {
        match self {
            HealthState::Unknown => "Backend: checking",
            HealthState::Ready => "Backend: ready",
            HealthState::Unavailable => "Backend: unavailable",
        }
    }
}

pub struct App {
    pub config: TuiConfig,
    pub theme: SynthBruteTheme,
    pub session: Session,
    pub settings: AppSettings,
    pub active_view: View,

    pub chat_view: ChatViewState,
    pub analysis_view: AnalysisViewState,
    pub settings_view: SettingsViewState,

    pub notifications: Vec<Notification>,
    pub health: HealthState,
    pub listening: bool,

    speech: Box<dyn SpeechRecognizer>,
    speech_sink: SpeechSink,
}

impl App {
    /// Build the app around a fresh session using the stored settings.
    ///
    /// Nothing is requested until [`App::start`].
    pub fn new(
        config: TuiConfig,
        transport: Arc<dyn AgentTransport>,
        settings: AppSettings,
        speech: Box<dyn SpeechRecognizer>,
        speech_sink: SpeechSink,
    ) -> (Self, EventReceiver) {
        let (session, events) = Session::new(transport, settings.current().clone());
        let settings_view = SettingsViewState::from_settings(settings.current());
        let app = Self {
            config,
            theme: SynthBruteTheme::synthbrute(),
            session,
            settings,
            active_view: View::Chat,
            chat_view: ChatViewState::default(),
            analysis_view: AnalysisViewState::default(),
            settings_view,
            notifications: Vec::new(),
            health: HealthState::Unknown,
            listening: false,
            speech,
            speech_sink,
        };
        (app, events)
    }

    pub fn start(&mut self) {
        self.session.start();
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    /// Drop notifications that no longer show in the footer.
    pub fn on_tick(&mut self) {
        let now = Utc::now();
        self.notifications.retain(|note| !note.is_expired(now));
    }

    pub fn input_mode(&self) -> InputMode {
        match self.active_view {
            View::Chat => InputMode::Text,
            View::Settings if self.settings_view.is_editing() => InputMode::Text,
            View::Analysis | View::Settings => InputMode::Command,
        }
    }

    pub fn voice_supported(&self) -> bool {
        self.speech.is_supported()
    }

    /// Returns `true` when the app should exit.
    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextView => self.active_view = self.active_view.next(),
            Action::PrevView => self.active_view = self.active_view.previous(),
            Action::SwitchView(index) => {
                if let Some(view) = View::from_index(index) {
                    self.active_view = view;
                }
            }
            Action::ToggleVoice => self.toggle_voice(),
            other => match self.active_view {
                View::Chat => self.handle_chat_action(other),
                View::Analysis => self.handle_analysis_action(other),
                View::Settings => self.handle_settings_action(other),
            },
        }
        false
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) {
        if let SessionEvent::ReplyFinished {
            status: ReplyStatus::Failed,
            ..
        } = &event
        {
            self.notify(NotificationLevel::Error, "Reply request failed");
        }
        self.session.apply(event);
    }

    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Started => self.listening = true,
            SpeechEvent::Transcript(text) => self.chat_view.input = text,
            SpeechEvent::Ended => self.listening = false,
            SpeechEvent::Error(reason) => {
                self.listening = false;
                self.notify(
                    NotificationLevel::Warning,
                    format!("Voice input failed: {}", reason),
                );
            }
        }
    }

    pub fn handle_health(&mut self, ready: bool) {
        let next = if ready {
            HealthState::Ready
        } else {
            HealthState::Unavailable
        };
        match (self.health, next) {
            (HealthState::Unavailable, HealthState::Ready) => {
                self.notify(NotificationLevel::Success, "Backend is ready")
            }
            (HealthState::Unknown | HealthState::Ready, HealthState::Unavailable) => {
                self.notify(NotificationLevel::Warning, "Backend is not ready")
            }
            _ => {}
        }
        self.health = next;
    }

    /// Stop listening and cancel every outstanding request.
    pub fn shutdown(&mut self) {
        self.speech.stop();
        self.session.shutdown();
    }

    fn toggle_voice(&mut self) {
        if !self.speech.is_supported() {
            self.notify(NotificationLevel::Warning, "Voice input is not configured");
            return;
        }
        if self.speech.is_listening() {
            self.speech.stop();
            return;
        }
        if self.session.is_replying() {
            return;
        }
        if let Err(err) = self.speech.start(self.speech_sink.clone()) {
            self.notify(NotificationLevel::Error, err.to_string());
        }
    }

    // ------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------

    fn handle_chat_action(&mut self, action: Action) {
        match action {
            Action::Insert(c) if !self.listening => self.chat_view.input.push(c),
            Action::Backspace => {
                self.chat_view.input.pop();
            }
            Action::Submit => self.submit_chat(),
            Action::Cancel => self.chat_view.input.clear(),
            Action::NextField => self.active_view = self.active_view.next(),
            Action::PrevField => self.active_view = self.active_view.previous(),
            _ => {}
        }
    }

    fn submit_chat(&mut self) {
        if self.listening {
            return;
        }
        if self.session.is_replying() {
            if !self.chat_view.input.trim().is_empty() {
                self.notify(NotificationLevel::Info, "Waiting for the agent to reply");
            }
            return;
        }
        if self.session.send(&self.chat_view.input).is_some() {
            self.chat_view.input.clear();
        }
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    fn handle_analysis_action(&mut self, action: Action) {
        let ids: Vec<MessageId> = self.session.log().analyzed().map(|m| m.id).collect();
        match action {
            Action::MoveDown => select_next_id(&ids, &mut self.analysis_view.selected),
            Action::MoveUp => select_prev_id(&ids, &mut self.analysis_view.selected),
            _ => {}
        }
    }

    /// The analyzed message shown in the detail pane.
    pub fn selected_analysis(&self) -> Option<&ChatMessage> {
        let mut analyzed = self.session.log().analyzed();
        match self.analysis_view.selected {
            Some(id) => analyzed.find(|m| m.id == id),
            None => analyzed.next(),
        }
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    fn handle_settings_action(&mut self, action: Action) {
        if self.settings_view.form.is_some() {
            self.handle_form_action(action);
        } else if self.settings_view.prompt_editor.is_some() {
            self.handle_prompt_action(action);
        } else {
            self.handle_field_list_action(action);
        }
    }

    fn handle_field_list_action(&mut self, action: Action) {
        let view = &mut self.settings_view;
        let ids: Vec<FieldId> = view.editor.fields().iter().map(|f| f.id).collect();
        match action {
            Action::MoveDown => select_next_id(&ids, &mut view.selected),
            Action::MoveUp => select_prev_id(&ids, &mut view.selected),
            Action::AddField => view.form = Some(FieldForm::new(None, FieldDraft::default())),
            Action::EditField => {
                if let Some(field) = view.selected_field() {
                    view.form = Some(FieldForm::new(Some(field.id), FieldDraft::from(field)));
                }
            }
            Action::DeleteField => {
                if let Some(id) = view.selected {
                    let index = ids.iter().position(|f| *f == id).unwrap_or(0);
                    if view.editor.remove_field(id) {
                        view.dirty = true;
                        let remaining = view.editor.fields();
                        view.selected = remaining
                            .get(index.min(remaining.len().saturating_sub(1)))
                            .map(|f| f.id);
                    }
                }
            }
            Action::EditPrompt => {
                view.prompt_editor = Some(view.editor.base_prompt().to_string());
            }
            Action::Save => self.save_settings(),
            Action::Reset => self.reset_settings(),
            Action::Cancel => self.discard_settings(),
            _ => {}
        }
    }

    fn handle_form_action(&mut self, action: Action) {
        let Some(form) = self.settings_view.form.as_mut() else {
            return;
        };
        match action {
            Action::Insert(c) => form.insert(c),
            Action::Backspace => form.backspace(),
            Action::NextField => form.focus = form.focus.next(),
            Action::PrevField => form.focus = form.focus.previous(),
            Action::Cancel => self.settings_view.form = None,
            Action::Submit => self.commit_form(),
            _ => {}
        }
    }

    fn commit_form(&mut self) {
        let view = &mut self.settings_view;
        let Some(form) = view.form.take() else {
            return;
        };
        let result = match form.target {
            None => view.editor.add_field(form.draft.clone()),
            Some(id) => view.editor.update_field(id, form.draft.clone()).map(|()| id),
        };
        match result {
            Ok(id) => {
                view.selected = Some(id);
                view.dirty = true;
            }
            Err(err) => {
                view.form = Some(form);
                self.notify(NotificationLevel::Error, err.to_string());
            }
        }
    }

    fn handle_prompt_action(&mut self, action: Action) {
        let view = &mut self.settings_view;
        let Some(buffer) = view.prompt_editor.as_mut() else {
            return;
        };
        match action {
            Action::Insert(c) => buffer.push(c),
            Action::Newline => buffer.push('\n'),
            Action::Backspace => {
                buffer.pop();
            }
            Action::Submit => {
                if let Some(prompt) = view.prompt_editor.take() {
                    view.editor.set_base_prompt(prompt);
                    view.dirty = true;
                }
            }
            Action::Cancel => view.prompt_editor = None,
            _ => {}
        }
    }

    fn save_settings(&mut self) {
        let next = match self.settings_view.editor.to_settings() {
            Ok(next) => next,
            Err(err) => {
                self.notify(NotificationLevel::Error, err.to_string());
                return;
            }
        };
        match self.settings.save(next.clone()) {
            Ok(()) => {
                self.session.update_settings(next);
                self.settings_view.dirty = false;
                self.notify(NotificationLevel::Success, "Settings saved");
            }
            Err(err) => self.notify(NotificationLevel::Error, err.to_string()),
        }
    }

    fn reset_settings(&mut self) {
        let defaults = self.settings.reset();
        self.settings_view = SettingsViewState::from_settings(&defaults);
        self.session.update_settings(defaults);
        self.notify(NotificationLevel::Info, "Settings reset to defaults");
    }

    fn discard_settings(&mut self) {
        if !self.settings_view.dirty {
            return;
        }
        self.settings_view = SettingsViewState::from_settings(self.settings.current());
        self.notify(NotificationLevel::Info, "Unsaved changes discarded");
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatViewState {
    pub input: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisViewState {
    pub selected: Option<MessageId>,
}

#[derive(Debug, Clone)]
pub struct SettingsViewState {
    pub editor: SchemaEditor,
    pub selected: Option<FieldId>,
    pub form: Option<FieldForm>,
    pub prompt_editor: Option<String>,
    /// Edits not yet saved.
    pub dirty: bool,
}

impl SettingsViewState {
    pub fn from_settings(settings: &AgentSettings) -> Self {
        let editor = SchemaEditor::from_settings(settings);
        let selected = editor.fields().first().map(|f| f.id);
        Self {
            editor,
            selected,
            form: None,
            prompt_editor: None,
            dirty: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.form.is_some() || self.prompt_editor.is_some()
    }

    pub fn selected_field(&self) -> Option<&agentmind_core::SchemaField> {
        self.selected.and_then(|id| self.editor.field(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Type,
    Description,
    EnumValues,
    Required,
}

impl FormField {
    pub fn all() -> &'static [FormField] {
        &[
            FormField::Name,
            FormField::Type,
            FormField::Description,
            FormField::EnumValues,
            FormField::Required,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Type => "Type",
            FormField::Description => "Description",
            FormField::EnumValues => "Enum values",
            FormField::Required => "Required",
        }
    }

    pub fn next(&self) -> FormField {
        let all = Self::all();
        let idx = all.iter().position(|f| f == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn previous(&self) -> FormField {
        let all = Self::all();
        let idx = all.iter().position(|f| f == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

/// Add/edit overlay for one schema field.
#[derive(Debug, Clone)]
pub struct FieldForm {
    /// `None` adds a new field.
    pub target: Option<FieldId>,
    pub draft: FieldDraft,
    pub focus: FormField,
}

impl FieldForm {
    pub fn new(target: Option<FieldId>, draft: FieldDraft) -> Self {
        Self {
            target,
            draft,
            focus: FormField::Name,
        }
    }

    /// Text fields take the character; space cycles the type and toggles
    /// the required flag.
    pub fn insert(&mut self, c: char) {
        match self.focus {
            FormField::Name => self.draft.name.push(c),
            FormField::Description => self.draft.description.push(c),
            FormField::EnumValues => self.draft.enum_values.push(c),
            FormField::Type if c == ' ' => self.draft.field_type = self.draft.field_type.next(),
            FormField::Required if c == ' ' => self.draft.required = !self.draft.required,
            FormField::Type | FormField::Required => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Name => {
                self.draft.name.pop();
            }
            FormField::Description => {
                self.draft.description.pop();
            }
            FormField::EnumValues => {
                self.draft.enum_values.pop();
            }
            FormField::Type | FormField::Required => {}
        }
    }
}

fn select_next_id<Id: Copy + PartialEq>(ids: &[Id], selected: &mut Option<Id>) {
    if ids.is_empty() {
        *selected = None;
        return;
    }
    let next = match selected.and_then(|id| ids.iter().position(|item| *item == id)) {
        Some(index) => (index + 1) % ids.len(),
        None => 0,
    };
    *selected = Some(ids[next]);
}

fn select_prev_id<Id: Copy + PartialEq>(ids: &[Id], selected: &mut Option<Id>) {
    if ids.is_empty() {
        *selected = None;
        return;
    }
    let index = selected
        .and_then(|id| ids.iter().position(|item| *item == id))
        .unwrap_or(0);
    let prev = if index == 0 { ids.len() - 1 } else { index - 1 };
    *selected = Some(ids[prev]);
}
