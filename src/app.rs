use crate::{
    config::{AppConfig, ThemeKind},
    error::TrackerError,
    persistence,
    store::{MountFields, MountStore},
};
use anyhow::Result;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const LOG_CAPACITY: usize = 200;
const TOAST_SHORT: Duration = Duration::from_secs(2);
const TOAST_LONG: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddStep {
    Mount,
    Raid,
    Difficulty,
    Size,
}

impl AddStep {
    pub fn prompt(self) -> &'static str {
        match self {
            AddStep::Mount => "Mount name",
            AddStep::Raid => "Raid name",
            AddStep::Difficulty => "Difficulty (Normal, Heroic, Mythic)",
            AddStep::Size => "Raid size (10-man, 25-man, N/A)",
        }
    }

    pub fn position(self) -> usize {
        match self {
            AddStep::Mount => 1,
            AddStep::Raid => 2,
            AddStep::Difficulty => 3,
            AddStep::Size => 4,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            AddStep::Mount => Some(AddStep::Raid),
            AddStep::Raid => Some(AddStep::Difficulty),
            AddStep::Difficulty => Some(AddStep::Size),
            AddStep::Size => None,
        }
    }

    fn store(self, draft: &mut MountFields, value: String) {
        match self {
            AddStep::Mount => draft.mount = value,
            AddStep::Raid => draft.raid = value,
            AddStep::Difficulty => draft.difficulty = value,
            AddStep::Size => draft.size = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing {
        step: AddStep,
        buffer: String,
        draft: MountFields,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogChoice {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub enum DialogKind {
    RemoveMount { index: usize },
    QuitUnsaved,
}

#[derive(Debug, Clone)]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub yes_label: String,
    pub no_label: String,
    pub choice: DialogChoice,
    pub kind: DialogKind,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: OffsetDateTime,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

pub struct App {
    pub config: AppConfig,
    pub store: MountStore,
    pub mounts_path: PathBuf,
    pub status: String,
    pub selected: usize,
    pub input_mode: InputMode,
    pub dialog: Option<Dialog>,
    pub logs: Vec<LogEntry>,
    pub log_scroll: usize,
    pub toast: Option<Toast>,
    pub should_quit: bool,
    log_path: PathBuf,
}

impl App {
    pub fn initialize(mounts_override: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load_or_create()?;
        let mounts_path = config.mounts_path(mounts_override);
        let mut app = Self::with_config(config, mounts_path);
        app.load_mounts();
        Ok(app)
    }

    /// Builds an app around an empty store without touching the mounts file.
    pub fn with_config(config: AppConfig, mounts_path: PathBuf) -> Self {
        let log_path = config.log_path();
        Self {
            config,
            store: MountStore::new(),
            mounts_path,
            status: "Ready".to_string(),
            selected: 0,
            input_mode: InputMode::Normal,
            dialog: None,
            logs: Vec::new(),
            log_scroll: 0,
            toast: None,
            should_quit: false,
            log_path,
        }
    }

    pub fn theme(&self) -> ThemeKind {
        self.config.theme
    }

    pub fn tick(&mut self) {
        if let Some(toast) = &self.toast {
            if toast.expires_at <= Instant::now() {
                self.toast = None;
            }
        }
    }

    pub fn hint(&self) -> &'static str {
        "a add | o obtained | x remove | r reset | t theme | s save | l load | q quit"
    }

    pub fn selected_index(&self) -> Result<usize, TrackerError> {
        if self.store.is_empty() {
            return Err(TrackerError::NoSelection);
        }
        Ok(self.selected.min(self.store.len() - 1))
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.selected = self.selected.saturating_add(1);
        self.clamp_selection();
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.store.len().saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let len = self.store.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn enter_add_mode(&mut self) {
        self.input_mode = InputMode::Editing {
            step: AddStep::Mount,
            buffer: String::new(),
            draft: MountFields::default(),
        };
    }

    pub fn input_push(&mut self, ch: char) {
        if let InputMode::Editing { buffer, .. } = &mut self.input_mode {
            buffer.push(ch);
        }
    }

    pub fn input_pop(&mut self) {
        if let InputMode::Editing { buffer, .. } = &mut self.input_mode {
            buffer.pop();
        }
    }

    /// Accepts the current prompt. An empty answer abandons the add.
    pub fn submit_input(&mut self) -> Result<(), TrackerError> {
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
        let InputMode::Editing {
            step,
            buffer,
            mut draft,
        } = mode
        else {
            return Ok(());
        };

        if buffer.is_empty() {
            self.cancel_add();
            return Ok(());
        }
        step.store(&mut draft, buffer);

        match step.next() {
            Some(next) => {
                self.input_mode = InputMode::Editing {
                    step: next,
                    buffer: String::new(),
                    draft,
                };
                Ok(())
            }
            None => {
                let label = self.store.add(&draft)?.label().to_string();
                self.selected = self.store.len() - 1;
                self.status = format!("Added {label}");
                self.log_info(format!("Added: {label}"));
                Ok(())
            }
        }
    }

    pub fn cancel_input(&mut self) {
        if matches!(self.input_mode, InputMode::Editing { .. }) {
            self.input_mode = InputMode::Normal;
            self.cancel_add();
        }
    }

    fn cancel_add(&mut self) {
        self.status = "Add mount cancelled".to_string();
        self.set_toast("Add mount cancelled", ToastLevel::Warn, TOAST_SHORT);
    }

    /// Removes the selection, asking first when the config says so.
    pub fn request_remove(&mut self) -> Result<(), TrackerError> {
        let index = self.selected_index()?;
        if !self.config.confirm_remove {
            return self.remove_at(index);
        }
        let label = self
            .store
            .get(index)
            .map(|entry| entry.label().to_string())
            .unwrap_or_default();
        self.open_dialog(Dialog {
            title: "Remove mount".to_string(),
            message: format!("Remove \"{label}\" from the list?"),
            yes_label: "Remove".to_string(),
            no_label: "Keep".to_string(),
            choice: DialogChoice::No,
            kind: DialogKind::RemoveMount { index },
        });
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<(), TrackerError> {
        let removed = self.store.remove(index)?;
        self.clamp_selection();
        self.status = format!("Removed {}", removed.base_label());
        self.log_info(format!("Removed: {}", removed.label()));
        Ok(())
    }

    pub fn mark_selected_obtained(&mut self) -> Result<(), TrackerError> {
        let index = self.selected_index()?;
        let was_obtained = self.store.get(index).is_some_and(|entry| entry.obtained());
        let label = self.store.mark_obtained(index)?.base_label();
        if was_obtained {
            self.status = format!("Already obtained: {label}");
        } else {
            self.status = format!("Obtained {label}");
            self.log_info(format!("Obtained: {label}"));
        }
        Ok(())
    }

    pub fn reset_all(&mut self) {
        let cleared = self.store.obtained_count();
        self.store.reset_all();
        self.status = format!("Reset {cleared} obtained mount(s)");
        self.log_info(format!("Reset all: cleared {cleared} obtained mount(s)"));
    }

    pub fn toggle_theme(&mut self) -> Result<()> {
        self.config.theme = self.config.theme.toggled();
        self.status = format!("{} theme", self.config.theme.label());
        self.config.save()
    }

    pub fn save_mounts(&mut self) -> Result<(), TrackerError> {
        persistence::save(self.store.list(), &self.mounts_path)?;
        self.status = "Mount list saved.".to_string();
        self.set_toast("Mount list saved.", ToastLevel::Info, TOAST_SHORT);
        self.log_info(format!(
            "Saved {} mount(s) to {}",
            self.store.len(),
            self.mounts_path.display()
        ));
        Ok(())
    }

    /// Replaces the list from disk. On failure the current list is kept.
    pub fn reload_mounts(&mut self) -> Result<usize, TrackerError> {
        let entries = persistence::load(&self.mounts_path)?;
        let count = entries.len();
        self.store.replace(entries);
        self.clamp_selection();
        self.status = format!("Loaded {count} mount(s)");
        self.log_info(format!(
            "Loaded {count} mount(s) from {}",
            self.mounts_path.display()
        ));
        Ok(count)
    }

    pub fn load_mounts(&mut self) {
        if let Err(err) = self.reload_mounts() {
            self.report_error("Load", &err);
        }
    }

    /// Saves and quits; a failed save asks before discarding changes.
    pub fn request_quit(&mut self) {
        match self.save_mounts() {
            Ok(()) => self.should_quit = true,
            Err(err) => {
                self.report_error("Save", &err);
                self.open_dialog(Dialog {
                    title: "Save failed".to_string(),
                    message: format!("{err}\nQuit without saving?"),
                    yes_label: "Quit".to_string(),
                    no_label: "Stay".to_string(),
                    choice: DialogChoice::No,
                    kind: DialogKind::QuitUnsaved,
                });
            }
        }
    }

    pub fn report_error(&mut self, action: &str, err: &TrackerError) {
        let (message, level) = if err.is_index() {
            (format!("{action}: select a mount first"), ToastLevel::Warn)
        } else {
            (format!("{action} failed: {err}"), ToastLevel::Error)
        };
        self.status = message.clone();
        self.set_toast(&message, level, TOAST_LONG);
        if level == ToastLevel::Error {
            self.log_error(message);
        } else {
            self.log_warn(message);
        }
    }

    pub fn set_toast(&mut self, message: &str, level: ToastLevel, duration: Duration) {
        self.toast = Some(Toast {
            message: message.to_string(),
            level,
            expires_at: Instant::now() + duration,
        });
    }

    fn open_dialog(&mut self, dialog: Dialog) {
        self.dialog = Some(dialog);
        self.input_mode = InputMode::Normal;
    }

    pub fn dialog_choice_left(&mut self) {
        self.dialog_set_choice(DialogChoice::Yes);
    }

    pub fn dialog_choice_right(&mut self) {
        self.dialog_set_choice(DialogChoice::No);
    }

    pub fn dialog_set_choice(&mut self, choice: DialogChoice) {
        if let Some(dialog) = &mut self.dialog {
            dialog.choice = choice;
        }
    }

    pub fn dialog_confirm(&mut self) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        if dialog.choice != DialogChoice::Yes {
            return;
        }
        match dialog.kind {
            DialogKind::RemoveMount { index } => {
                if let Err(err) = self.remove_at(index) {
                    self.report_error("Remove", &err);
                }
            }
            DialogKind::QuitUnsaved => {
                self.log_warn("Quit without saving".to_string());
                self.should_quit = true;
            }
        }
    }

    pub fn scroll_log_up(&mut self, lines: usize) {
        let max = self.logs.len().saturating_sub(1);
        self.log_scroll = self.log_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_log_down(&mut self, lines: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(lines);
    }

    pub fn log_info(&mut self, message: String) {
        self.push_log(LogLevel::Info, message);
    }

    pub fn log_warn(&mut self, message: String) {
        self.push_log(LogLevel::Warn, message);
    }

    pub fn log_error(&mut self, message: String) {
        self.push_log(LogLevel::Error, message);
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        if self.log_scroll > 0 {
            self.log_scroll = self.log_scroll.saturating_add(1);
        }

        let at = OffsetDateTime::now_utc();
        let _ = append_log_file(&self.log_path, at, level, &message);
        self.logs.push(LogEntry { at, level, message });

        if self.logs.len() > LOG_CAPACITY {
            let overflow = self.logs.len() - LOG_CAPACITY;
            self.logs.drain(0..overflow);
            self.log_scroll = self.log_scroll.saturating_sub(overflow);
        }
    }
}

fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

fn append_log_file(
    path: &Path,
    at: OffsetDateTime,
    level: LogLevel,
    message: &str,
) -> std::io::Result<()> {
    let label = log_level_label(level);
    let stamp = at.format(&Rfc3339).unwrap_or_default();
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{stamp} [{label}] {message}")
}
