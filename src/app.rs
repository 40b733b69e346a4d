//! The event loop: a single-threaded cooperative dispatcher over one tagged
//! message enum. Every background task (PTY reader, HTTP fetch, stream pump,
//! timer) only ever sends an `AppEvent`; no task touches `Model` state
//! directly.

use std::time::Duration;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use ratatui::Frame;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

use crate::altscreen::AltScreenSplitter;
use crate::altscreen::ChunkKind;
use crate::chat::ChatHistory;
use crate::chat::ChatMessage;
use crate::chat::sidebar::Focus;
use crate::chat::sidebar::Sidebar;
use crate::chat::stream::RenderAction;
use crate::chat::stream::StreamCoordinator;
use crate::config::Config;
use crate::error::Result;
use crate::fullscreen::Panel;
use crate::history;
use crate::history::SessionHistory;
use crate::input_router::InputRouter;
use crate::input_router::RouterAction;
use crate::llm;
use crate::llm::ChatRequest;
use crate::llm::LlmProvider;
use crate::llm::StreamEvent;
use crate::model_cache;
use crate::model_cache::ModelCache;
use crate::model_cache::ModelInfo;
use crate::normalizer::Normalizer;
use crate::overlays::OverlayKind;
use crate::overlays::OverlayMessage;
use crate::overlays::OverlayStack;
use crate::overlays::history_picker::HistoryPicker;
use crate::overlays::model_picker::ModelPicker;
use crate::overlays::option_picker::OptionPicker;
use crate::overlays::palette::Palette;
use crate::overlays::palette::PaletteCommand;
use crate::overlays::result_panel::ResultPanel;
use crate::overlays::settings::FieldKind;
use crate::overlays::settings::Field;
use crate::overlays::settings::Settings;
use crate::overlays::Overlay;
use crate::pty::PtyHost;
use crate::pty_cwd;
use crate::scrollback;
use crate::scrollback::Scrollback;
use crate::scrollback::Viewport;
use crate::status_bar::StatusBar;
use crate::tui::FrameRequester;
use crate::tui::Tui;
use crate::tui::TuiEvent;

/// Batch window for the PTY output pipeline.
const FLUSH_INTERVAL: Duration = Duration::from_millis(16);
const FLUSH_BYTES: usize = 16 * 1024;
/// How long PTY output is suppressed after a resize, to hide reflow noise.
const RESIZE_SUPPRESS_WINDOW: Duration = Duration::from_millis(100);
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);
const SIDEBAR_MIN_WIDTH: u16 = 24;
/// How many trailing scrollback lines get folded into the system prompt for
/// every chat submission.
const CHAT_SCROLLBACK_TAIL_LINES: usize = 40;

/// Every externally observable occurrence the loop reacts to. Background
/// tasks communicate exclusively through this enum.
#[derive(Debug)]
pub enum AppEvent {
    Tui(TuiEvent),
    PtyOutput(Vec<u8>),
    PtyExited,
    FlushPtyBatch,
    ResizeDebounced(u16, u16),
    ResizeSuppressElapsed,
    StreamDelta(String),
    StreamDone,
    StreamErr(String),
    ThrottleTick,
    ModelsFetched { field: String, models: Vec<ModelInfo> },
    ModelsFetchFailed { field: String, reason: String },
    Quit,
}

/// All mutable application state, decomposed by concern.
pub struct Model {
    config: Config,
    pty: PtyHost,
    pty_writer: mpsc::Sender<Vec<u8>>,
    input_router: InputRouter,
    altscreen: AltScreenSplitter,
    normalizer: Normalizer,
    scrollback: Scrollback,
    viewport: Viewport,
    full_screen: Option<Panel>,
    overlay_stack: OverlayStack,
    palette: Palette,
    history_picker: HistoryPicker,
    settings: Settings,
    model_picker: ModelPicker,
    option_picker: OptionPicker,
    result_panel: ResultPanel,
    session_history: SessionHistory,
    sidebar: Sidebar,
    focus: Focus,
    chat_history: ChatHistory,
    stream_coordinator: StreamCoordinator,
    status_bar: StatusBar,
    pty_batch: Vec<u8>,
    last_resize_request: Option<(u16, u16)>,
    suppress_pty_resize_echo: bool,
    exit_hint: bool,
    should_quit: bool,
    rows: u16,
    cols: u16,
}

impl Model {
    pub fn new(config: Config, pty: PtyHost, rows: u16, cols: u16) -> Self {
        let pty_writer = pty.writer();
        let buffer_size = config.buffer_size;
        let mut status_bar = StatusBar::new();
        status_bar.set_cwd(pty_cwd::cwd_of(pty.child_pid().unwrap_or(0)));
        status_bar.set_model(
            config
                .active_provider_config()
                .model
                .unwrap_or_else(|| "no model set".to_string()),
        );

        Self {
            config,
            pty,
            pty_writer,
            input_router: InputRouter::new(),
            altscreen: AltScreenSplitter::new(),
            normalizer: Normalizer::new(),
            scrollback: Scrollback::new(buffer_size),
            viewport: Viewport::new(),
            full_screen: None,
            overlay_stack: OverlayStack::new(),
            palette: Palette::new(default_palette_commands()),
            history_picker: HistoryPicker::new(),
            settings: Settings::new(Vec::new()),
            model_picker: ModelPicker::new(),
            option_picker: OptionPicker::new(),
            result_panel: ResultPanel::new(),
            session_history: SessionHistory::new(),
            sidebar: Sidebar::new(),
            focus: Focus::Terminal,
            chat_history: ChatHistory::new(),
            stream_coordinator: StreamCoordinator::new(),
            status_bar,
            pty_batch: Vec::new(),
            last_resize_request: None,
            suppress_pty_resize_echo: false,
            exit_hint: false,
            should_quit: false,
            rows,
            cols,
        }
    }

    fn open_settings(&mut self) {
        let cfg = self.config.active_provider_config();
        self.settings = Settings::new(vec![
            Field {
                key: "provider".into(),
                label: "Provider".into(),
                value: provider_str(self.config.llm_provider).to_string(),
                kind: FieldKind::Option(
                    ["openrouter", "openai", "copilot", "anthropic", "google"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
            },
            Field {
                key: "model".into(),
                label: "Model".into(),
                value: cfg.model.unwrap_or_default(),
                kind: FieldKind::Model,
            },
            Field {
                key: "temperature".into(),
                label: "Temperature".into(),
                value: cfg.temperature.unwrap_or(0.2).to_string(),
                kind: FieldKind::Numeric,
            },
            Field {
                key: "max_tokens".into(),
                label: "Max tokens".into(),
                value: cfg.max_tokens.unwrap_or(2048).to_string(),
                kind: FieldKind::Numeric,
            },
            Field {
                key: "buffer_size".into(),
                label: "Buffer size".into(),
                value: self.config.buffer_size.to_string(),
                kind: FieldKind::Numeric,
            },
            Field {
                key: "log_level".into(),
                label: "Log level".into(),
                value: log_level_str(self.config.log_level).to_string(),
                kind: FieldKind::Option(
                    ["trace", "debug", "info", "warn", "error"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
            },
            Field {
                key: "log_format".into(),
                label: "Log format".into(),
                value: log_format_str(self.config.log_format).to_string(),
                kind: FieldKind::Option(vec!["json".to_string(), "text".to_string()]),
            },
        ]);
        self.settings.show();
        self.overlay_stack.open(OverlayKind::Settings);
    }

    /// Routing priority: Full state -> blocking overlay -> sidebar-focused
    /// input -> input router. A full-screen app (editor, pager) owns every
    /// keystroke and suppresses overlays entirely, so that check comes
    /// first.
    fn handle_key(&mut self, key: KeyEvent, events: &mpsc::UnboundedSender<AppEvent>, frames: &FrameRequester) {
        if key.code == KeyCode::Esc && !self.overlay_stack.is_any_visible() && self.exit_hint {
            self.exit_hint = false;
        }

        if self.full_screen.is_some() {
            let secret = self.pty.is_secret_mode();
            if let RouterAction::WriteToPty(bytes) = self.input_router.handle_key(key, secret) {
                self.pty.write_bytes(bytes);
            }
            frames.schedule_frame();
            return;
        }

        if self.overlay_stack.is_any_visible() {
            self.dispatch_overlay_key(key, events);
            frames.schedule_frame();
            return;
        }

        if self.focus == Focus::SidebarInput && self.sidebar.is_visible() {
            self.handle_sidebar_key(key, events);
            frames.schedule_frame();
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::PageUp, _) => {
                let page = self.viewport_height() as usize;
                self.viewport.page_up(page, self.scrollback.len());
                frames.schedule_frame();
                return;
            }
            (KeyCode::PageDown, _) => {
                let page = self.viewport_height() as usize;
                self.viewport.page_down(page);
                frames.schedule_frame();
                return;
            }
            (KeyCode::Up, KeyModifiers::CONTROL) => {
                self.viewport.line_up(self.scrollback.len());
                frames.schedule_frame();
                return;
            }
            (KeyCode::Down, KeyModifiers::CONTROL) => {
                self.viewport.line_down();
                frames.schedule_frame();
                return;
            }
            _ => {}
        }

        let secret = self.pty.is_secret_mode();
        match self.input_router.handle_key(key, secret) {
            RouterAction::WriteToPty(bytes) => self.pty.write_bytes(bytes),
            RouterAction::SubmitCommand { bytes, command: _ } => {
                self.pty.write_bytes(bytes);
            }
            RouterAction::CtrlD => {
                self.exit_hint = true;
                self.status_bar.set_transient("Press Ctrl+D again to exit");
            }
            RouterAction::ExitConfirmed => {
                self.pty.write_bytes(vec![0x04]);
                self.should_quit = true;
            }
            RouterAction::ToggleChat => {
                self.sidebar.toggle();
                self.focus = if self.sidebar.is_visible() {
                    Focus::SidebarInput
                } else {
                    Focus::Terminal
                };
            }
            RouterAction::ShowHistoryPicker { initial_filter } => {
                let merged = history::merge(&self.session_history.commands(), &history::read_shell_history());
                self.history_picker.open(merged, initial_filter);
                self.overlay_stack.open(OverlayKind::HistoryPicker);
            }
            RouterAction::FocusSwitch => {
                if self.sidebar.is_visible() {
                    self.focus = match self.focus {
                        Focus::Terminal => Focus::SidebarInput,
                        Focus::SidebarInput => Focus::Terminal,
                    };
                }
            }
            RouterAction::ShowPalette => {
                self.palette.show();
                self.overlay_stack.open(OverlayKind::Palette);
            }
            RouterAction::Ignored => {}
        }
        frames.schedule_frame();
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent, events: &mpsc::UnboundedSender<AppEvent>) {
        match key.code {
            KeyCode::BackTab => self.focus = Focus::Terminal,
            KeyCode::Enter => {
                if let Some(content) = self.sidebar.take_submission() {
                    self.submit_chat(content, events);
                }
            }
            KeyCode::Backspace => self.sidebar.backspace(),
            KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
                self.sidebar.push_char(c);
            }
            _ => {}
        }
    }

    fn submit_chat(&mut self, content: String, events: &mpsc::UnboundedSender<AppEvent>) {
        self.chat_history.push(ChatMessage::user(content));
        if !self.stream_coordinator.start(&mut self.chat_history) {
            return;
        }
        self.spawn_stream(events);
    }

    /// System prompt grounding the assistant in the live terminal buffer,
    /// prepended to every chat submission ahead of the conversation so far.
    fn system_context(&self) -> llm::ChatMessage {
        let tail: String = self
            .scrollback
            .last_n(CHAT_SCROLLBACK_TAIL_LINES)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        llm::ChatMessage {
            role: llm::Role::System,
            content: format!(
                "You are wtf, an assistant embedded in the user's terminal. \
                 Here is the tail of the current terminal scrollback:\n{tail}"
            ),
        }
    }

    fn spawn_stream(&mut self, events: &mpsc::UnboundedSender<AppEvent>) {
        let provider_cfg = self.config.active_provider_config();
        let provider = llm::build_provider(&provider_cfg, self.config.llm_provider.default_api_url());
        let mut messages = vec![self.system_context()];
        messages.extend(self.chat_history.to_llm_messages());
        let request = ChatRequest {
            messages,
            model: provider_cfg.model.unwrap_or_default(),
            temperature: provider_cfg.temperature.unwrap_or(0.2),
            max_tokens: provider_cfg.max_tokens.unwrap_or(2048),
        };
        let events = events.clone();
        tokio::spawn(async move {
            match provider.stream_chat(request).await {
                Ok(mut stream) => {
                    while let Some(event) = stream.next().await {
                        let forwarded = match event {
                            StreamEvent::Delta(delta) => AppEvent::StreamDelta(delta),
                            StreamEvent::Done => AppEvent::StreamDone,
                            StreamEvent::Err(reason) => AppEvent::StreamErr(reason),
                        };
                        if events.send(forwarded).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    let _ = events.send(AppEvent::StreamErr(e.to_string()));
                }
            }
        });
    }

    fn dispatch_overlay_key(&mut self, key: KeyEvent, events: &mpsc::UnboundedSender<AppEvent>) {
        let message = match self.overlay_stack.active() {
            OverlayKind::Palette => self.palette.update(key),
            OverlayKind::HistoryPicker => self.history_picker.update(key),
            OverlayKind::Settings => self.settings.update(key),
            OverlayKind::ModelPicker => self.model_picker.update(key),
            OverlayKind::OptionPicker => self.option_picker.update(key),
            OverlayKind::ResultPanel => self.result_panel.update(key),
            OverlayKind::None => None,
        };
        let Some(message) = message else { return };
        self.apply_overlay_message(message, events);
    }

    fn apply_overlay_message(&mut self, message: OverlayMessage, events: &mpsc::UnboundedSender<AppEvent>) {
        match message {
            OverlayMessage::PaletteCancel => self.overlay_stack.close(),
            OverlayMessage::PaletteSelect(name) => {
                self.overlay_stack.close();
                if name == "/explain" {
                    self.chat_history
                        .push(ChatMessage::user("Explain the current terminal state."));
                    if self.stream_coordinator.start(&mut self.chat_history) {
                        self.sidebar.show();
                        self.spawn_stream(events);
                    }
                } else if name == "/settings" {
                    self.open_settings();
                }
            }
            OverlayMessage::HistoryCancel => self.overlay_stack.close(),
            OverlayMessage::HistorySelect(command) => {
                self.overlay_stack.close();
                self.pty.write_bytes(HistoryPicker::bytes_for(&command));
            }
            OverlayMessage::SettingsSaved => {
                self.overlay_stack.close();
                self.apply_settings_fields();
                let _ = crate::config::save(&self.config);
            }
            OverlayMessage::SettingsCancelled => self.overlay_stack.close(),
            OverlayMessage::OpenModelPicker { field } => {
                self.model_picker.open_loading(field.clone());
                self.overlay_stack.open(OverlayKind::ModelPicker);
                self.spawn_model_fetch(field, events);
            }
            OverlayMessage::OpenOptionPicker { field, options } => {
                self.option_picker.open(field, options);
                self.overlay_stack.open(OverlayKind::OptionPicker);
            }
            OverlayMessage::ModelSelected { field, model } => {
                self.overlay_stack.open(OverlayKind::Settings);
                self.set_settings_field(&field, &model);
            }
            OverlayMessage::OptionSelected { field, value } => {
                self.overlay_stack.open(OverlayKind::Settings);
                self.set_settings_field(&field, &value);
            }
            OverlayMessage::PickerCancelled => self.overlay_stack.open(OverlayKind::Settings),
            OverlayMessage::ResultClosed => self.overlay_stack.close(),
            OverlayMessage::ValidationError(_) => {}
        }
    }

    fn set_settings_field(&mut self, key: &str, value: &str) {
        let fields = self.settings.fields().to_vec();
        let mut new_fields = fields;
        for f in new_fields.iter_mut() {
            if f.key == key {
                f.value = value.to_string();
            }
        }
        self.settings = Settings::new(new_fields);
        self.settings.show();
        self.settings.mark_dirty();
    }

    fn apply_settings_fields(&mut self) {
        let fields = self.settings.fields().to_vec();
        let mut provider_cfg = self.config.active_provider_config();
        for f in fields {
            match f.key.as_str() {
                "provider" => {
                    if let Some(provider) = parse_provider(&f.value) {
                        self.config.llm_provider = provider;
                    }
                }
                "model" => provider_cfg.model = Some(f.value),
                "temperature" => provider_cfg.temperature = f.value.parse().ok(),
                "max_tokens" => provider_cfg.max_tokens = f.value.parse().ok(),
                "buffer_size" => {
                    if let Ok(size) = f.value.parse() {
                        self.config.buffer_size = size;
                    }
                }
                "log_level" => {
                    if let Some(level) = parse_log_level(&f.value) {
                        self.config.log_level = level;
                    }
                }
                "log_format" => {
                    if let Some(format) = parse_log_format(&f.value) {
                        self.config.log_format = format;
                    }
                }
                _ => {}
            }
        }
        self.config
            .providers
            .insert(self.config.llm_provider, provider_cfg);
    }

    fn spawn_model_fetch(&self, field: String, events: &mpsc::UnboundedSender<AppEvent>) {
        let provider_cfg = self.config.active_provider_config();
        let provider = llm::build_provider(&provider_cfg, self.config.llm_provider.default_api_url());
        let events = events.clone();
        tokio::spawn(async move {
            let result = tokio::time::timeout(Duration::from_secs(20), provider.list_models()).await;
            match result {
                Ok(Ok(models)) => {
                    let _ = model_cache::write(&ModelCache {
                        updated_at: chrono_now(),
                        models: models.clone(),
                    });
                    let _ = events.send(AppEvent::ModelsFetched { field, models });
                }
                Ok(Err(e)) => {
                    let cached = model_cache::read().map(|c| c.models).unwrap_or_default();
                    let _ = events.send(AppEvent::ModelsFetchFailed {
                        field,
                        reason: e.to_string(),
                    });
                    if !cached.is_empty() {
                        tracing::warn!(error = %e, "model fetch failed, falling back to cache");
                    }
                }
                Err(_) => {
                    let _ = events.send(AppEvent::ModelsFetchFailed {
                        field,
                        reason: "timed out".to_string(),
                    });
                }
            }
        });
    }

    fn handle_pty_output(&mut self, bytes: Vec<u8>, frames: &FrameRequester) {
        self.pty_batch.extend_from_slice(&bytes);
        self.input_router.observe_output(&bytes);
        if self.pty_batch.len() >= FLUSH_BYTES {
            self.flush_pty_batch(frames);
        }
    }

    fn flush_pty_batch(&mut self, frames: &FrameRequester) {
        if self.pty_batch.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.pty_batch);
        if self.suppress_pty_resize_echo {
            return;
        }
        for chunk in self.altscreen.feed(&batch) {
            match chunk.kind {
                ChunkKind::Plain => {
                    if let Some(panel) = self.full_screen.as_mut() {
                        panel.write(&chunk.data);
                    } else {
                        for line in self.normalizer.feed(&chunk.data) {
                            if let Some(command) = history::extract_command(&line) {
                                self.session_history.push(history::CommandRecord {
                                    command,
                                    start_time: chrono_now(),
                                    end_time: None,
                                    working_dir: None,
                                    exit_code: None,
                                });
                            }
                            self.scrollback.push(line);
                            self.viewport.notify_new_line();
                        }
                    }
                }
                ChunkKind::Entering => {
                    self.full_screen = Some(Panel::new(self.rows.saturating_sub(1), self.cols));
                    self.input_router.set_full_screen(true);
                }
                ChunkKind::Exiting => {
                    self.full_screen = None;
                    self.input_router.set_full_screen(false);
                }
            }
        }
        frames.schedule_frame();
    }

    fn handle_resize(&mut self, cols: u16, rows: u16, frames: &FrameRequester) {
        self.rows = rows;
        self.cols = cols;
        self.last_resize_request = Some((rows, cols));
        frames.schedule_frame_in(RESIZE_DEBOUNCE);
    }

    fn commit_resize(&mut self, frames: &FrameRequester, events: &mpsc::UnboundedSender<AppEvent>) {
        let Some((rows, cols)) = self.last_resize_request.take() else {
            return;
        };
        self.pty.resize(rows.saturating_sub(1), cols);
        if let Some(panel) = self.full_screen.as_mut() {
            panel.resize(rows.saturating_sub(1), cols);
        }
        self.suppress_pty_resize_echo = true;
        let events = events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RESIZE_SUPPRESS_WINDOW).await;
            let _ = events.send(AppEvent::ResizeSuppressElapsed);
        });
        frames.schedule_frame();
    }

    pub fn viewport_height(&self) -> u16 {
        self.rows.saturating_sub(1)
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let body_area = chunks[0];
        let status_area = chunks[1];

        let (terminal_area, sidebar_area) = if self.sidebar.is_visible() {
            let (t, s) = Sidebar::split(body_area, SIDEBAR_MIN_WIDTH);
            (t, Some(s))
        } else {
            (body_area, None)
        };

        self.render_terminal(frame, terminal_area);
        if let Some(sidebar_area) = sidebar_area {
            self.sidebar
                .render(frame, sidebar_area, &self.chat_history, self.focus);
        }
        self.status_bar.render(frame, status_area);

        if self.overlay_stack.is_any_visible() {
            let overlay_area = centered(area, 70, 60);
            match self.overlay_stack.active() {
                OverlayKind::Palette => self.palette.render(frame, overlay_area),
                OverlayKind::HistoryPicker => self.history_picker.render(frame, overlay_area),
                OverlayKind::Settings => self.settings.render(frame, overlay_area),
                OverlayKind::ModelPicker => self.model_picker.render(frame, overlay_area),
                OverlayKind::OptionPicker => self.option_picker.render(frame, overlay_area),
                OverlayKind::ResultPanel => self.result_panel.render(frame, overlay_area),
                OverlayKind::None => {}
            }
        }
    }

    fn render_terminal(&self, frame: &mut Frame, area: Rect) {
        use ratatui::text::Line;
        use ratatui::widgets::Paragraph;

        if let Some(panel) = &self.full_screen {
            let lines = panel.render();
            frame.render_widget(Paragraph::new(lines), area);
            return;
        }

        // The cursor overlay stands in for the in-progress line that hasn't
        // hit a newline yet; disabled once the sidebar owns the keyboard, or
        // once the user has scrolled away from the bottom.
        let show_cursor = self.viewport.is_pinned_to_bottom() && self.focus != Focus::SidebarInput;
        let height = area.height as usize;
        let completed_height = if show_cursor { height.saturating_sub(1) } else { height };
        let visible = self.viewport.visible(&self.scrollback, completed_height);
        let mut lines: Vec<Line> = visible.into_iter().map(|s| Line::from(s.as_str())).collect();
        if show_cursor {
            let current = self.normalizer.current_line();
            let cursor_line = scrollback::overlay_cursor(&current, self.normalizer.cursor_col());
            lines.push(Line::from(cursor_line));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit || self.pty.has_exited()
    }
}

fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn default_palette_commands() -> Vec<PaletteCommand> {
    vec![
        PaletteCommand {
            name: "/explain".to_string(),
            description: "Ask the assistant to explain the current terminal state".to_string(),
        },
        PaletteCommand {
            name: "/settings".to_string(),
            description: "Open the settings panel".to_string(),
        },
    ]
}

fn chrono_now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

fn provider_str(provider: crate::config::Provider) -> &'static str {
    use crate::config::Provider;
    match provider {
        Provider::Openrouter => "openrouter",
        Provider::Openai => "openai",
        Provider::Copilot => "copilot",
        Provider::Anthropic => "anthropic",
        Provider::Google => "google",
    }
}

fn parse_provider(value: &str) -> Option<crate::config::Provider> {
    use crate::config::Provider;
    match value {
        "openrouter" => Some(Provider::Openrouter),
        "openai" => Some(Provider::Openai),
        "copilot" => Some(Provider::Copilot),
        "anthropic" => Some(Provider::Anthropic),
        "google" => Some(Provider::Google),
        _ => None,
    }
}

fn log_level_str(level: crate::config::LogLevel) -> &'static str {
    use crate::config::LogLevel;
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

fn parse_log_level(value: &str) -> Option<crate::config::LogLevel> {
    use crate::config::LogLevel;
    match value {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

fn log_format_str(format: crate::config::LogFormat) -> &'static str {
    use crate::config::LogFormat;
    match format {
        LogFormat::Json => "json",
        LogFormat::Text => "text",
    }
}

fn parse_log_format(value: &str) -> Option<crate::config::LogFormat> {
    use crate::config::LogFormat;
    match value {
        "json" => Some(LogFormat::Json),
        "text" => Some(LogFormat::Text),
        _ => None,
    }
}

/// Run the event loop until the user exits or the shell dies.
pub async fn run(mut tui: Tui, config: Config, pty: PtyHost, mut pty_rx: tokio::sync::broadcast::Receiver<Vec<u8>>) -> Result<()> {
    let size = tui.terminal.size().map_err(crate::error::WtfError::Io)?;
    let mut model = Model::new(config, pty, size.height, size.width);

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<AppEvent>();
    let frames = tui.frame_requester();

    {
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            loop {
                match pty_rx.recv().await {
                    Ok(bytes) => {
                        if events_tx.send(AppEvent::PtyOutput(bytes)).is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        let _ = events_tx.send(AppEvent::PtyExited);
                        break;
                    }
                }
            }
        });
    }

    {
        let events_tx = events_tx.clone();
        let mut tui_events = tui.event_stream();
        tokio::spawn(async move {
            while let Some(event) = tui_events.next().await {
                if events_tx.send(AppEvent::Tui(event)).is_err() {
                    break;
                }
            }
        });
    }

    {
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FLUSH_INTERVAL);
            loop {
                ticker.tick().await;
                if events_tx.send(AppEvent::FlushPtyBatch).is_err() {
                    break;
                }
            }
        });
    }

    frames.schedule_frame();

    loop {
        let Some(event) = events_rx.recv().await else {
            break;
        };
        match event {
            AppEvent::Tui(TuiEvent::Key(key)) => model.handle_key(key, &events_tx, &frames),
            AppEvent::Tui(TuiEvent::Paste(text)) => {
                let bytes = model.input_router.handle_paste(&text);
                model.pty.write_bytes(bytes);
                frames.schedule_frame();
            }
            AppEvent::Tui(TuiEvent::Resize(cols, rows)) => model.handle_resize(cols, rows, &frames),
            AppEvent::Tui(TuiEvent::Draw) => {
                model.commit_resize(&frames, &events_tx);
                model.flush_pty_batch(&frames);
                tui.draw(|frame| model.render(frame))?;
            }
            AppEvent::PtyOutput(bytes) => model.handle_pty_output(bytes, &frames),
            AppEvent::PtyExited => model.should_quit = true,
            AppEvent::FlushPtyBatch => model.flush_pty_batch(&frames),
            AppEvent::ResizeDebounced(rows, cols) => {
                model.last_resize_request = Some((rows, cols));
                model.commit_resize(&frames, &events_tx);
            }
            AppEvent::ResizeSuppressElapsed => model.suppress_pty_resize_echo = false,
            AppEvent::StreamDelta(delta) => {
                let action = model.stream_coordinator.on_delta(&mut model.chat_history, &delta);
                match action {
                    RenderAction::RenderAndArmTimer => {
                        frames.schedule_frame();
                        let events_tx = events_tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_millis(crate::chat::stream::THROTTLE_MS)).await;
                            let _ = events_tx.send(AppEvent::ThrottleTick);
                        });
                    }
                    RenderAction::RenderNow => frames.schedule_frame(),
                    RenderAction::Silent | RenderAction::None => {}
                }
            }
            AppEvent::StreamDone => {
                model.stream_coordinator.on_done(&mut model.chat_history);
                frames.schedule_frame();
            }
            AppEvent::StreamErr(reason) => {
                model.stream_coordinator.on_err(&mut model.chat_history, &reason);
                frames.schedule_frame();
            }
            AppEvent::ThrottleTick => {
                if model.stream_coordinator.on_throttle_tick() == RenderAction::RenderNow {
                    frames.schedule_frame();
                }
            }
            AppEvent::ModelsFetched { field, models } => {
                model.model_picker.set_models(models.into_iter().map(|m| m.id).collect());
                let _ = field;
                frames.schedule_frame();
            }
            AppEvent::ModelsFetchFailed { field, reason } => {
                let cached = model_cache::read().map(|c| c.models).unwrap_or_default();
                model.model_picker.set_models(cached.into_iter().map(|m| m.id).collect());
                model.status_bar.set_transient(format!("model fetch failed: {reason}"));
                let _ = field;
                frames.schedule_frame();
            }
            AppEvent::Quit => break,
        }

        if model.should_quit() {
            break;
        }
    }

    Ok(())
}
