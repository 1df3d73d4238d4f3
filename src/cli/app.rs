use super::ui;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use crowdconsole::schema::FieldKind;
use crowdconsole::{AdminSession, AuthError, Authenticator, Console, DocumentStore, EntityKind};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    widgets::{Block, Borders, TableState},
};
use std::{io, sync::Arc};
use tracing::{debug, info, warn};
use tui_textarea::TextArea;

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tabs,
    Form,
    Table,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Tabs => Focus::Form,
            Focus::Form => Focus::Table,
            Focus::Table => Focus::Tabs,
        }
    }
}

/// Store-bound work requested by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SignIn,
    SelectKind(EntityKind),
    Refresh,
    Submit,
    ConfirmDelete,
}

impl Action {
    fn busy_label(&self) -> &'static str {
        match self {
            Action::SignIn => "Signing in...",
            Action::SelectKind(_) | Action::Refresh => "Loading...",
            Action::Submit => "Saving...",
            Action::ConfirmDelete => "Deleting...",
        }
    }
}

pub struct SignInForm<'a> {
    pub admin_name: TextArea<'a>,
    pub password: TextArea<'a>,
    pub on_password: bool,
    pub error: Option<String>,
}

impl<'a> SignInForm<'a> {
    fn new() -> Self {
        let mut admin_name = TextArea::default();
        admin_name.set_block(Block::default().borders(Borders::ALL).title(" Admin Name "));

        let mut password = TextArea::default();
        password.set_mask_char('\u{2022}');
        password.set_block(Block::default().borders(Borders::ALL).title(" Password "));

        Self {
            admin_name,
            password,
            on_password: false,
            error: None,
        }
    }

    fn active(&mut self) -> &mut TextArea<'a> {
        if self.on_password {
            &mut self.password
        } else {
            &mut self.admin_name
        }
    }
}

/// Text area open over one form field.
pub struct FieldEditor<'a> {
    pub field: String,
    pub kind: FieldKind,
    pub textarea: TextArea<'a>,
}

impl<'a> FieldEditor<'a> {
    fn new(field: &str, label: &str, kind: FieldKind, text: &str) -> Self {
        let lines = if text.is_empty() {
            vec![String::new()]
        } else {
            text.lines().map(str::to_string).collect()
        };
        let mut textarea = TextArea::new(lines);
        textarea.move_cursor(tui_textarea::CursorMove::Bottom);
        textarea.move_cursor(tui_textarea::CursorMove::End);
        if kind.is_masked() {
            textarea.set_mask_char('\u{2022}');
        }
        let hint = if kind.is_multiline() {
            "Esc to close"
        } else {
            "Enter to close"
        };
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ({}) - {} ", label, kind.input_type(), hint)),
        );

        Self {
            field: field.to_string(),
            kind,
            textarea,
        }
    }

    fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }
}

pub struct App<'a> {
    pub console: Console,
    store: Arc<dyn DocumentStore>,
    authenticator: Authenticator,
    pub session: Option<AdminSession>,
    pub sign_in: SignInForm<'a>,
    pub focus: Focus,
    pub field_index: usize,
    pub editor: Option<FieldEditor<'a>>,
    pub table_state: TableState,
    pub busy: Option<&'static str>,
    pub exit: bool,
}

impl<'a> App<'a> {
    pub fn new(console: Console, store: Arc<dyn DocumentStore>, authenticator: Authenticator) -> Self {
        Self {
            console,
            store,
            authenticator,
            session: None,
            sign_in: SignInForm::new(),
            focus: Focus::Form,
            field_index: 0,
            editor: None,
            table_state: TableState::default(),
            busy: None,
            exit: false,
        }
    }

    pub async fn run(&mut self) -> io::Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, self))?;

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = self.handle_key(key) {
                        self.busy = Some(action.busy_label());
                        terminal.draw(|f| ui::draw(f, self))?;
                        self.perform(action).await;
                        self.busy = None;
                    }
                }
            }
            if self.exit {
                return Ok(());
            }
        }
    }

    /// Handles a key and runs whatever store work it requests, without
    /// redrawing in between.
    #[cfg(test)]
    pub async fn dispatch(&mut self, key: KeyEvent) {
        if let Some(action) = self.handle_key(key) {
            self.perform(action).await;
        }
    }

    /// Applies a key press to local state. Work that needs the store is
    /// returned instead of executed.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.exit = true;
            return None;
        }
        if self.busy.is_some() {
            return None;
        }

        if self.session.is_none() {
            return self.handle_sign_in_key(key);
        }
        if self.expire_session() {
            return None;
        }

        // Modals first: they block everything underneath.
        if self.console.notice().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.console.dismiss_notice();
            }
            return None;
        }
        if self.console.pending_delete().is_some() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Some(Action::ConfirmDelete),
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.console.dismiss_delete();
                    None
                }
                _ => None,
            };
        }
        if self.editor.is_some() {
            return self.handle_editor_key(key);
        }

        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Submit)
            }
            KeyCode::Esc => {
                if self.console.is_editing() {
                    self.console.cancel();
                    self.field_index = 0;
                } else {
                    self.exit = true;
                }
                None
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                None
            }
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                Some(Action::SelectKind(EntityKind::ALL[index]))
            }
            _ => match self.focus {
                Focus::Tabs => self.handle_tabs_key(key),
                Focus::Form => self.handle_form_key(key),
                Focus::Table => self.handle_table_key(key),
            },
        }
    }

    fn handle_sign_in_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.exit = true;
                None
            }
            KeyCode::Enter => Some(Action::SignIn),
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                self.sign_in.on_password = !self.sign_in.on_password;
                None
            }
            _ => {
                self.sign_in.active().input(key);
                None
            }
        }
    }

    fn handle_tabs_key(&mut self, key: KeyEvent) -> Option<Action> {
        let kind = self.console.active_kind();
        match key.code {
            KeyCode::Right => Some(Action::SelectKind(kind.next())),
            KeyCode::Left => Some(Action::SelectKind(kind.previous())),
            _ => None,
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        let fields = self.console.form().fields();
        if fields.is_empty() {
            return None;
        }
        self.field_index = self.field_index.min(fields.len() - 1);
        let field = &fields[self.field_index];

        match key.code {
            KeyCode::Down => self.field_index = (self.field_index + 1) % fields.len(),
            KeyCode::Up => {
                self.field_index = (self.field_index + fields.len() - 1) % fields.len()
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Enter => match field.kind {
                FieldKind::Select { options } => {
                    let forward = key.code != KeyCode::Left;
                    let next = cycle_option(options, &field.text, forward);
                    self.change_field(&field.name, next);
                }
                FieldKind::Flag => {
                    let flipped = if field.text == "true" { "false" } else { "true" };
                    self.change_field(&field.name, flipped);
                }
                _ if key.code == KeyCode::Enter => {
                    self.editor = Some(FieldEditor::new(
                        &field.name,
                        &field.label,
                        field.kind,
                        &field.text,
                    ));
                }
                _ => {}
            },
            _ => {}
        }
        None
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> Option<Action> {
        let count = self.console.instances().len();
        match key.code {
            KeyCode::Down if count > 0 => {
                let next = self.table_state.selected().map_or(0, |i| (i + 1) % count);
                self.table_state.select(Some(next));
            }
            KeyCode::Up if count > 0 => {
                let prev = self
                    .table_state
                    .selected()
                    .map_or(count - 1, |i| (i + count - 1) % count);
                self.table_state.select(Some(prev));
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    if self.console.edit_by_id(&id).is_ok() {
                        self.field_index = 0;
                        self.focus = Focus::Form;
                    }
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.console.request_delete(id);
                }
            }
            _ => {}
        }
        None
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Option<Action> {
        let editor = self.editor.as_mut()?;

        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.editor = None;
                return Some(Action::Submit);
            }
            KeyCode::Esc => {
                self.editor = None;
                return None;
            }
            KeyCode::Enter if !editor.kind.is_multiline() => {
                self.editor = None;
                return None;
            }
            _ => {}
        }

        if editor.textarea.input(key) {
            let (field, text) = (editor.field.clone(), editor.text());
            self.change_field(&field, &text);
        }
        None
    }

    fn change_field(&mut self, field: &str, raw: &str) {
        if let Err(err) = self.console.on_field_change(field, raw) {
            warn!(field, error = %err, "field change rejected");
        }
    }

    fn selected_id(&self) -> Option<String> {
        let index = self.table_state.selected()?;
        self.console.instances().get(index).map(|instance| instance.id.clone())
    }

    /// Drops an expired session and returns to the sign-in screen.
    fn expire_session(&mut self) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        match session.ensure_active(Utc::now()) {
            Ok(()) => false,
            Err(err) => {
                info!(admin = session.admin_name(), "admin session expired");
                self.sign_in = SignInForm::new();
                self.sign_in.error = Some(err.to_string());
                self.session = None;
                self.editor = None;
                true
            }
        }
    }

    /// Runs store-bound work. Failures surface through the console notice or
    /// the sign-in error line.
    pub async fn perform(&mut self, action: Action) {
        debug!(?action, "performing action");
        match action {
            Action::SignIn => {
                let admin_name = self.sign_in.admin_name.lines().join("");
                let password = self.sign_in.password.lines().join("");
                match self
                    .authenticator
                    .sign_in(self.store.as_ref(), admin_name.trim(), &password, Utc::now())
                    .await
                {
                    Ok(session) => {
                        self.session = Some(session);
                        self.sign_in = SignInForm::new();
                        let kind = self.console.active_kind();
                        let _ = self.console.select_kind(kind).await;
                    }
                    Err(err @ AuthError::InvalidCredentials) | Err(err @ AuthError::Expired(_)) => {
                        self.sign_in.error = Some(err.to_string());
                    }
                    Err(AuthError::Store(err)) => {
                        self.sign_in.error = Some(format!("Error fetching data: {}", err));
                    }
                }
            }
            Action::SelectKind(kind) => {
                let _ = self.console.select_kind(kind).await;
                self.field_index = 0;
                self.table_state.select(None);
            }
            Action::Refresh => {
                let _ = self.console.refresh().await;
            }
            Action::Submit => {
                if self.console.submit().await.is_ok() {
                    self.field_index = 0;
                }
            }
            Action::ConfirmDelete => {
                let _ = self.console.confirm_delete().await;
            }
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let count = self.console.instances().len();
        match self.table_state.selected() {
            _ if count == 0 => self.table_state.select(None),
            Some(index) if index >= count => self.table_state.select(Some(count - 1)),
            _ => {}
        }
    }
}

fn cycle_option<'o>(options: &[&'o str], current: &str, forward: bool) -> &'o str {
    let len = options.len();
    let next = match options.iter().position(|option| *option == current) {
        Some(index) if forward => (index + 1) % len,
        Some(index) => (index + len - 1) % len,
        None => 0,
    };
    options[next]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdconsole::{EditState, MemoryStore, NoticeLevel};
    use serde_json::json;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn new_app(store: Arc<MemoryStore>) -> App<'static> {
        let authenticator = Authenticator::new("admin", "adminpass", Duration::from_secs(600));
        App::new(Console::new(store.clone()), store, authenticator)
    }

    async fn type_text(app: &mut App<'_>, text: &str) {
        for c in text.chars() {
            app.dispatch(key(KeyCode::Char(c))).await;
        }
    }

    async fn signed_in(store: Arc<MemoryStore>) -> App<'static> {
        let mut app = new_app(store);
        type_text(&mut app, "admin").await;
        app.dispatch(key(KeyCode::Tab)).await;
        type_text(&mut app, "adminpass").await;
        app.dispatch(key(KeyCode::Enter)).await;
        assert!(app.session.is_some());
        app
    }

    #[tokio::test]
    async fn test_sign_in_rejects_wrong_password() {
        let mut app = new_app(Arc::new(MemoryStore::new()));
        type_text(&mut app, "admin").await;
        app.dispatch(key(KeyCode::Tab)).await;
        type_text(&mut app, "nope").await;
        app.dispatch(key(KeyCode::Enter)).await;

        assert!(app.session.is_none());
        assert_eq!(
            app.sign_in.error.as_deref(),
            Some("Invalid admin name or password")
        );
    }

    #[tokio::test]
    async fn test_digit_keys_switch_kind() {
        let mut app = signed_in(Arc::new(MemoryStore::new())).await;
        assert_eq!(app.console.active_kind(), EntityKind::Creators);

        app.dispatch(key(KeyCode::Char('2'))).await;
        assert_eq!(app.console.active_kind(), EntityKind::Projects);

        app.focus = Focus::Tabs;
        app.dispatch(key(KeyCode::Left)).await;
        assert_eq!(app.console.active_kind(), EntityKind::Creators);
    }

    #[tokio::test]
    async fn test_create_project_from_keys() {
        let store = Arc::new(MemoryStore::new());
        let mut app = signed_in(store.clone()).await;
        app.dispatch(key(KeyCode::Char('2'))).await;

        // projectTitle is the first field.
        app.dispatch(key(KeyCode::Enter)).await;
        assert!(app.editor.is_some());
        type_text(&mut app, "Bridge").await;
        app.dispatch(key(KeyCode::Enter)).await;
        assert!(app.editor.is_none());

        // fundGoal
        app.dispatch(key(KeyCode::Down)).await;
        app.dispatch(key(KeyCode::Down)).await;
        app.dispatch(key(KeyCode::Enter)).await;
        type_text(&mut app, "1500").await;
        app.dispatch(key(KeyCode::Esc)).await;

        // projectStatus: pending -> approved
        app.field_index = 4;
        app.dispatch(key(KeyCode::Right)).await;

        app.dispatch(ctrl('s')).await;

        assert_eq!(store.len(EntityKind::Projects).await, 1);
        let project = &app.console.instances()[0];
        assert_eq!(project.fields["projectTitle"], json!("Bridge"));
        assert_eq!(project.fields["fundGoal"], json!(1500));
        assert_eq!(project.fields["projectStatus"], json!("approved"));
        assert_eq!(
            app.console.notice().map(|notice| notice.level),
            Some(NoticeLevel::Success)
        );
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(
                EntityKind::Creators,
                json!({"name": "Ada"}).as_object().unwrap().clone(),
            )
            .await
            .unwrap();
        let mut app = signed_in(store.clone()).await;

        app.focus = Focus::Table;
        app.dispatch(key(KeyCode::Down)).await;
        app.dispatch(key(KeyCode::Char('d'))).await;
        assert!(app.console.pending_delete().is_some());
        app.dispatch(key(KeyCode::Char('n'))).await;
        assert_eq!(store.len(EntityKind::Creators).await, 1);

        app.dispatch(key(KeyCode::Char('d'))).await;
        app.dispatch(key(KeyCode::Char('y'))).await;
        assert_eq!(store.len(EntityKind::Creators).await, 0);
        assert_eq!(app.table_state.selected(), None);
    }

    #[tokio::test]
    async fn test_edit_row_then_escape_cancels() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(
                EntityKind::Creators,
                json!({"name": "Ada"}).as_object().unwrap().clone(),
            )
            .await
            .unwrap();
        let mut app = signed_in(store).await;

        app.focus = Focus::Table;
        app.dispatch(key(KeyCode::Down)).await;
        app.dispatch(key(KeyCode::Char('e'))).await;
        assert!(matches!(app.console.edit_state(), EditState::Editing(_)));
        assert_eq!(app.focus, Focus::Form);

        app.dispatch(key(KeyCode::Esc)).await;
        assert_eq!(app.console.edit_state(), EditState::Idle);
        assert!(!app.exit);

        app.dispatch(key(KeyCode::Esc)).await;
        assert!(app.exit);
    }

    #[test]
    fn test_cycle_option_wraps() {
        let options = ["a", "b", "c"];
        assert_eq!(cycle_option(&options, "c", true), "a");
        assert_eq!(cycle_option(&options, "a", false), "c");
        assert_eq!(cycle_option(&options, "zzz", true), "a");
    }
}
