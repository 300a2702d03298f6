use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_api::{
    application::{statistics::StatusSummary, todo_service::{TodoService, TodoServiceImpl}},
    config::Config,
    domain::{query::ListParams, repository::TodoRepository, todo::{OwnerId, Todo, TodoStatus}, validation::TodoInput},
    infrastructure::sqlite_repo::SqliteTodoRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    let owner = std::env::var("TODO_OWNER").ok().and_then(|raw| OwnerId::parse(&raw)).unwrap_or_else(|| OwnerId::new("local"));
    let repo = SqliteTodoRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TodoServiceImpl::new(repo);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service, owner).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Search }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Sort { Newest, DueSoonest, Title }

impl Sort {
    fn next(self) -> Self { match self { Sort::Newest => Sort::DueSoonest, Sort::DueSoonest => Sort::Title, Sort::Title => Sort::Newest } }
    fn params(self) -> (&'static str, &'static str) {
        match self { Sort::Newest => ("createdAt", "desc"), Sort::DueSoonest => ("dueDate", "asc"), Sort::Title => ("title", "asc") }
    }
}

struct App<R: TodoRepository> {
    service: TodoServiceImpl<R>,
    owner: OwnerId,
    items: Vec<Todo>,
    summary: StatusSummary,
    selected: usize,
    list_state: ListState,
    mode: Mode,
    /// `None` shows every status.
    filter: Option<TodoStatus>,
    sort: Sort,
    search: String,
    draft_title: String,
    notice: Option<String>,
}

impl<R: TodoRepository> App<R> {
    async fn load(&mut self) -> Result<()> {
        let (sort_by, sort_order) = self.sort.params();
        let params = ListParams {
            status: self.filter.map(|s| s.as_str().to_string()),
            search: Some(self.search.clone()),
            sort_by: Some(sort_by.into()),
            sort_order: Some(sort_order.into()),
            ..ListParams::default()
        };
        self.items = self.service.list(&self.owner, &params).await?.todos;
        self.summary = self.service.summary(&self.owner).await?;
        let len = self.items.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
        Ok(())
    }

    fn current(&self) -> Option<&Todo> { self.items.get(self.selected) }

    async fn advance_status(&mut self) -> Result<()> {
        if let Some(todo) = self.current() {
            let (id, next) = (todo.id, todo.status.next());
            let patch = TodoInput::default().with_status(next);
            if let Err(err) = self.service.update(&self.owner, id, patch).await { self.notice = Some(err.to_string()); }
        }
        self.load().await
    }

    async fn delete_current(&mut self) -> Result<()> {
        if let Some(id) = self.current().map(|t| t.id) {
            if let Err(err) = self.service.delete(&self.owner, id).await { self.notice = Some(err.to_string()); }
            if self.selected > 0 { self.selected -= 1; }
        }
        self.load().await
    }

    async fn save_draft(&mut self) -> Result<()> {
        let input = TodoInput::titled(std::mem::take(&mut self.draft_title));
        match self.service.create(&self.owner, input).await {
            Ok(todo) => self.notice = Some(format!("created \"{}\"", todo.title)),
            Err(err) => self.notice = Some(err.to_string()),
        }
        self.load().await
    }
}

fn filter_label(filter: Option<TodoStatus>) -> &'static str { filter.map_or("All", |s| s.as_str()) }

fn next_filter(filter: Option<TodoStatus>) -> Option<TodoStatus> {
    match filter {
        None => Some(TodoStatus::Pending),
        Some(TodoStatus::Pending) => Some(TodoStatus::InProgress),
        Some(TodoStatus::InProgress) => Some(TodoStatus::Completed),
        Some(TodoStatus::Completed) => None,
    }
}

fn status_mark(status: TodoStatus) -> &'static str {
    match status { TodoStatus::Pending => "[ ]", TodoStatus::InProgress => "[~]", TodoStatus::Completed => "[x]" }
}

async fn run_app<R: TodoRepository>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: TodoServiceImpl<R>, owner: OwnerId) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { service, owner, items: vec![], summary: StatusSummary::default(), selected: 0, list_state: ListState::default(), mode: Mode::View, filter: None, sort: Sort::Newest, search: String::new(), draft_title: String::new(), notice: None };
    app.load().await?;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
                .split(f.size());

            let s = &app.summary;
            let header = Paragraph::new(format!(
                "total {}  pending {}  in progress {}  completed {}   |   s: next status, n: new, d: delete, f: filter, /: search, o: sort, q: quit",
                s.total, s.pending, s.in_progress, s.completed
            ))
            .block(Block::default().borders(Borders::ALL).title(format!("todos for {}", app.owner)));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.items.iter().map(|t| ListItem::new(format!("{} {}", status_mark(t.status), t.title))).collect();
            let (sort_by, sort_order) = app.sort.params();
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("[{}] search=\"{}\" sort={} {}", filter_label(app.filter), app.search, sort_by, sort_order)))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = app.current().map(|t| format!(
                "Title:\n{}\n\nStatus: {}\nCategory: {}\nDue: {}\n\nDescription:\n{}",
                t.title,
                t.status,
                t.category.as_deref().unwrap_or("-"),
                t.due_date.map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string()).unwrap_or_else(|| "-".into()),
                t.description.as_deref().unwrap_or("(no description)"),
            )).unwrap_or_default();
            f.render_widget(Paragraph::new(detail).block(Block::default().borders(Borders::ALL).title("details")), middle[1]);

            let footer_text = match app.mode {
                Mode::View => app.notice.clone().unwrap_or_default(),
                Mode::Create => format!("Title: {}_  |  (Enter to save, Esc to cancel)", app.draft_title),
                Mode::Search => format!("Search: {}_  |  (Enter to keep, Esc to clear)", app.search),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Search => "search" }));
            f.render_widget(footer, chunks[2]);
        })?;

        if !event::poll(tick_rate)? { continue; }
        let Event::Key(key) = event::read()? else { continue };
        // Only act on key presses; ignore repeats and releases to prevent duplicate input
        if key.kind != KeyEventKind::Press { continue; }
        match app.mode {
            Mode::View => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Up => { if app.selected > 0 { app.selected -= 1; app.list_state.select(Some(app.selected)); } }
                KeyCode::Down => { if app.selected + 1 < app.items.len() { app.selected += 1; app.list_state.select(Some(app.selected)); } }
                KeyCode::Enter | KeyCode::Char('s') => app.advance_status().await?,
                KeyCode::Char('d') => app.delete_current().await?,
                KeyCode::Char('n') => { app.mode = Mode::Create; app.draft_title.clear(); app.notice = None; }
                KeyCode::Char('/') => { app.mode = Mode::Search; }
                KeyCode::Char('f') => { app.filter = next_filter(app.filter); app.load().await?; }
                KeyCode::Char('o') => { app.sort = app.sort.next(); app.load().await?; }
                _ => {}
            },
            Mode::Create => match key.code {
                KeyCode::Esc => { app.mode = Mode::View; app.draft_title.clear(); }
                KeyCode::Enter => { app.mode = Mode::View; app.save_draft().await?; }
                KeyCode::Backspace => { app.draft_title.pop(); }
                KeyCode::Char(c) => app.draft_title.push(c),
                _ => {}
            },
            Mode::Search => match key.code {
                KeyCode::Esc => { app.mode = Mode::View; app.search.clear(); app.load().await?; }
                KeyCode::Enter => { app.mode = Mode::View; }
                KeyCode::Backspace => { app.search.pop(); app.load().await?; }
                KeyCode::Char(c) => { app.search.push(c); app.load().await?; }
                _ => {}
            },
        }
    }
    Ok(())
}
