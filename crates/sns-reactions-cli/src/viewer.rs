use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use sns_reactions_engine::{FeedService, JsonFileStore, MessageStore, PageSet};
use std::io::{Stdout, stdout};

use crate::render::render_page_set;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Rendered,
    Markup,
}

struct App {
    service: FeedService<JsonFileStore>,
    message_ids: Vec<String>,
    message_list_state: ListState,
    pages: PageSet,
    mode: ViewMode,
    status: String,
}

impl App {
    fn new(service: FeedService<JsonFileStore>) -> Result<Self> {
        let message_ids = service.store().message_ids()?;

        let mut app = Self {
            service,
            message_ids,
            message_list_state: ListState::default(),
            pages: PageSet::new(),
            mode: ViewMode::Rendered,
            status: String::new(),
        };

        // Select first message if available
        if !app.message_ids.is_empty() {
            app.message_list_state.select(Some(0));
            app.reload();
        }

        Ok(app)
    }

    fn selected_id(&self) -> Option<&str> {
        self.message_list_state
            .selected()
            .and_then(|i| self.message_ids.get(i))
            .map(String::as_str)
    }

    fn reload(&mut self) {
        let Some(id) = self.selected_id() else {
            self.pages = PageSet::new();
            return;
        };
        match self.service.load(id) {
            Ok(pages) => self.pages = pages,
            Err(e) => {
                self.status = format!("Error loading message {id}: {e}");
                self.pages = PageSet::new();
            }
        }
    }

    fn next_message(&mut self) {
        if self.message_ids.is_empty() {
            return;
        }
        let i = match self.message_list_state.selected() {
            Some(i) => (i + 1) % self.message_ids.len(),
            None => 0,
        };
        self.message_list_state.select(Some(i));
        self.reload();
    }

    fn previous_message(&mut self) {
        if self.message_ids.is_empty() {
            return;
        }
        let i = match self.message_list_state.selected() {
            Some(0) | None => self.message_ids.len() - 1,
            Some(i) => i - 1,
        };
        self.message_list_state.select(Some(i));
        self.reload();
    }

    /// Apply a stored mutation to the selected message and refresh the view.
    fn mutate(
        &mut self,
        describe: &str,
        f: impl FnOnce(&FeedService<JsonFileStore>, &str) -> Result<()>,
    ) {
        let Some(id) = self.selected_id().map(str::to_string) else {
            return;
        };
        self.status = match f(&self.service, &id) {
            Ok(()) => describe.to_string(),
            Err(e) => format!("Error: {e}"),
        };
        self.reload();
    }

    fn change_page(&mut self, forward: bool) {
        let mut moved = self.pages.clone();
        let changed = if forward {
            moved.next_page()
        } else {
            moved.prev_page()
        };
        if changed {
            let index = moved.page_index();
            self.mutate("", |service, id| Ok(service.select_page(id, index)?));
        }
    }

    fn delete_page(&mut self) {
        if self.pages.is_empty() {
            return;
        }
        let index = self.pages.page_index();
        self.mutate("Page deleted", |service, id| {
            service.delete_page(id, index)?;
            Ok(())
        });
    }

    fn toggle_collapsed(&mut self) {
        self.mutate("", |service, id| {
            service.toggle_collapsed(id)?;
            Ok(())
        });
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ViewMode::Rendered => ViewMode::Markup,
            ViewMode::Markup => ViewMode::Rendered,
        };
    }

    fn content_lines(&self) -> Vec<String> {
        match self.mode {
            ViewMode::Rendered => render_page_set(&self.pages),
            ViewMode::Markup => self
                .pages
                .editable_text(self.pages.page_index())
                .map(|text| text.lines().map(str::to_string).collect())
                .unwrap_or_else(|| vec!["No page to edit".to_string()]),
        }
    }
}

pub fn run(service: FeedService<JsonFileStore>) -> Result<()> {
    // Create app before touching the terminal so store errors print normally
    let mut app = App::new(service)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_message(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_message(),
                KeyCode::Right | KeyCode::Char('l') => app.change_page(true),
                KeyCode::Left | KeyCode::Char('h') => app.change_page(false),
                KeyCode::Char('d') => app.delete_page(),
                KeyCode::Char('c') => app.toggle_collapsed(),
                KeyCode::Char('e') => app.toggle_mode(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(rows[0]);

    // Message list panel
    let message_items: Vec<ListItem> = app
        .message_ids
        .iter()
        .map(|id| ListItem::new(Line::from(Span::raw(format!("# {id}")))))
        .collect();

    let message_list = List::new(message_items)
        .block(Block::default().borders(Borders::ALL).title("Messages"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(message_list, chunks[0], &mut app.message_list_state);

    // Page panel
    let title = match app.mode {
        ViewMode::Rendered => "Reactions",
        ViewMode::Markup => "Markup",
    };
    let content_text: Vec<Line> = app.content_lines().into_iter().map(Line::from).collect();
    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });

    f.render_widget(content, chunks[1]);

    // Instructions and status
    let help = Paragraph::new(vec![
        Line::from("q: Quit | ↑↓: Message | ←→: Page | d: Delete page | c: Collapse | e: Markup"),
        Line::from(Span::styled(
            app.status.clone(),
            Style::default().fg(Color::Yellow),
        )),
    ]);

    f.render_widget(help, rows[1]);
}
