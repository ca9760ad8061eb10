use crate::age::Accent;
use crate::config::Settings;
use crate::controller::{BoardController, Clock, Controller, SystemClock};
use crate::model::{BoardError, ColumnId, Task, TaskId};
use crate::storage::{BoardLocation, FileStore};
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

/// Rows taken by one task card: title, description, age label, spacer.
const ITEM_HEIGHT: u16 = 4;
const EMPTY_TITLE_WARNING: &str = "Please enter a task title";

pub fn run(controller: BoardController, location: BoardLocation, settings: Settings) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(controller, location, &settings);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App<C: Clock = SystemClock> {
    controller: Controller<FileStore, C>,
    location: BoardLocation,
    board_name: String,
    selected_column: usize,
    selected_task: usize,
    scroll_offsets: [usize; 3],
    column_areas: [Rect; 3],
    last_save: Option<Instant>,
    last_sweep: Instant,
    sweep_every: Duration,
    /// Task under the pointer when the left button went down; a drag starts
    /// from it on the first motion.
    mouse_press: Option<TaskId>,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    Adding(TaskForm),
    /// Blocking warning; dismissing it returns to the form.
    Alert { message: String, form: TaskForm },
}

struct TaskForm {
    title: FieldValue,
    desc: FieldValue,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    Title,
    Desc,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new() -> Self {
        FieldValue {
            value: String::new(),
            cursor: 0,
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char_boundary(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char_boundary(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl TaskForm {
    fn new() -> Self {
        TaskForm {
            title: FieldValue::new(),
            desc: FieldValue::new(),
            field: FormField::Title,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Desc,
            FormField::Desc => FormField::Title,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FormField::Title => &mut self.title,
            FormField::Desc => &mut self.desc,
        }
    }
}

impl<C: Clock> App<C> {
    fn new(controller: Controller<FileStore, C>, location: BoardLocation, settings: &Settings) -> Self {
        let status = format!("Loaded board from {}", location.dir.display());
        App {
            controller,
            board_name: settings.board_name(&location),
            location,
            selected_column: 0,
            selected_task: 0,
            scroll_offsets: [0; 3],
            column_areas: [Rect::default(); 3],
            last_save: None,
            last_sweep: Instant::now(),
            sweep_every: settings.sweep_interval(),
            mouse_press: None,
            status,
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                let quit = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => {
                        self.handle_mouse(mouse);
                        false
                    }
                    _ => false,
                };
                if quit {
                    break;
                }
            }
            self.tick();
        }
        Ok(())
    }

    fn tick(&mut self) {
        if self.last_sweep.elapsed() >= self.sweep_every {
            self.run_sweep();
        }
    }

    fn run_sweep(&mut self) {
        self.last_sweep = Instant::now();
        match self.controller.sweep() {
            Ok(moved) if !moved.is_empty() => {
                self.last_save = Some(Instant::now());
                self.status = format!(
                    "Auto-moved {} stale task(s) to {}",
                    moved.len(),
                    ColumnId::Progress.display_name()
                );
                self.clamp_selection();
            }
            Ok(_) => {}
            Err(err) => self.status = format!("Save failed: {:#}", err),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Adding(_) => {
                self.handle_form_key(key);
                false
            }
            Mode::Alert { .. } => {
                if let Mode::Alert { form, .. } = std::mem::replace(&mut self.mode, Mode::Normal) {
                    self.mode = Mode::Adding(form);
                }
                false
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        let dragging = self.controller.drag().is_some();
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('n') => {
                self.controller.cancel_drag();
                self.mode = Mode::Adding(TaskForm::new());
                self.status = "New task (Tab switch field, Enter add, Esc cancel)".into();
            }
            KeyCode::Left | KeyCode::Char('h') => self.shift_column(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_column(1),
            KeyCode::Up | KeyCode::Char('k') if !dragging => self.prev_task(),
            KeyCode::Down | KeyCode::Char('j') if !dragging => self.next_task(),
            KeyCode::Char(' ') if !dragging => self.pick_up_selected(),
            KeyCode::Char(' ') | KeyCode::Enter if dragging => {
                if let Some(column) = ColumnId::from_index(self.selected_column) {
                    self.drop_on(column);
                }
            }
            KeyCode::Esc if dragging => {
                self.controller.cancel_drag();
                self.status = "Drag canceled".into();
            }
            KeyCode::Char('x') if !dragging => self.mark_selected_done(),
            KeyCode::Char('d') if !dragging => self.delete_selected(),
            _ => {}
        }
        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Mode::Adding(mut form) = std::mem::replace(&mut self.mode, Mode::Normal) else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Left => form.active_field_mut().move_left(),
            KeyCode::Right => form.active_field_mut().move_right(),
            KeyCode::Backspace => form.active_field_mut().backspace(),
            KeyCode::Enter => {
                self.submit_form(form);
                return;
            }
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.active_field_mut().insert_char(c);
                }
            }
            _ => {}
        }
        self.mode = Mode::Adding(form);
    }

    fn submit_form(&mut self, form: TaskForm) {
        match self
            .controller
            .create_task(&form.title.value, &form.desc.value)
        {
            Ok(id) => {
                self.last_save = Some(Instant::now());
                self.status = format!("Created task {}", id);
                self.select_task(&id);
            }
            Err(err) if err.downcast_ref::<BoardError>() == Some(&BoardError::EmptyTitle) => {
                self.mode = Mode::Alert {
                    message: EMPTY_TITLE_WARNING.into(),
                    form,
                };
            }
            Err(err) => {
                self.status = format!("Could not save new task: {:#}", err);
                self.clamp_selection();
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(self.mode, Mode::Normal) {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.controller.cancel_drag();
                self.mouse_press = None;
                if let Some((col, idx)) = self.task_at(mouse.column, mouse.row) {
                    self.selected_column = col;
                    self.selected_task = idx;
                    self.mouse_press = self.selected_task_id();
                } else if let Some(col) = self.column_at(mouse.column, mouse.row) {
                    self.selected_column = col;
                    self.clamp_selection();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(id) = self.mouse_press.take() {
                    if self.controller.begin_drag(&id) {
                        self.status = format!("Dragging \"{}\" (release over a column to drop)", self.task_title(&id));
                    }
                }
                let hover = self
                    .column_at(mouse.column, mouse.row)
                    .and_then(ColumnId::from_index);
                self.controller.hover(hover);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.mouse_press = None;
                if self.controller.drag().is_none() {
                    return;
                }
                let target = self
                    .column_at(mouse.column, mouse.row)
                    .and_then(ColumnId::from_index);
                match target {
                    Some(column) => self.drop_on(column),
                    None => {
                        self.controller.cancel_drag();
                        self.status = "Drag canceled".into();
                    }
                }
            }
            _ => {}
        }
    }

    fn pick_up_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            self.status = "No task selected to drag".into();
            return;
        };
        if self.controller.begin_drag(&id) {
            let title = self.task_title(&id);
            self.status = format!("Dragging \"{}\" (←→ choose column, Space drop, Esc cancel)", title);
        }
    }

    fn drop_on(&mut self, column: ColumnId) {
        match self.controller.drop_on(column) {
            Ok(Some(id)) => {
                self.last_save = Some(Instant::now());
                self.status = format!("Moved \"{}\" to {}", self.task_title(&id), column.display_name());
                self.select_task(&id);
            }
            Ok(None) => {}
            Err(err) => {
                self.status = format!("Move failed: {:#}", err);
                self.clamp_selection();
            }
        }
    }

    fn mark_selected_done(&mut self) {
        let Some(id) = self.selected_task_id() else {
            self.status = "No task selected".into();
            return;
        };
        if !self.controller.board().done_action_visible(&id) {
            self.status = "Task is already done".into();
            return;
        }
        match self.controller.mark_done(&id) {
            Ok(()) => {
                self.last_save = Some(Instant::now());
                self.status = format!("Completed \"{}\"", self.task_title(&id));
                self.clamp_selection();
            }
            Err(err) => self.status = format!("Could not complete: {:#}", err),
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            self.status = "No task selected to delete".into();
            return;
        };
        let title = self.task_title(&id);
        match self.controller.delete_task(&id) {
            Ok(true) => {
                self.last_save = Some(Instant::now());
                self.status = format!("Deleted \"{}\"", title);
            }
            Ok(false) => {}
            Err(err) => self.status = format!("Delete not saved: {:#}", err),
        }
        self.clamp_selection();
    }

    fn shift_column(&mut self, delta: isize) {
        let target = (self.selected_column as isize + delta).clamp(0, 2) as usize;
        if target == self.selected_column {
            return;
        }
        self.selected_column = target;
        self.selected_task = 0;
        if self.controller.drag().is_some() {
            self.controller.hover(ColumnId::from_index(target));
        }
    }

    fn prev_task(&mut self) {
        if self.selected_task > 0 {
            self.selected_task -= 1;
        }
    }

    fn next_task(&mut self) {
        if self.selected_task + 1 < self.column_len(self.selected_column) {
            self.selected_task += 1;
        }
    }

    fn column_len(&self, idx: usize) -> usize {
        ColumnId::from_index(idx)
            .map(|c| self.controller.board().count(c))
            .unwrap_or(0)
    }

    fn clamp_selection(&mut self) {
        let len = self.column_len(self.selected_column);
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    fn select_task(&mut self, id: &str) {
        let board = self.controller.board();
        if let Some(column) = board.column_of(id) {
            self.selected_column = column.index();
            self.selected_task = board
                .column(column)
                .task_ids
                .iter()
                .position(|t| t == id)
                .unwrap_or(0);
        }
    }

    fn selected_task_id(&self) -> Option<TaskId> {
        let column = ColumnId::from_index(self.selected_column)?;
        self.controller
            .board()
            .column(column)
            .task_ids
            .get(self.selected_task)
            .cloned()
    }

    fn selected_task(&self) -> Option<&Task> {
        let id = self.selected_task_id()?;
        self.controller.board().task(&id)
    }

    fn task_title(&self, id: &str) -> String {
        self.controller
            .board()
            .task(id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn column_at(&self, x: u16, y: u16) -> Option<usize> {
        self.column_areas
            .iter()
            .position(|area| rect_contains(*area, x, y))
    }

    fn task_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let col = self.column_at(x, y)?;
        let inner = inner_rect(self.column_areas[col]);
        if !rect_contains(inner, x, y) {
            return None;
        }
        let idx = ((y - inner.y) / ITEM_HEIGHT) as usize + self.scroll_offsets[col];
        if idx < self.column_len(col) {
            Some((col, idx))
        } else {
            None
        }
    }

    fn draw(&mut self, f: &mut Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_board(f, layout[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Adding(form) => draw_form(f, form),
            Mode::Alert { message, .. } => draw_alert(f, message),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut Frame<'_>, area: Rect) {
        let saved = self
            .last_save
            .map(|t| format!("saved {}", format_elapsed(t)))
            .unwrap_or_else(|| "no changes".into());
        let next_sweep = self.sweep_every.saturating_sub(self.last_sweep.elapsed());
        let title = Line::from(vec![
            Span::styled(
                "taskboard ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.board_name.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(self.location.scope.label(), Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.dir.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(saved, Style::default().fg(Color::Gray)),
            Span::raw("  •  "),
            Span::styled(
                format!("sweep in {}s", next_sweep.as_secs()),
                Style::default().fg(Color::Magenta),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_board(&mut self, f: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(33),
                Constraint::Percentage(33),
                Constraint::Percentage(34),
            ])
            .split(area);

        let drag = self.controller.drag().cloned();
        for column in ColumnId::ALL {
            let idx = column.index();
            let chunk = chunks[idx];
            self.column_areas[idx] = chunk;
            let board = self.controller.board();
            let accent = column_color(column);
            let card_width = chunk.width.saturating_sub(4) as usize;
            let is_selected_column = idx == self.selected_column;

            let items = board
                .tasks_in(column)
                .enumerate()
                .map(|(t_idx, task)| {
                    let dragged = drag.as_ref().is_some_and(|d| d.task_id == task.id);
                    task_item(
                        task,
                        card_width,
                        is_selected_column && t_idx == self.selected_task,
                        dragged,
                    )
                })
                .collect::<Vec<_>>();

            let viewport = (chunk.height.saturating_sub(2) / ITEM_HEIGHT) as usize;
            let mut state = ListState::default();
            let mut offset = self.scroll_offsets[idx];
            if is_selected_column {
                offset = adjust_offset(self.selected_task, offset, viewport, items.len());
                state.select(Some(self.selected_task));
            } else {
                offset = offset.min(items.len().saturating_sub(viewport));
            }
            *state.offset_mut() = offset;
            self.scroll_offsets[idx] = offset;

            let hovered = drag.as_ref().and_then(|d| d.hover) == Some(column);
            let mut title = format!("{} ({})", column.display_name(), board.count(column));
            if hovered {
                title.push_str("  ⇣ drop here");
            }
            let border_style = if hovered {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(accent)
            };
            let block = Block::default()
                .title(Span::styled(
                    title,
                    border_style.add_modifier(if is_selected_column {
                        Modifier::BOLD | Modifier::UNDERLINED
                    } else {
                        Modifier::BOLD
                    }),
                ))
                .borders(Borders::ALL)
                .border_style(border_style)
                .style(Style::default().bg(Color::Rgb(16, 18, 24)));

            let list = List::new(items).block(block);
            f.render_stateful_widget(list, chunk, &mut state);
        }
    }

    fn draw_footer(&self, f: &mut Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let detail = match self.selected_task() {
            Some(task) => selected_task_detail(task),
            None => Line::from("No task selected"),
        };
        let detail = Paragraph::new(detail).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray))
                .title("Selected"),
        );
        f.render_widget(detail, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        if self.controller.drag().is_some() {
            return Line::from(vec![
                Span::styled("←→ / h l", Style::default().fg(Color::LightCyan)),
                Span::raw(" choose column  "),
                Span::styled("Space/Enter", Style::default().fg(Color::LightGreen)),
                Span::raw(" drop  "),
                Span::styled("Esc", Style::default().fg(Color::LightRed)),
                Span::raw(" cancel"),
            ]);
        }
        let mut spans = vec![
            Span::styled("←↑↓→ / h j k l", Style::default().fg(Color::LightCyan)),
            Span::raw(" navigate  "),
            Span::styled("Space", Style::default().fg(Color::LightGreen)),
            Span::raw(" drag  "),
            Span::styled("n", Style::default().fg(Color::LightMagenta)),
            Span::raw(" add task  "),
        ];
        let done_visible = self
            .selected_task_id()
            .is_some_and(|id| self.controller.board().done_action_visible(&id));
        if done_visible {
            spans.push(Span::styled("x", Style::default().fg(Color::LightGreen)));
            spans.push(Span::raw(" done  "));
        }
        spans.extend([
            Span::styled("d", Style::default().fg(Color::LightRed)),
            Span::raw(" delete  "),
            Span::styled("q", Style::default().fg(Color::LightRed)),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }
}

fn draw_form(f: &mut Frame<'_>, form: &TaskForm) {
    let area = centered_rect(60, 40, f.size());
    let mut lines = Vec::new();
    lines.push(field_line(
        "Title",
        &form.title,
        form.field == FormField::Title,
    ));
    lines.push(Line::from(""));
    lines.push(field_line(
        "Description",
        &form.desc,
        form.field == FormField::Desc,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter to add • Esc to cancel • Tab to switch field",
        Style::default().fg(Color::Gray),
    )));
    let dialog = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    "Add Task",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn draw_alert(f: &mut Frame<'_>, message: &str) {
    let area = centered_rect(40, 20, f.size());
    let body = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press any key to continue"),
    ];
    let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
        Block::default()
            .title(Span::styled(
                "Warning",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightRed)),
    );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn inner_rect(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

fn rect_contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

fn column_color(column: ColumnId) -> Color {
    match column {
        ColumnId::Todo => Color::Cyan,
        ColumnId::Progress => Color::LightBlue,
        ColumnId::Done => Color::LightGreen,
    }
}

fn accent_color(accent: Accent) -> Color {
    match accent {
        Accent::Default => Color::DarkGray,
        Accent::Warning => Color::Rgb(255, 152, 0),
        Accent::Completed => Color::Rgb(76, 175, 80),
    }
}

/// Smallest scroll change that keeps `selected` inside a window of `viewport` items.
fn adjust_offset(selected: usize, current_offset: usize, viewport: usize, len: usize) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let mut offset = current_offset.min(max_offset);
    if selected < offset {
        offset = selected;
    } else if selected >= offset + viewport {
        offset = selected + 1 - viewport;
    }
    offset.min(max_offset)
}

fn prev_char_boundary(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char_boundary(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out.chars().take(max).collect()
}

fn task_item(task: &Task, width: usize, selected: bool, dragged: bool) -> ListItem<'static> {
    let accent = task.label.accent();
    let bar = Span::styled("▌ ", Style::default().fg(accent_color(accent)));
    let label_color = match accent {
        Accent::Default => Color::Gray,
        other => accent_color(other),
    };
    let lines = vec![
        Line::from(vec![
            bar.clone(),
            Span::styled(
                truncate_text(&task.title, width),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            bar.clone(),
            Span::styled(
                truncate_text(task.description_or_placeholder(), width),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(vec![
            bar,
            Span::styled(
                truncate_text(&task.label.text(), width),
                Style::default().fg(label_color),
            ),
        ]),
        Line::from(""),
    ];
    let mut style = Style::default().bg(Color::Rgb(22, 24, 30));
    if selected {
        style = style
            .bg(Color::Rgb(48, 52, 66))
            .add_modifier(Modifier::BOLD);
    }
    if dragged {
        style = style.add_modifier(Modifier::DIM);
    }
    ListItem::new(lines).style(style)
}

fn field_line(label: &str, field: &FieldValue, active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(text, value_style),
    ])
}

fn selected_task_detail(task: &Task) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            task.title.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            task.description_or_placeholder().to_string(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        ),
        Span::raw("  "),
        Span::styled(
            task.label.text(),
            Style::default().fg(accent_color(task.label.accent())),
        ),
    ])
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}
