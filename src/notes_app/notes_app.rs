use crate::notes_app::models::Account;
use crate::notes_app::SessionController;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::*;
use ratatui::{
    layout::Layout,
    widgets::{Block, Borders, Clear, List, ListDirection, ListItem, ListState, Padding, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::Result;
use std::rc::Rc;
use tokio::runtime::Handle;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

enum InputMode {
    Normal,
    Insert,
}

pub struct App {
    exit: bool,
    accounts: Vec<Account>,
    controller: SessionController,
    runtime: Handle,
    input: Input,
    input_mode: InputMode,
    // id of the note whose content is loaded into the draft
    editing: Option<i64>,
    show_help: bool,
}

impl App {
    pub fn new(controller: SessionController, accounts: Vec<Account>, runtime: Handle) -> App {
        App {
            exit: false,
            accounts,
            controller,
            runtime,
            input: Input::default(),
            input_mode: InputMode::Normal,
            editing: None,
            show_help: false,
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut list_state = ListState::default().with_selected(Some(0));
        while !self.exit {
            terminal.draw(|frame| self.draw(frame, &mut list_state))?;
            self.handle_events(&mut list_state)?;
        }
        Ok(())
    }

    // Drawing only reads state; it never talks to the API.
    fn draw(&self, frame: &mut Frame, list_state: &mut ListState) {
        if self.controller.session().is_logged_in() {
            self.draw_notes(frame, list_state);
        } else {
            self.draw_login(frame, list_state);
        }

        if self.show_help {
            self.render_help_popup(frame);
        }
    }

    fn draw_login(&self, frame: &mut Frame, list_state: &mut ListState) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let title = Paragraph::new("Login")
            .block(Block::default().borders(Borders::ALL).title(" SaaS Notes "))
            .alignment(Alignment::Center);
        let items: Vec<String> = self
            .accounts
            .iter()
            .map(|account| account.label.to_owned())
            .collect();
        let list = List::new(items)
            .block(Block::new().borders(Borders::ALL))
            .highlight_style(Style::new().black().bg(Color::Green))
            .direction(ListDirection::TopToBottom);

        frame.render_widget(title, layout[0]);
        frame.render_stateful_widget(list, layout[1], list_state);
        self.render_error(frame, layout[2]);
        frame.render_widget(
            Paragraph::new("enter: login  j/k: move  ?: help  q: quit").dark_gray(),
            layout[3],
        );
    }

    fn draw_notes(&self, frame: &mut Frame, list_state: &mut ListState) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let input_style = match self.input_mode {
            InputMode::Normal => Style::default(),
            InputMode::Insert => Style::default().fg(Color::Green),
        };
        let input_title = match self.editing {
            Some(_) => " Edit note ",
            None => " Write a note ",
        };
        let input_area = layout[0];
        let width = input_area.width.max(3) - 3; // keep 2 for borders and 1 for cursor
        let scroll = self.input.visual_scroll(width as usize);
        let input = Paragraph::new(self.input.value())
            .style(input_style)
            .scroll((0, scroll as u16))
            .block(Block::default().borders(Borders::ALL).title(input_title));
        frame.render_widget(input, input_area);
        if let InputMode::Insert = self.input_mode {
            frame.set_cursor_position((
                input_area.x + ((self.input.visual_cursor()).max(scroll) - scroll) as u16 + 1,
                input_area.y + 1,
            ));
        }

        let notes_area = layout[1];
        let wrap_width = (notes_area.width.saturating_sub(2) as usize).max(1);
        let session = self.controller.session();
        let notes_title = match &session.plan {
            Some(plan) => format!(" Your Notes ({plan} plan) "),
            None => " Your Notes ".to_string(),
        };
        let notes = &session.notes;
        if notes.is_empty() {
            let empty = Paragraph::new("No notes (press \"i\" to write one or \"q\" to quit)")
                .block(Block::default().borders(Borders::ALL).title(notes_title))
                .alignment(Alignment::Center);
            frame.render_widget(empty, notes_area);
        } else {
            let items: Vec<ListItem> = notes
                .iter()
                .map(|note| {
                    let lines: Vec<Line> = textwrap::wrap(&note.content, wrap_width)
                        .into_iter()
                        .map(|line| Line::from(line.into_owned()))
                        .collect();
                    ListItem::new(lines)
                })
                .collect();
            let list = List::new(items)
                .block(Block::new().borders(Borders::ALL).title(notes_title))
                .highlight_style(Style::new().black().bg(Color::Green))
                .direction(ListDirection::TopToBottom);
            frame.render_stateful_widget(list, notes_area, list_state);
        }

        self.render_error(frame, layout[2]);
        let hint = match (&self.input_mode, self.editing) {
            (InputMode::Normal, _) => {
                "i: write  e: edit  j/k: move  d: delete  r: refresh  U: upgrade  L: logout  ?: help  q: quit"
            }
            (InputMode::Insert, Some(_)) => "enter: save note  esc: cancel edit",
            (InputMode::Insert, None) => "enter: add note  esc: stop writing",
        };
        frame.render_widget(Paragraph::new(hint).dark_gray(), layout[3]);
    }

    fn render_error(&self, frame: &mut Frame, area: Rect) {
        if let Some(error) = &self.controller.session().error {
            frame.render_widget(Paragraph::new(error.as_str()).red(), area);
        }
    }

    fn render_help_popup(&self, frame: &mut Frame) {
        let vertical_layout = self.get_popup_layout(frame);
        let lines: Vec<Line> = if self.controller.session().is_logged_in() {
            vec![
                "i: write a note".into(),
                "e: edit selected note".into(),
                "enter: add or save the note (while writing)".into(),
                "esc: stop writing".into(),
                "j: move down".into(),
                "k: move up".into(),
                "d: delete selected note".into(),
                "r: refresh notes".into(),
                "U: upgrade tenant to pro (admins)".into(),
                "L: log out".into(),
                "?: toggle help".into(),
                "q: quit".into(),
            ]
        } else {
            vec![
                "j: move down".into(),
                "k: move up".into(),
                "enter: log in as selected account".into(),
                "?: toggle help".into(),
                "q: quit".into(),
            ]
        };
        let help_paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" SaaS Notes Help ")
                    .title_alignment(Alignment::Center)
                    .padding(Padding::uniform(1)),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(Clear, vertical_layout[1]);
        frame.render_widget(help_paragraph, vertical_layout[1]);
    }

    fn get_popup_layout(&self, frame: &mut Frame) -> Rc<[Rect]> {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Percentage(20),
                Constraint::Percentage(60),
                Constraint::Percentage(20),
            ])
            .split(frame.area());
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![
                Constraint::Percentage(25),
                Constraint::Percentage(50),
                Constraint::Percentage(25),
            ])
            .split(popup_layout[1])
    }

    fn handle_events(&mut self, list_state: &mut ListState) -> Result<()> {
        if let Event::Key(key_event) = crossterm::event::read()? {
            if key_event.kind == KeyEventKind::Press {
                self.handle_key_events(key_event, list_state);
            }
        }
        Ok(())
    }

    fn handle_key_events(&mut self, event: KeyEvent, list_state: &mut ListState) {
        if self.show_help {
            if matches!(event.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }
        if !self.controller.session().is_logged_in() {
            self.handle_login_key_events(event, list_state);
            return;
        }
        match self.input_mode {
            InputMode::Normal => self.handle_notes_key_events(event, list_state),
            InputMode::Insert => self.handle_insert_key_events(event, list_state),
        }
    }

    fn handle_login_key_events(&mut self, event: KeyEvent, list_state: &mut ListState) {
        match event.code {
            KeyCode::Char('q') => self.exit = true,
            KeyCode::Char('j') => select_next_wrapping(list_state, self.accounts.len()),
            KeyCode::Char('k') => list_state.select_previous(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Enter => {
                let Some(account) = list_state
                    .selected()
                    .and_then(|selected| self.accounts.get(selected))
                    .cloned()
                else {
                    return;
                };
                self.runtime
                    .block_on(self.controller.login(&account.email, &account.password));
                if self.controller.session().is_logged_in() {
                    self.input_mode = InputMode::Normal;
                    self.sync_input();
                    list_state.select(None);
                    self.clamp_selection(list_state);
                }
            }
            _ => {}
        }
    }

    fn handle_notes_key_events(&mut self, event: KeyEvent, list_state: &mut ListState) {
        let note_count = self.controller.session().notes.len();
        match event.code {
            KeyCode::Char('q') => self.exit = true,
            KeyCode::Char('i') => self.input_mode = InputMode::Insert,
            KeyCode::Char('j') => select_next_wrapping(list_state, note_count),
            KeyCode::Char('k') => list_state.select_previous(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('r') => {
                self.runtime.block_on(self.controller.fetch_notes());
                self.clamp_selection(list_state);
            }
            KeyCode::Char('e') => {
                let Some(note) = list_state
                    .selected()
                    .and_then(|selected| self.controller.session().notes.get(selected))
                    .cloned()
                else {
                    return;
                };
                self.controller.set_draft(&note.content);
                self.sync_input();
                self.editing = Some(note.id);
                self.input_mode = InputMode::Insert;
            }
            KeyCode::Char('d') => {
                let Some(id) = list_state
                    .selected()
                    .and_then(|selected| self.controller.session().notes.get(selected))
                    .map(|note| note.id)
                else {
                    return;
                };
                self.runtime.block_on(self.controller.delete_note(id));
                self.clamp_selection(list_state);
            }
            KeyCode::Char('U') => self.runtime.block_on(self.controller.upgrade_tenant()),
            KeyCode::Char('L') => {
                self.controller.logout();
                self.sync_input();
                self.editing = None;
                list_state.select(Some(0));
            }
            _ => {}
        }
    }

    fn handle_insert_key_events(&mut self, event: KeyEvent, list_state: &mut ListState) {
        match event.code {
            KeyCode::Esc => {
                if self.editing.take().is_some() {
                    self.controller.set_draft("");
                    self.sync_input();
                }
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                match self.editing {
                    Some(id) => {
                        self.runtime.block_on(self.controller.update_note(id));
                        if self.controller.session().draft.is_empty() {
                            self.editing = None;
                            self.input_mode = InputMode::Normal;
                        }
                    }
                    None => self.runtime.block_on(self.controller.add_note()),
                }
                self.sync_input();
                self.clamp_selection(list_state);
            }
            _ => {
                self.input.handle_event(&Event::Key(event));
                self.controller.set_draft(self.input.value());
            }
        }
    }

    // The session owns the draft; the input widget mirrors it.
    fn sync_input(&mut self) {
        let draft = &self.controller.session().draft;
        if self.input.value() != draft {
            self.input = Input::new(draft.clone());
        }
    }

    fn clamp_selection(&self, list_state: &mut ListState) {
        let len = self.controller.session().notes.len();
        if len == 0 {
            list_state.select(None);
        } else {
            let selected = list_state.selected().unwrap_or(0).min(len - 1);
            list_state.select(Some(selected));
        }
    }
}

fn select_next_wrapping(list_state: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let selected = list_state.selected().unwrap_or(0);
    if selected >= len - 1 {
        list_state.select_first();
    } else {
        list_state.select_next();
    }
}
