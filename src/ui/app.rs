use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info};

use crate::booklet::{self, Booklet};
use crate::catalog::Catalog;
use crate::search::RankDispatcher;

use super::filters::focus_block;
use super::helpers::{offset_index, scroll_window, surface_error};
use super::sidebar::{SearchBar, SidebarFocus, HANDLE_WIDTH, SIDEBAR_WIDTH};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const PAGE: isize = 5;

/// Everything the shell needs besides the catalog and the booklet.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub base_url: String,
    /// Below this terminal width, adding a song collapses the sidebar.
    pub collapse_width: u16,
}

/// Where keystrokes go. The first four live inside the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Sidebar(SidebarFocus),
    Booklet,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Sidebar(SidebarFocus::Search),
        Focus::Sidebar(SidebarFocus::Partitions),
        Focus::Sidebar(SidebarFocus::Tags),
        Focus::Sidebar(SidebarFocus::Songs),
        Focus::Booklet,
    ];

    fn step(self, delta: isize) -> Focus {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        let len = Self::ORDER.len() as isize;
        Self::ORDER[(idx + delta).rem_euclid(len) as usize]
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state: the booklet on the left, the search bar on the
/// right.
pub struct App {
    catalog: Catalog,
    sidebar: SearchBar,
    booklet: Booklet,
    booklet_selected: usize,
    focus: Focus,
    settings: AppSettings,
    viewport_width: u16,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(
        catalog: Catalog,
        booklet: Booklet,
        settings: AppSettings,
        dispatcher: Box<dyn RankDispatcher>,
    ) -> Result<Self> {
        let sidebar =
            SearchBar::new(&catalog, dispatcher).context("failed to start search pipeline")?;
        Ok(Self {
            catalog,
            sidebar,
            booklet,
            booklet_selected: 0,
            focus: Focus::Sidebar(SidebarFocus::Search),
            settings,
            viewport_width: u16::MAX,
            status: None,
        })
    }

    pub fn booklet(&self) -> &Booklet {
        &self.booklet
    }

    pub fn set_viewport_width(&mut self, width: u16) {
        self.viewport_width = width;
    }

    /// Called once per loop iteration; applies finished search results.
    pub fn tick(&mut self) {
        if self.sidebar.poll() {
            debug!(visible = self.sidebar.visible().len(), "search results updated");
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Tab => {
                self.move_focus(1);
                return Ok(false);
            }
            KeyCode::BackTab => {
                self.move_focus(-1);
                return Ok(false);
            }
            _ => {}
        }

        match self.focus {
            Focus::Sidebar(SidebarFocus::Search) => self.handle_search_key(code)?,
            Focus::Sidebar(SidebarFocus::Partitions) => match code {
                KeyCode::Left | KeyCode::Up => self.sidebar.cycle_partition(-1)?,
                KeyCode::Right | KeyCode::Down => self.sidebar.cycle_partition(1)?,
                _ => return Ok(is_quit(code)),
            },
            Focus::Sidebar(SidebarFocus::Tags) => match code {
                KeyCode::Up => self.sidebar.move_tag_cursor(-1),
                KeyCode::Down => self.sidebar.move_tag_cursor(1),
                KeyCode::PageUp => self.sidebar.move_tag_cursor(-PAGE),
                KeyCode::PageDown => self.sidebar.move_tag_cursor(PAGE),
                KeyCode::Char(' ') | KeyCode::Enter => {
                    if let Some((tag, chosen)) = self.sidebar.toggle_tag_under_cursor()? {
                        debug!(%tag, chosen, "tag toggled");
                    }
                }
                _ => return Ok(is_quit(code)),
            },
            Focus::Sidebar(SidebarFocus::Songs) => match code {
                KeyCode::Up => self.sidebar.move_selection(-1),
                KeyCode::Down => self.sidebar.move_selection(1),
                KeyCode::PageUp => self.sidebar.move_selection(-PAGE),
                KeyCode::PageDown => self.sidebar.move_selection(PAGE),
                KeyCode::Home => self.sidebar.select_first(),
                KeyCode::End => self.sidebar.select_last(),
                KeyCode::Enter => self.add_selected_to_booklet(),
                _ => return Ok(is_quit(code)),
            },
            Focus::Booklet => match code {
                KeyCode::Up => self.move_booklet_selection(-1),
                KeyCode::Down => self.move_booklet_selection(1),
                KeyCode::Home => self.booklet_selected = 0,
                KeyCode::End => self.booklet_selected = self.booklet.len().saturating_sub(1),
                KeyCode::Char('-') | KeyCode::Delete => self.remove_selected_from_booklet(),
                _ => return Ok(is_quit(code)),
            },
        }
        Ok(false)
    }

    /// Control-modified shortcuts. Returns `true` when the app should exit.
    pub(crate) fn handle_ctrl(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('c') => return Ok(true),
            KeyCode::Char('b') => self.toggle_sidebar(),
            KeyCode::Char('y') => self.copy_booklet_link(),
            KeyCode::Char('o') => self.open_booklet_link(),
            KeyCode::Char('r') => {
                self.sidebar.clear_filters()?;
                self.set_status("Filters cleared.", StatusKind::Info);
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_search_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Char(ch) => self.sidebar.push_char(ch)?,
            KeyCode::Backspace => self.sidebar.pop_char()?,
            KeyCode::Esc => self.sidebar.clear_query()?,
            KeyCode::Enter | KeyCode::Down => {
                self.focus = Focus::Sidebar(SidebarFocus::Songs);
            }
            _ => {}
        }
        Ok(())
    }

    fn move_focus(&mut self, delta: isize) {
        if !self.sidebar.is_shown() {
            self.focus = Focus::Booklet;
            return;
        }
        self.focus = self.focus.step(delta);
    }

    fn toggle_sidebar(&mut self) {
        let shown = self.sidebar.toggle();
        self.focus = if shown {
            Focus::Sidebar(SidebarFocus::Search)
        } else {
            Focus::Booklet
        };
        debug!(shown, "sidebar toggled");
    }

    fn is_narrow(&self) -> bool {
        self.viewport_width < self.settings.collapse_width
    }

    fn add_selected_to_booklet(&mut self) {
        let Some(visible) = self.sidebar.current_song() else {
            self.set_status("No song selected.", StatusKind::Error);
            return;
        };
        let song = visible.song.clone();

        if !self.booklet.add(song.id.clone()) {
            self.set_status(
                format!("{} is already in the booklet.", song.title),
                StatusKind::Info,
            );
            return;
        }
        info!(id = %song.id, booklet = self.booklet.len(), "added song to booklet");
        self.booklet_selected = self.booklet.len() - 1;
        self.set_status(format!("Added {}.", song.display_title()), StatusKind::Info);

        // small screens: the panel would cover the booklet
        if self.sidebar.is_shown() && self.is_narrow() {
            self.toggle_sidebar();
        }
    }

    fn remove_selected_from_booklet(&mut self) {
        if let Some(id) = self.booklet.remove_at(self.booklet_selected) {
            info!(%id, booklet = self.booklet.len(), "removed song from booklet");
            let title = self
                .catalog
                .song(&id)
                .map(|s| s.title.clone())
                .unwrap_or(id);
            self.set_status(format!("Removed {title}."), StatusKind::Info);
            self.booklet_selected = offset_index(self.booklet_selected, 0, self.booklet.len());
        }
    }

    fn move_booklet_selection(&mut self, offset: isize) {
        self.booklet_selected = offset_index(self.booklet_selected, offset, self.booklet.len());
    }

    fn copy_booklet_link(&mut self) {
        if !self.booklet.link_enabled() {
            return;
        }
        match booklet::copy_link(&self.booklet, &self.settings.base_url)
            .context("failed to copy booklet link")
        {
            Ok(url) => self.set_status(format!("Copied {url}"), StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_booklet_link(&mut self) {
        if !self.booklet.link_enabled() {
            return;
        }
        match booklet::open_link(&self.booklet, &self.settings.base_url)
            .context("failed to open booklet link")
        {
            Ok(url) => self.set_status(format!("Opened {url}"), StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(FOOTER_HEIGHT)])
            .split(area);

        let sidebar_width = if self.sidebar.is_shown() {
            SIDEBAR_WIDTH + HANDLE_WIDTH
        } else {
            HANDLE_WIDTH
        };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(sidebar_width)])
            .split(rows[0]);

        self.draw_booklet(frame, columns[0]);
        let sidebar_focus = match self.focus {
            Focus::Sidebar(focus) => Some(focus),
            Focus::Booklet => None,
        };
        self.sidebar
            .draw(frame, columns[1], sidebar_focus, &self.booklet);
        self.draw_footer(frame, rows[1]);
    }

    fn draw_booklet(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Booklet;
        let block = focus_block(&format!("Booklet ({} songs)", self.booklet.len()), focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.booklet.is_empty() {
            let message = Paragraph::new("No songs yet. Pick one from the search bar.")
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, inner);
            return;
        }

        let ids = self.booklet.ids();
        let window = scroll_window(self.booklet_selected, inner.height as usize, ids.len());
        let lines: Vec<Line> = ids[window.clone()]
            .iter()
            .zip(window)
            .map(|(id, idx)| {
                let label = match self.catalog.song(id) {
                    Some(song) => song.display_title(),
                    None => format!("Unknown song {id}"),
                };
                let mut style = Style::default();
                if focused && idx == self.booklet_selected {
                    style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
                }
                Line::from(vec![
                    Span::styled(format!("{:>3}. ", idx + 1), Style::default().fg(Color::Gray)),
                    Span::styled(label, style),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut spans = match self.focus {
            Focus::Sidebar(SidebarFocus::Search) => vec![
                Span::styled("[type]", key_style),
                Span::raw(" Search   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Results   "),
            ],
            Focus::Sidebar(SidebarFocus::Partitions) => vec![
                Span::styled("[←→]", key_style),
                Span::raw(" Partition   "),
            ],
            Focus::Sidebar(SidebarFocus::Tags) => vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Move   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Toggle   "),
            ],
            Focus::Sidebar(SidebarFocus::Songs) => vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Select   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Add   "),
            ],
            Focus::Booklet => vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Select   "),
                Span::styled("[-]", key_style),
                Span::raw(" Remove   "),
            ],
        };
        spans.extend([
            Span::styled("[Tab]", key_style),
            Span::raw(" Focus   "),
            Span::styled("[^B]", key_style),
            Span::raw(" Sidebar   "),
            Span::styled("[^Y]", key_style),
            Span::raw(" Copy Link   "),
            Span::styled("[^O]", key_style),
            Span::raw(" Open Link   "),
            Span::styled("[^R]", key_style),
            Span::raw(" Reset Filters"),
        ]);
        if self.focus != Focus::Sidebar(SidebarFocus::Search) {
            spans.extend([Span::raw("   "), Span::styled("[q]", key_style), Span::raw(" Quit")]);
        }
        Line::from(spans)
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }
}

fn is_quit(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Esc)
}
