//! The collapsible search bar on the right side of the screen: search input,
//! filter pickers, the visible song list and the booklet-link control.

use anyhow::Result;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::booklet::Booklet;
use crate::catalog::Catalog;
use crate::search::{RankDispatcher, SearchPipeline, VisibleSong};

use super::filters::{focus_block, Filters};
use super::helpers::{highlighted_spans, offset_index, scroll_window};

/// Shown in the empty search box.
const SEARCH_PLACEHOLDER: &str = "Kalmarevisan";
/// Width of the panel when open, including borders.
pub(crate) const SIDEBAR_WIDTH: u16 = 48;
/// Width of the collapse handle.
pub(crate) const HANDLE_WIDTH: u16 = 3;
/// Rows given to the tag picker at most.
const MAX_TAG_ROWS: u16 = 6;

/// Which sidebar control receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SidebarFocus {
    Search,
    Partitions,
    Tags,
    Songs,
}

pub(crate) struct SearchBar {
    pipeline: SearchPipeline,
    filters: Filters,
    query: String,
    selected: usize,
    show: bool,
}

impl SearchBar {
    pub(crate) fn new(catalog: &Catalog, dispatcher: Box<dyn RankDispatcher>) -> Result<Self> {
        Ok(Self {
            pipeline: SearchPipeline::new(catalog.songs.clone(), dispatcher)?,
            filters: Filters::new(&catalog.partitions, catalog.tags.clone()),
            query: String::new(),
            selected: 0,
            show: true,
        })
    }

    pub(crate) fn is_shown(&self) -> bool {
        self.show
    }

    pub(crate) fn toggle(&mut self) -> bool {
        self.show = !self.show;
        self.show
    }

    pub(crate) fn query(&self) -> &str {
        &self.query
    }

    pub(crate) fn push_char(&mut self, ch: char) -> Result<()> {
        self.query.push(ch);
        self.search_changed()
    }

    pub(crate) fn pop_char(&mut self) -> Result<()> {
        if self.query.pop().is_some() {
            self.search_changed()?;
        }
        Ok(())
    }

    pub(crate) fn clear_query(&mut self) -> Result<()> {
        self.query.clear();
        self.search_changed()
    }

    fn search_changed(&mut self) -> Result<()> {
        let previous = self.pipeline.filter().search().to_string();
        self.pipeline.set_search(&self.query)?;
        // whitespace-only edits leave the trimmed search unchanged
        if self.pipeline.filter().search() != previous {
            self.selected = 0;
        }
        Ok(())
    }

    pub(crate) fn cycle_partition(&mut self, delta: isize) -> Result<()> {
        let partition = self.filters.cycle_partition(delta);
        self.pipeline.set_partition(partition)?;
        self.selected = 0;
        Ok(())
    }

    pub(crate) fn move_tag_cursor(&mut self, delta: isize) {
        self.filters.move_tag_cursor(delta);
    }

    /// Toggle the tag under the picker cursor. Returns the tag and whether it
    /// is now chosen.
    pub(crate) fn toggle_tag_under_cursor(&mut self) -> Result<Option<(String, bool)>> {
        let Some(tag) = self.filters.tag_under_cursor().map(str::to_string) else {
            return Ok(None);
        };
        let chosen = self.pipeline.toggle_tag(&tag)?;
        self.selected = 0;
        Ok(Some((tag, chosen)))
    }

    pub(crate) fn clear_filters(&mut self) -> Result<()> {
        self.filters.reset();
        self.pipeline.clear_categories()?;
        self.selected = 0;
        Ok(())
    }

    /// Pick up finished rankings. Returns whether the list changed.
    pub(crate) fn poll(&mut self) -> bool {
        let changed = self.pipeline.poll();
        if changed {
            self.selected = 0;
        }
        changed
    }

    pub(crate) fn visible(&self) -> &[VisibleSong] {
        self.pipeline.visible()
    }

    pub(crate) fn current_song(&self) -> Option<&VisibleSong> {
        self.visible().get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_index(self.selected, offset, self.visible().len());
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.visible().len().saturating_sub(1);
    }

    pub(crate) fn draw(
        &self,
        frame: &mut Frame,
        area: Rect,
        focus: Option<SidebarFocus>,
        booklet: &Booklet,
    ) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(HANDLE_WIDTH), Constraint::Min(0)])
            .split(area);

        self.draw_handle(frame, columns[0]);
        if !self.show {
            return;
        }

        let tag_rows = (self.filters.tags().len() as u16).clamp(1, MAX_TAG_ROWS) + 2;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(tag_rows),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(columns[1]);

        self.draw_search_input(frame, rows[0], focus == Some(SidebarFocus::Search));
        self.filters
            .draw_partitions(frame, rows[1], focus == Some(SidebarFocus::Partitions));
        self.filters.draw_tags(
            frame,
            rows[2],
            &self.pipeline.filter().tags,
            focus == Some(SidebarFocus::Tags),
        );
        self.draw_song_list(frame, rows[3], focus == Some(SidebarFocus::Songs), booklet);
        draw_link_button(frame, rows[4], booklet);
    }

    fn draw_handle(&self, frame: &mut Frame, area: Rect) {
        let glyph = if self.show { ">" } else { "<" };
        let height = area.height;
        let mut lines = vec![Line::from(""); (height / 2) as usize];
        lines.push(Line::from(Span::styled(
            glyph,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        )));
        let handle = Paragraph::new(lines).alignment(Alignment::Center);
        frame.render_widget(handle, area);
    }

    fn draw_search_input(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = focus_block("Search", focused);
        let inner = block.inner(area);
        let content = if self.query.is_empty() {
            Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(self.query.clone())
        };
        frame.render_widget(Paragraph::new(content).block(block), area);

        if focused {
            let cursor_x = inner.x + self.query.chars().count() as u16;
            frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
        }
    }

    fn draw_song_list(&self, frame: &mut Frame, area: Rect, focused: bool, booklet: &Booklet) {
        let songs = self.visible();
        let mut title = format!("Songs ({}/{})", songs.len(), self.pipeline.catalog_len());
        if self.pipeline.is_searching() {
            title.push_str(" …");
        }
        let block = focus_block(&title, focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if songs.is_empty() {
            let message = Paragraph::new("No songs match.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(message, inner);
            return;
        }

        let window = scroll_window(self.selected, inner.height as usize, songs.len());
        let lines: Vec<Line> = songs[window.clone()]
            .iter()
            .zip(window)
            .map(|(visible, idx)| {
                let in_booklet = booklet.contains(&visible.song.id);
                song_tile_line(visible, focused && idx == self.selected, in_booklet)
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// One song row: highlighted title, then the alttitle in parentheses.
pub(crate) fn song_tile_line(
    visible: &VisibleSong,
    selected: bool,
    in_booklet: bool,
) -> Line<'static> {
    let base = if selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    let hit = base.fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let marker = if in_booklet { "+ " } else { "  " };
    let mut spans = vec![Span::styled(marker, base.fg(Color::Green))];
    spans.extend(highlighted_spans(
        &visible.song.title,
        &visible.title_indices,
        base,
        hit,
    ));

    if let Some(alttitle) = visible
        .song
        .alttitle
        .as_deref()
        .filter(|alt| !alt.trim().is_empty())
    {
        let muted = base.fg(Color::Gray);
        spans.push(Span::styled(" (", muted));
        spans.extend(highlighted_spans(
            alttitle,
            &visible.alttitle_indices,
            muted,
            hit,
        ));
        spans.push(Span::styled(")", muted));
    }

    Line::from(spans)
}

fn draw_link_button(frame: &mut Frame, area: Rect, booklet: &Booklet) {
    let style = if booklet.link_enabled() {
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let label = format!("Copy booklet link ({})  [Ctrl-Y]", booklet.len());
    let button = Paragraph::new(Span::styled(label, style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(button, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Partition, Song};
    use crate::search::{InlineDispatcher, PartitionFilter, RankSettings};

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Song::new("1", "Kalmarevisan"),
                Song::new("2", "Helan går")
                    .with_alttitle("Snapsvisa")
                    .with_partition(2)
                    .with_tags(["snaps"]),
                Song::new("3", "Sjösala vals").with_tags(["taube"]),
            ],
            vec![Partition {
                id: 2,
                name: "Snapsvisor".into(),
            }],
            None,
        )
    }

    fn search_bar() -> SearchBar {
        SearchBar::new(
            &catalog(),
            Box::new(InlineDispatcher::new(RankSettings::default())),
        )
        .unwrap()
    }

    fn ids(bar: &SearchBar) -> Vec<&str> {
        bar.visible().iter().map(|v| v.song.id.as_str()).collect()
    }

    #[test]
    fn typing_ranks_after_poll() {
        let mut bar = search_bar();
        for ch in "helan".chars() {
            bar.push_char(ch).unwrap();
        }
        assert!(bar.pipeline.is_searching());
        assert!(bar.poll());
        assert_eq!(ids(&bar), ["2"]);
        assert_eq!(bar.query(), "helan");
    }

    #[test]
    fn backspace_to_empty_restores_filtered_list() {
        let mut bar = search_bar();
        bar.push_char('k').unwrap();
        bar.poll();
        bar.pop_char().unwrap();
        assert!(!bar.pipeline.is_searching());
        assert_eq!(ids(&bar), ["1", "2", "3"]);
        bar.pop_char().unwrap();
        assert_eq!(bar.query(), "");
    }

    #[test]
    fn partition_cycle_filters_list() {
        let mut bar = search_bar();
        bar.cycle_partition(1).unwrap();
        assert_eq!(bar.pipeline.filter().partition, PartitionFilter::Only(2));
        assert_eq!(ids(&bar), ["2"]);
        bar.cycle_partition(1).unwrap();
        assert_eq!(ids(&bar), ["1", "3"]);
        bar.clear_filters().unwrap();
        assert_eq!(ids(&bar), ["1", "2", "3"]);
    }

    #[test]
    fn tag_toggle_reports_choice() {
        let mut bar = search_bar();
        bar.move_tag_cursor(1);
        let toggled = bar.toggle_tag_under_cursor().unwrap();
        assert_eq!(toggled, Some(("taube".to_string(), true)));
        assert_eq!(ids(&bar), ["3"]);
        let toggled = bar.toggle_tag_under_cursor().unwrap();
        assert_eq!(toggled, Some(("taube".to_string(), false)));
    }

    #[test]
    fn selection_moves_within_visible_list() {
        let mut bar = search_bar();
        bar.move_selection(1);
        assert_eq!(bar.current_song().map(|v| v.song.id.as_str()), Some("2"));
        bar.select_last();
        assert_eq!(bar.current_song().map(|v| v.song.id.as_str()), Some("3"));
        bar.move_selection(10);
        assert_eq!(bar.current_song().map(|v| v.song.id.as_str()), Some("3"));
        bar.select_first();
        assert_eq!(bar.current_song().map(|v| v.song.id.as_str()), Some("1"));
    }

    #[test]
    fn tile_shows_alttitle_in_parentheses() {
        let visible = VisibleSong::unranked(
            Song::new("2", "Helan går").with_alttitle("Snapsvisa"),
        );
        let line = song_tile_line(&visible, false, true);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "+ Helan går (Snapsvisa)");
    }

    #[test]
    fn toggle_flips_visibility() {
        let mut bar = search_bar();
        assert!(bar.is_shown());
        assert!(!bar.toggle());
        assert!(bar.toggle());
    }
}
