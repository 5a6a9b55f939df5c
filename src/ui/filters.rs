//! Partition and tag pickers shown above the song list. The pickers only
//! track cursor positions; the chosen values are reported back to the search
//! bar, which owns the filter state.

use std::collections::BTreeSet;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::models::Partition;
use crate::search::PartitionFilter;

use super::helpers::{offset_index, scroll_window};

/// One entry of the partition picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PartitionChoice {
    pub(crate) label: String,
    pub(crate) filter: PartitionFilter,
}

pub(crate) struct Filters {
    choices: Vec<PartitionChoice>,
    partition_index: usize,
    tags: Vec<String>,
    tag_cursor: usize,
}

impl Filters {
    pub(crate) fn new(partitions: &[Partition], tags: Vec<String>) -> Self {
        let mut choices = Vec::with_capacity(partitions.len() + 2);
        choices.push(PartitionChoice {
            label: "All songs".to_string(),
            filter: PartitionFilter::All,
        });
        choices.extend(partitions.iter().map(|p| PartitionChoice {
            label: p.name.clone(),
            filter: PartitionFilter::Only(p.id),
        }));
        choices.push(PartitionChoice {
            label: "Other songs".to_string(),
            filter: PartitionFilter::Unpartitioned,
        });

        Self {
            choices,
            partition_index: 0,
            tags,
            tag_cursor: 0,
        }
    }

    pub(crate) fn current_partition(&self) -> &PartitionChoice {
        &self.choices[self.partition_index]
    }

    /// Step through the partition choices, wrapping at both ends, and return
    /// the newly chosen filter.
    pub(crate) fn cycle_partition(&mut self, delta: isize) -> PartitionFilter {
        let len = self.choices.len() as isize;
        self.partition_index = (self.partition_index as isize + delta).rem_euclid(len) as usize;
        self.current_partition().filter
    }

    pub(crate) fn tags(&self) -> &[String] {
        &self.tags
    }

    pub(crate) fn move_tag_cursor(&mut self, delta: isize) {
        self.tag_cursor = offset_index(self.tag_cursor, delta, self.tags.len());
    }

    pub(crate) fn tag_under_cursor(&self) -> Option<&str> {
        self.tags.get(self.tag_cursor).map(String::as_str)
    }

    pub(crate) fn reset(&mut self) {
        self.partition_index = 0;
        self.tag_cursor = 0;
    }

    pub(crate) fn draw_partitions(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let choice = self.current_partition();
        let arrow_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let line = Line::from(vec![
            Span::styled("< ", arrow_style),
            Span::styled(
                choice.label.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(" >", arrow_style),
        ]);
        let paragraph = Paragraph::new(line).block(focus_block("Partition", focused));
        frame.render_widget(paragraph, area);
    }

    pub(crate) fn draw_tags(
        &self,
        frame: &mut Frame,
        area: Rect,
        chosen: &BTreeSet<String>,
        focused: bool,
    ) {
        let block = focus_block(&format!("Tags ({} chosen)", chosen.len()), focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.tags.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("No tags", Style::default().fg(Color::DarkGray))),
                inner,
            );
            return;
        }

        let window = scroll_window(self.tag_cursor, inner.height as usize, self.tags.len());
        let lines: Vec<Line> = self.tags[window.clone()]
            .iter()
            .zip(window)
            .map(|(tag, idx)| {
                let marker = if chosen.contains(tag) { "[x] " } else { "[ ] " };
                let mut style = Style::default();
                if focused && idx == self.tag_cursor {
                    style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
                }
                Line::from(Span::styled(format!("{marker}{tag}"), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

pub(crate) fn focus_block(title: &str, focused: bool) -> Block<'static> {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if focused {
        block.border_style(Style::default().fg(Color::Yellow))
    } else {
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> Filters {
        Filters::new(
            &[
                Partition {
                    id: 0,
                    name: "Sittningsvisor".into(),
                },
                Partition {
                    id: 2,
                    name: "Snapsvisor".into(),
                },
            ],
            vec!["snaps".into(), "taube".into()],
        )
    }

    #[test]
    fn choices_wrap_all_partitions_and_other() {
        let mut filters = filters();
        assert_eq!(filters.current_partition().filter, PartitionFilter::All);
        assert_eq!(filters.cycle_partition(1), PartitionFilter::Only(0));
        assert_eq!(filters.cycle_partition(1), PartitionFilter::Only(2));
        assert_eq!(filters.cycle_partition(1), PartitionFilter::Unpartitioned);
        assert_eq!(filters.cycle_partition(1), PartitionFilter::All);
        assert_eq!(filters.cycle_partition(-1), PartitionFilter::Unpartitioned);
        assert_eq!(filters.current_partition().label, "Other songs");
    }

    #[test]
    fn tag_cursor_stays_in_bounds() {
        let mut filters = filters();
        filters.move_tag_cursor(-1);
        assert_eq!(filters.tag_under_cursor(), Some("snaps"));
        filters.move_tag_cursor(5);
        assert_eq!(filters.tag_under_cursor(), Some("taube"));
        filters.reset();
        assert_eq!(filters.tag_under_cursor(), Some("snaps"));

        let empty = Filters::new(&[], Vec::new());
        assert_eq!(empty.tag_under_cursor(), None);
        assert_eq!(empty.tags().len(), 0);
    }
}
