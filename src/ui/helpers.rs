use std::ops::Range;

use anyhow::Error;
use ratatui::style::Style;
use ratatui::text::Span;

/// Split `text` into spans, styling the chars at `indices` with `hit`.
/// Consecutive hits share one span.
pub(crate) fn highlighted_spans(
    text: &str,
    indices: &[usize],
    base: Style,
    hit: Style,
) -> Vec<Span<'static>> {
    if indices.is_empty() {
        return vec![Span::styled(text.to_string(), base)];
    }

    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_is_hit = false;
    for (idx, ch) in text.chars().enumerate() {
        let is_hit = indices.contains(&idx);
        if is_hit != run_is_hit && !run.is_empty() {
            let style = if run_is_hit { hit } else { base };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_is_hit = is_hit;
        run.push(ch);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, if run_is_hit { hit } else { base }));
    }
    spans
}

/// Index range of a list that fits `capacity` rows while keeping `selected`
/// on screen.
pub(crate) fn scroll_window(selected: usize, capacity: usize, len: usize) -> Range<usize> {
    let capacity = capacity.max(1);
    let mut start = if selected >= capacity {
        selected + 1 - capacity
    } else {
        0
    };
    if start + capacity > len {
        start = len.saturating_sub(capacity);
    }
    start..(start + capacity).min(len)
}

/// Clamp `current + offset` into `0..len`.
pub(crate) fn offset_index(current: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len as isize - 1;
    (current as isize + offset).clamp(0, max) as usize
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
