//! Weighted fuzzy ranking over the searchable song fields.
//!
//! Every key (title, alttitle, firstline, id) is matched independently with the
//! skim algorithm; the best weighted key score becomes the song score. Title
//! and alttitle keep their matched character indices so the list can
//! highlight them.

use std::cmp::Reverse;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use super::VisibleSong;
use crate::models::Song;

/// Score deducted from matches that needed a transposed query.
const TYPO_PENALTY: i64 = 20;

/// Tuning knobs for the ranker. Built from the `[search]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct RankSettings {
    pub allow_typo: bool,
    pub title_weight: f64,
    pub alttitle_weight: f64,
    pub firstline_weight: f64,
    pub id_weight: f64,
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            allow_typo: true,
            title_weight: 1.0,
            alttitle_weight: 1.0,
            firstline_weight: 1.0,
            id_weight: 1.0,
        }
    }
}

/// A key match: weighted score plus the matched char indices.
type KeyMatch = (i64, Vec<usize>);

pub struct SongRanker {
    matcher: SkimMatcherV2,
    settings: RankSettings,
}

impl SongRanker {
    pub fn new(settings: RankSettings) -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
            settings,
        }
    }

    /// Rank `songs` against `query`. Songs with no matching key are dropped,
    /// the rest come back best first with catalog order breaking ties.
    pub fn rank(&self, query: &str, songs: &[Song]) -> Vec<VisibleSong> {
        let query = query.trim();
        if query.is_empty() {
            return songs.iter().cloned().map(VisibleSong::unranked).collect();
        }

        let mut scored: Vec<(i64, usize, VisibleSong)> = songs
            .iter()
            .enumerate()
            .filter_map(|(idx, song)| {
                self.score_song(query, song)
                    .map(|(score, visible)| (score, idx, visible))
            })
            .collect();

        scored.sort_by_key(|(score, idx, _)| (Reverse(*score), *idx));
        scored.into_iter().map(|(_, _, visible)| visible).collect()
    }

    fn score_song(&self, query: &str, song: &Song) -> Option<(i64, VisibleSong)> {
        let s = &self.settings;
        let title = self.match_key(&song.title, query, s.title_weight);
        let alttitle = song
            .alttitle
            .as_deref()
            .and_then(|text| self.match_key(text, query, s.alttitle_weight));
        let firstline = song
            .firstline
            .as_deref()
            .and_then(|text| self.match_key(text, query, s.firstline_weight));
        let id = self.match_key(&song.id, query, s.id_weight);

        let best = [&title, &alttitle, &firstline, &id]
            .into_iter()
            .filter_map(|m| m.as_ref().map(|(score, _)| *score))
            .max()?;

        let visible = VisibleSong {
            song: song.clone(),
            title_indices: title.map(|(_, idx)| idx).unwrap_or_default(),
            alttitle_indices: alttitle.map(|(_, idx)| idx).unwrap_or_default(),
        };
        Some((best, visible))
    }

    fn match_key(&self, text: &str, query: &str, weight: f64) -> Option<KeyMatch> {
        if weight <= 0.0 {
            return None;
        }
        let (raw, indices) = self.raw_match(text, query)?;
        let weighted = (raw as f64 * weight).round() as i64;
        Some((weighted, indices))
    }

    fn raw_match(&self, text: &str, query: &str) -> Option<KeyMatch> {
        let text = fold_case(text);
        let query = fold_case(query);
        if let Some(found) = self.matcher.fuzzy_indices(&text, &query) {
            return Some(found);
        }
        if !self.settings.allow_typo {
            return None;
        }

        transpositions(&query)
            .filter_map(|variant| self.matcher.fuzzy_indices(&text, &variant))
            .max_by_key(|(score, _)| *score)
            .map(|(score, indices)| ((score - TYPO_PENALTY).max(1), indices))
    }
}

/// Lowercase char by char. Skim only folds ASCII, and a one-to-one mapping
/// keeps match indices valid for the original text.
fn fold_case(text: &str) -> String {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Every variant of `query` with one pair of adjacent characters swapped.
fn transpositions(query: &str) -> impl Iterator<Item = String> + '_ {
    let chars: Vec<char> = query.chars().collect();
    (0..chars.len().saturating_sub(1)).filter_map(move |i| {
        if chars[i] == chars[i + 1] {
            return None;
        }
        let mut swapped = chars.clone();
        swapped.swap(i, i + 1);
        Some(swapped.into_iter().collect())
    })
}
