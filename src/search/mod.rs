//! The filter + search pipeline behind the sidebar: category filters first,
//! then (for a non-empty query) fuzzy ranking on the worker.

mod filter;
mod fuzzy;
mod worker;

use std::sync::Arc;

use tracing::{debug, trace};

pub use filter::{tags_match, FilterState, PartitionFilter, ALL_PARTITIONS, UNPARTITIONED};
pub use fuzzy::{RankSettings, SongRanker};
pub use worker::{RankDispatcher, RankRequest, RankResponse, SearchWorker};
#[cfg(test)]
pub(crate) use worker::InlineDispatcher;

use crate::error::Result;
use crate::models::Song;

/// A row of the visible list. Empty index vectors mean "render the field as
/// is".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSong {
    pub song: Song,
    /// Matched char indices within `song.title`.
    pub title_indices: Vec<usize>,
    /// Matched char indices within `song.alttitle`.
    pub alttitle_indices: Vec<usize>,
}

impl VisibleSong {
    pub fn unranked(song: Song) -> Self {
        Self {
            song,
            title_indices: Vec::new(),
            alttitle_indices: Vec::new(),
        }
    }
}

/// Owns the filter state and derives the visible list from the shared catalog.
///
/// Every mutation re-runs the whole pipeline under a fresh generation. Ranking
/// answers tagged with an older generation are ignored, so a slow response for
/// an earlier keystroke can never replace newer results.
pub struct SearchPipeline {
    songs: Arc<[Song]>,
    filter: FilterState,
    visible: Vec<VisibleSong>,
    generation: u64,
    pending: Option<u64>,
    dispatcher: Box<dyn RankDispatcher>,
}

impl SearchPipeline {
    pub fn new(songs: Arc<[Song]>, dispatcher: Box<dyn RankDispatcher>) -> Result<Self> {
        let mut pipeline = Self {
            songs,
            filter: FilterState::default(),
            visible: Vec::new(),
            generation: 0,
            pending: None,
            dispatcher,
        };
        pipeline.refresh()?;
        Ok(pipeline)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn visible(&self) -> &[VisibleSong] {
        &self.visible
    }

    pub fn catalog_len(&self) -> usize {
        self.songs.len()
    }

    /// True while a ranking for the current generation is outstanding.
    pub fn is_searching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_search(&mut self, text: &str) -> Result<()> {
        self.filter.set_search(text);
        self.refresh()
    }

    pub fn set_partition(&mut self, partition: PartitionFilter) -> Result<()> {
        self.filter.partition = partition;
        self.refresh()
    }

    pub fn toggle_tag(&mut self, tag: &str) -> Result<bool> {
        let chosen = self.filter.toggle_tag(tag);
        self.refresh()?;
        Ok(chosen)
    }

    pub fn clear_categories(&mut self) -> Result<()> {
        self.filter.clear_categories();
        self.refresh()
    }

    /// Re-run filter and (when needed) ranking for the current state.
    pub fn refresh(&mut self) -> Result<()> {
        self.generation += 1;
        let filtered = self.filter.apply(&self.songs);
        debug!(
            generation = self.generation,
            partition = self.filter.partition.sentinel(),
            tags = self.filter.tags.len(),
            passed = filtered.len(),
            "filtered catalog"
        );

        if self.filter.search().is_empty() {
            self.pending = None;
            self.visible = filtered.into_iter().map(VisibleSong::unranked).collect();
            return Ok(());
        }

        // Until the ranking lands, keep only rows that still pass the filters.
        let filter = &self.filter;
        self.visible.retain(|v| filter.matches(&v.song));
        self.pending = Some(self.generation);
        self.dispatcher.dispatch(RankRequest {
            generation: self.generation,
            query: self.filter.search().to_string(),
            songs: filtered,
        })
    }

    /// Apply any finished ranking. Returns whether the visible list changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for response in self.dispatcher.poll() {
            if Some(response.generation) == self.pending {
                self.visible = response.results;
                self.pending = None;
                changed = true;
            } else {
                trace!(
                    stale = response.generation,
                    current = self.generation,
                    "dropping stale search results"
                );
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Holds requests until the test releases them, in any order.
    #[derive(Clone, Default)]
    struct Recorder {
        requests: Rc<RefCell<Vec<RankRequest>>>,
        released: Rc<RefCell<Vec<RankResponse>>>,
    }

    impl Recorder {
        fn release(&self, generation: u64) {
            let ranker = SongRanker::new(RankSettings::default());
            let requests = self.requests.borrow();
            let request = requests
                .iter()
                .find(|r| r.generation == generation)
                .expect("request was dispatched");
            self.released.borrow_mut().push(RankResponse {
                generation,
                results: ranker.rank(&request.query, &request.songs),
            });
        }

        fn dispatched(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl RankDispatcher for Recorder {
        fn dispatch(&mut self, request: RankRequest) -> Result<()> {
            self.requests.borrow_mut().push(request);
            Ok(())
        }

        fn poll(&mut self) -> Vec<RankResponse> {
            self.released.borrow_mut().drain(..).collect()
        }
    }

    fn catalog() -> Arc<[Song]> {
        vec![
            Song::new("1", "Kalmarevisan"),
            Song::new("2", "Helan går").with_partition(2).with_tags(["snaps"]),
            Song::new("3", "Halvan går").with_partition(2).with_tags(["snaps"]),
            Song::new("4", "Sjösala vals").with_tags(["taube"]),
        ]
        .into()
    }

    fn pipeline() -> (SearchPipeline, Recorder) {
        let recorder = Recorder::default();
        let pipeline = SearchPipeline::new(catalog(), Box::new(recorder.clone())).unwrap();
        (pipeline, recorder)
    }

    fn visible_ids(pipeline: &SearchPipeline) -> Vec<&str> {
        pipeline.visible().iter().map(|v| v.song.id.as_str()).collect()
    }

    #[test]
    fn starts_with_full_catalog() {
        let (pipeline, recorder) = pipeline();
        assert_eq!(visible_ids(&pipeline), ["1", "2", "3", "4"]);
        assert_eq!(recorder.dispatched(), 0);
        assert!(!pipeline.is_searching());
    }

    #[test]
    fn empty_search_never_ranks() {
        let (mut pipeline, recorder) = pipeline();
        pipeline.set_search("   ").unwrap();
        pipeline.set_partition(PartitionFilter::Only(2)).unwrap();
        pipeline.toggle_tag("snaps").unwrap();
        assert_eq!(recorder.dispatched(), 0);
        assert_eq!(visible_ids(&pipeline), ["2", "3"]);
    }

    #[test]
    fn non_empty_search_always_ranks() {
        let (mut pipeline, recorder) = pipeline();
        pipeline.set_search("går").unwrap();
        assert_eq!(recorder.dispatched(), 1);
        pipeline.set_partition(PartitionFilter::Only(2)).unwrap();
        pipeline.toggle_tag("snaps").unwrap();
        assert_eq!(recorder.dispatched(), 3);
        assert!(pipeline.is_searching());
    }

    #[test]
    fn category_change_reruns_search_on_filtered_songs() {
        let (mut pipeline, recorder) = pipeline();
        pipeline.set_search("går").unwrap();
        pipeline.set_partition(PartitionFilter::Unpartitioned).unwrap();
        let last = recorder.requests.borrow().last().cloned().unwrap();
        let ids: Vec<_> = last.songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["1", "4"]);
        assert_eq!(last.query, "går");
    }

    #[test]
    fn ranked_results_replace_visible_list() {
        let (mut pipeline, recorder) = pipeline();
        pipeline.set_search("helan").unwrap();
        recorder.release(pipeline.generation());
        assert!(pipeline.poll());
        assert_eq!(visible_ids(&pipeline), ["2"]);
        assert!(!pipeline.visible()[0].title_indices.is_empty());
        assert!(!pipeline.is_searching());
    }

    #[test]
    fn stale_response_is_discarded() {
        let (mut pipeline, recorder) = pipeline();
        pipeline.set_search("hal").unwrap();
        let stale = pipeline.generation();
        pipeline.set_search("helan").unwrap();
        let fresh = pipeline.generation();

        recorder.release(fresh);
        recorder.release(stale);
        assert!(pipeline.poll());
        assert_eq!(visible_ids(&pipeline), ["2"]);

        recorder.release(stale);
        assert!(!pipeline.poll());
        assert_eq!(visible_ids(&pipeline), ["2"]);
    }

    #[test]
    fn clearing_search_outdates_in_flight_ranking() {
        let (mut pipeline, recorder) = pipeline();
        pipeline.set_search("helan").unwrap();
        let in_flight = pipeline.generation();
        pipeline.set_search("").unwrap();
        recorder.release(in_flight);
        assert!(!pipeline.poll());
        assert_eq!(visible_ids(&pipeline), ["1", "2", "3", "4"]);
    }

    #[test]
    fn pending_search_hides_rows_failing_new_filter() {
        let (mut pipeline, recorder) = pipeline();
        pipeline.set_search("går").unwrap();
        recorder.release(pipeline.generation());
        assert!(pipeline.poll());
        assert_eq!(pipeline.visible().len(), 2);

        pipeline.set_partition(PartitionFilter::Unpartitioned).unwrap();
        assert!(pipeline.is_searching());
        assert!(pipeline.visible().iter().all(|v| pipeline.filter().matches(&v.song)));
        assert!(pipeline.visible().is_empty());
    }

    #[test]
    fn pending_search_keeps_rows_still_passing() {
        let (mut pipeline, recorder) = pipeline();
        pipeline.set_search("går").unwrap();
        recorder.release(pipeline.generation());
        pipeline.poll();

        let before = visible_ids(&pipeline).len();
        pipeline.set_search("helan går").unwrap();
        assert!(pipeline.is_searching());
        assert_eq!(visible_ids(&pipeline).len(), before);
    }

    #[test]
    fn visible_list_is_a_projection_of_the_catalog() {
        let (mut pipeline, _) = pipeline();
        pipeline.toggle_tag("taube").unwrap();
        assert_eq!(visible_ids(&pipeline), ["4"]);
        pipeline.clear_categories().unwrap();
        assert_eq!(visible_ids(&pipeline), ["1", "2", "3", "4"]);
        assert_eq!(pipeline.catalog_len(), 4);
    }
}
