//! Off-thread ranking. The UI thread hands filtered songs to a
//! [`RankDispatcher`] and later polls for responses; each request carries the
//! generation it was issued under so the pipeline can discard stale answers.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use super::fuzzy::{RankSettings, SongRanker};
use super::VisibleSong;
use crate::error::{Error, Result};
use crate::models::Song;

#[derive(Debug, Clone)]
pub struct RankRequest {
    pub generation: u64,
    pub query: String,
    /// Songs that already passed the category filters, in catalog order.
    pub songs: Vec<Song>,
}

#[derive(Debug, Clone)]
pub struct RankResponse {
    pub generation: u64,
    pub results: Vec<VisibleSong>,
}

/// Seam between the search pipeline and whatever performs the ranking.
pub trait RankDispatcher {
    /// Queue a ranking job. Must not block on the ranking itself.
    fn dispatch(&mut self, request: RankRequest) -> Result<()>;

    /// Collect every response that has completed since the last poll.
    fn poll(&mut self) -> Vec<RankResponse>;
}

/// Background thread owning a [`SongRanker`]. Requests queued while a ranking
/// is running are coalesced: only the newest one is ranked.
pub struct SearchWorker {
    requests: Option<Sender<RankRequest>>,
    responses: Receiver<RankResponse>,
    handle: Option<JoinHandle<()>>,
}

impl SearchWorker {
    pub fn spawn(settings: RankSettings) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<RankRequest>();
        let (response_tx, response_rx) = mpsc::channel::<RankResponse>();

        let handle = thread::Builder::new()
            .name("search-worker".into())
            .spawn(move || worker_loop(SongRanker::new(settings), request_rx, response_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        })
    }
}

fn worker_loop(ranker: SongRanker, requests: Receiver<RankRequest>, responses: Sender<RankResponse>) {
    while let Ok(mut request) = requests.recv() {
        while let Ok(newer) = requests.try_recv() {
            trace!(skipped = request.generation, "coalescing search request");
            request = newer;
        }

        let results = ranker.rank(&request.query, &request.songs);
        debug!(
            generation = request.generation,
            candidates = request.songs.len(),
            matches = results.len(),
            "ranked songs"
        );

        let response = RankResponse {
            generation: request.generation,
            results,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("search worker stopped");
}

impl RankDispatcher for SearchWorker {
    fn dispatch(&mut self, request: RankRequest) -> Result<()> {
        let sender = self.requests.as_ref().ok_or(Error::SearchWorker)?;
        sender.send(request).map_err(|_| Error::SearchWorker)
    }

    fn poll(&mut self) -> Vec<RankResponse> {
        let mut ready = Vec::new();
        loop {
            match self.responses.try_recv() {
                Ok(response) => ready.push(response),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("search worker disconnected");
                    break;
                }
            }
        }
        ready
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        // closing the channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("search worker panicked");
            }
        }
    }
}

/// Ranks on the calling thread; responses become visible on the next poll.
#[cfg(test)]
pub(crate) struct InlineDispatcher {
    ranker: SongRanker,
    ready: std::collections::VecDeque<RankResponse>,
}

#[cfg(test)]
impl InlineDispatcher {
    pub fn new(settings: RankSettings) -> Self {
        Self {
            ranker: SongRanker::new(settings),
            ready: std::collections::VecDeque::new(),
        }
    }
}

#[cfg(test)]
impl RankDispatcher for InlineDispatcher {
    fn dispatch(&mut self, request: RankRequest) -> Result<()> {
        let results = self.ranker.rank(&request.query, &request.songs);
        self.ready.push_back(RankResponse {
            generation: request.generation,
            results,
        });
        Ok(())
    }

    fn poll(&mut self) -> Vec<RankResponse> {
        self.ready.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn request(generation: u64, query: &str) -> RankRequest {
        RankRequest {
            generation,
            query: query.to_string(),
            songs: vec![Song::new("1", "Kalmarevisan"), Song::new("2", "Helan går")],
        }
    }

    fn wait_for(worker: &mut SearchWorker, generation: u64) -> RankResponse {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(found) = worker
                .poll()
                .into_iter()
                .find(|r| r.generation == generation)
            {
                return found;
            }
            assert!(Instant::now() < deadline, "worker never answered");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn worker_ranks_in_background() {
        let mut worker = SearchWorker::spawn(RankSettings::default()).unwrap();
        worker.dispatch(request(1, "helan")).unwrap();
        let response = wait_for(&mut worker, 1);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].song.id, "2");
    }

    #[test]
    fn newest_request_is_always_answered() {
        let mut worker = SearchWorker::spawn(RankSettings::default()).unwrap();
        for generation in 1..=20 {
            worker.dispatch(request(generation, "kalmar")).unwrap();
        }
        let response = wait_for(&mut worker, 20);
        assert_eq!(response.results[0].song.id, "1");
    }

    #[test]
    fn inline_dispatcher_defers_until_poll() {
        let mut inline = InlineDispatcher::new(RankSettings::default());
        inline.dispatch(request(3, "kalmar")).unwrap();
        let ready = inline.poll();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].generation, 3);
        assert!(inline.poll().is_empty());
    }
}
