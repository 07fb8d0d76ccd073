//! Board change detection.
//!
//! Two sources feed one channel: the page's mutation observer (through a
//! [`MutationSink`]) and a fixed-interval timer. A single task drains the
//! channel, extracts the position and emits it only when it differs from
//! the last one emitted.
//!
//! ```text
//! mutation observer --MutationSink--\
//!                                    +--> Trigger channel --> check --> changes
//! interval timer -------------------/
//! ```
//!
//! The trigger channel is tiny on purpose: when a check is already queued,
//! further triggers are dropped because that check will see the same page.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::extractor::{self, ExtractedPosition};
use crate::page::{BoardPage, MutationRecord};

/// How often the board-wait loop looks for the board.
pub const BOARD_WAIT_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest period either polling loop will run at. Smaller values,
/// including zero, are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

const TRIGGER_CAPACITY: usize = 4;
const CHANGE_CAPACITY: usize = 16;

/// Why a check ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The board subtree mutated.
    Mutation,
    /// The poll interval elapsed.
    Timer,
}

/// Extraction plus deduplication against the last emitted position.
pub struct BoardWatcher<P> {
    page: Arc<P>,
    last_emitted: Option<String>,
}

impl<P: BoardPage + 'static> BoardWatcher<P> {
    /// Watch `page`. Nothing has been emitted yet.
    pub const fn new(page: Arc<P>) -> Self {
        Self {
            page,
            last_emitted: None,
        }
    }

    /// Extract the current position and return it if it changed.
    pub fn check(&mut self, trigger: Trigger) -> Option<ExtractedPosition> {
        let position = extractor::extract(self.page.as_ref())?;
        if self.last_emitted.as_deref() == Some(position.fen.as_str()) {
            return None;
        }
        debug!(
            ?trigger,
            source = %position.source,
            fen = %position.fen,
            "Board changed"
        );
        self.last_emitted = Some(position.fen.clone());
        Some(position)
    }

    /// Start both trigger sources and the consumer task.
    ///
    /// `poll_interval` is raised to [`MIN_POLL_INTERVAL`] if shorter.
    pub fn start(self, poll_interval: Duration) -> RunningWatcher {
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_CAPACITY);
        let (change_tx, change_rx) = mpsc::channel(CHANGE_CAPACITY);

        let timer = tokio::spawn(run_timer(trigger_tx.clone(), poll_interval));
        let consumer = tokio::spawn(self.run(trigger_rx, change_tx));
        info!(poll_ms = poll_interval.as_millis(), "Board monitoring started");

        RunningWatcher {
            mutations: MutationSink { tx: trigger_tx },
            changes: change_rx,
            tasks: [timer, consumer],
        }
    }

    /// Drain triggers until every sender is gone or nobody listens for
    /// changes.
    pub async fn run(
        mut self,
        mut triggers: mpsc::Receiver<Trigger>,
        changes: mpsc::Sender<ExtractedPosition>,
    ) {
        while let Some(trigger) = triggers.recv().await {
            if let Some(position) = self.check(trigger) {
                if changes.send(position).await.is_err() {
                    debug!("Change receiver dropped, stopping watcher");
                    return;
                }
            }
        }
    }
}

async fn run_timer(tx: mpsc::Sender<Trigger>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if tx.is_closed() {
            return;
        }
        // A full channel already holds a pending check.
        let _ = tx.try_send(Trigger::Timer);
    }
}

/// Entry point for the page's mutation observer callback.
#[derive(Clone)]
pub struct MutationSink {
    tx: mpsc::Sender<Trigger>,
}

impl MutationSink {
    /// Post one trigger for a batch of records, if any record matters.
    /// Returns whether a trigger was posted.
    pub fn observe(&self, records: &[MutationRecord]) -> bool {
        if !records.iter().any(MutationRecord::is_relevant) {
            return false;
        }
        self.tx.try_send(Trigger::Mutation).is_ok()
    }
}

/// A started watcher.
pub struct RunningWatcher {
    /// Feed mutation records here.
    pub mutations: MutationSink,
    /// Deduplicated position changes.
    pub changes: mpsc::Receiver<ExtractedPosition>,
    tasks: [JoinHandle<()>; 2],
}

impl RunningWatcher {
    /// Stop the timer and the consumer.
    pub fn stop(self) {
        for task in self.tasks {
            task.abort();
        }
        info!("Board monitoring stopped");
    }
}

/// Wait until the page has rendered its board, polling every `every`
/// (at least [`MIN_POLL_INTERVAL`]).
pub async fn wait_for_board<P: BoardPage + ?Sized>(page: &P, every: Duration) {
    let mut ticker = tokio::time::interval(every.max(MIN_POLL_INTERVAL));
    loop {
        ticker.tick().await;
        if page.board_present() {
            info!("Board detected");
            return;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::PoisonError;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::extractor::PositionSource;
    use crate::extractor::tests::FakePage;
    use crate::page::HostCall;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    #[test]
    fn same_position_is_emitted_once() {
        let page = Arc::new(FakePage::with_attribute(START));
        let mut watcher = BoardWatcher::new(Arc::clone(&page));

        assert!(watcher.check(Trigger::Mutation).is_some());
        assert!(watcher.check(Trigger::Timer).is_none());
        assert!(watcher.check(Trigger::Mutation).is_none());

        page.set_attribute(AFTER_E4);
        let changed = watcher.check(Trigger::Timer).unwrap();
        assert_eq!(changed.fen, AFTER_E4);
        assert_eq!(changed.source, PositionSource::Attribute);
    }

    #[test]
    fn no_position_emits_nothing() {
        let mut watcher = BoardWatcher::new(Arc::new(FakePage::default()));
        assert!(watcher.check(Trigger::Timer).is_none());
    }

    #[tokio::test]
    async fn irrelevant_mutations_post_nothing() {
        let (tx, mut rx) = mpsc::channel(TRIGGER_CAPACITY);
        let sink = MutationSink { tx };

        assert!(!sink.observe(&[MutationRecord::CharacterData]));
        assert!(!sink.observe(&[MutationRecord::Attribute(String::from("aria-label"))]));
        assert!(rx.try_recv().is_err());

        assert!(sink.observe(&[
            MutationRecord::CharacterData,
            MutationRecord::Attribute(String::from("class")),
        ]));
        assert_eq!(rx.try_recv().ok(), Some(Trigger::Mutation));
    }

    #[tokio::test]
    async fn both_sources_share_one_dedup() {
        let page = Arc::new(FakePage::with_attribute(START));
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_CAPACITY);
        let (change_tx, mut change_rx) = mpsc::channel(CHANGE_CAPACITY);
        let consumer = tokio::spawn(BoardWatcher::new(Arc::clone(&page)).run(trigger_rx, change_tx));

        trigger_tx.send(Trigger::Mutation).await.unwrap();
        trigger_tx.send(Trigger::Timer).await.unwrap();
        trigger_tx.send(Trigger::Mutation).await.unwrap();
        // Let the consumer drain the queue before the board moves.
        tokio::task::yield_now().await;

        page.set_attribute(AFTER_E4);
        trigger_tx.send(Trigger::Timer).await.unwrap();
        trigger_tx.send(Trigger::Mutation).await.unwrap();
        drop(trigger_tx);
        consumer.await.unwrap();

        let mut emitted = Vec::new();
        while let Some(change) = change_rx.recv().await {
            emitted.push(change.fen);
        }
        assert_eq!(emitted, vec![START, AFTER_E4]);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_alone_detects_changes() {
        let page = Arc::new(FakePage::with_attribute(START));
        let mut running = BoardWatcher::new(Arc::clone(&page)).start(Duration::from_millis(500));

        let first = running.changes.recv().await.unwrap();
        assert_eq!(first.fen, START);

        page.set_attribute(AFTER_E4);
        tokio::time::advance(Duration::from_millis(500)).await;
        let second = running.changes.recv().await.unwrap();
        assert_eq!(second.fen, AFTER_E4);

        running.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn host_lookup_error_does_not_stop_the_watcher() {
        let mut page = FakePage::default();
        page.globals.insert(
            String::from("game"),
            [(String::from("getFen"), HostCall::Threw(String::from("boom")))]
                .into_iter()
                .collect(),
        );
        *page.pieces.lock().unwrap_or_else(PoisonError::into_inner) =
            vec![String::from("piece bk square-58")];
        let mut running = BoardWatcher::new(Arc::new(page)).start(Duration::from_millis(500));

        let change = running.changes.recv().await.unwrap();
        assert!(change.is_approximate());
        assert_eq!(change.fen, "4k3/8/8/8/8/8/8/8 w KQkq - 0 1");
        running.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_poll_interval_keeps_the_timer_alive() {
        let page = Arc::new(FakePage::with_attribute(START));
        let mut running = BoardWatcher::new(Arc::clone(&page)).start(Duration::ZERO);

        assert_eq!(running.changes.recv().await.unwrap().fen, START);

        page.set_attribute(AFTER_E4);
        tokio::time::advance(MIN_POLL_INTERVAL).await;
        assert_eq!(running.changes.recv().await.unwrap().fen, AFTER_E4);

        running.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_board_accepts_zero_interval() {
        let page = FakePage::with_attribute(START);
        wait_for_board(&page, Duration::ZERO).await;
    }

    struct AppearsLater {
        rendered: AtomicBool,
    }

    impl BoardPage for AppearsLater {
        fn board_present(&self) -> bool {
            self.rendered.load(Ordering::SeqCst)
        }
        fn fen_attribute(&self) -> Option<String> {
            None
        }
        fn has_global(&self, _name: &str) -> bool {
            false
        }
        fn call_accessor(&self, _global: &str, _accessor: &str) -> HostCall {
            HostCall::Missing
        }
        fn piece_classes(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_board_polls_until_rendered() {
        let page = Arc::new(AppearsLater {
            rendered: AtomicBool::new(false),
        });
        let waiting = tokio::spawn({
            let page = Arc::clone(&page);
            async move { wait_for_board(page.as_ref(), BOARD_WAIT_INTERVAL).await }
        });

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(!waiting.is_finished());

        page.rendered.store(true, Ordering::SeqCst);
        tokio::time::advance(BOARD_WAIT_INTERVAL).await;
        waiting.await.unwrap();
    }
}
