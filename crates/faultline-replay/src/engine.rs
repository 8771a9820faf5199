//! The replay loop and the checkpoint probe.

use std::cell::RefCell;

use crate::frame::FailureReplayFrame;

thread_local! {
    static ACTIVE: RefCell<Option<FailureReplayFrame>> = const { RefCell::new(None) };
}

/// Result of a completed replay loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// The callback's result on the run that forced no failure.
    pub result: bool,
    /// Number of times the callback ran.
    pub runs: usize,
    /// Checkpoints passed by the final run.
    pub checkpoints: usize,
}

/// Checkpoint probe for instrumented code.
///
/// Returns `true` if the caller must behave as if its resource request
/// failed. Always `false` when no replay is active on this thread.
pub fn simulate_failure() -> bool {
    ACTIVE.with(|slot| {
        slot.borrow_mut()
            .as_mut()
            .is_some_and(FailureReplayFrame::checkpoint)
    })
}

/// Whether a replay loop is active on this thread.
pub fn is_replay_active() -> bool {
    ACTIVE.with(|slot| slot.borrow().is_some())
}

/// Run `test` until it completes a run without a forced failure.
///
/// Returns the callback's result on that final run. A callback that
/// never reaches a checkpoint runs exactly once.
///
/// ```
/// use faultline_replay::{repeat_test, simulate_failure};
///
/// let mut runs = 0;
/// let ok = repeat_test(|| {
///     runs += 1;
///     !simulate_failure()
/// });
/// assert!(ok);
/// assert_eq!(runs, 2);
/// ```
pub fn repeat_test<F>(test: F) -> bool
where
    F: FnMut() -> bool,
{
    repeat_test_with_stats(test).result
}

/// Like [`repeat_test`], also reporting how many runs it took.
pub fn repeat_test_with_stats<F>(mut test: F) -> ReplayOutcome
where
    F: FnMut() -> bool,
{
    let _scope = FrameScope::enter();
    let mut runs = 0;
    loop {
        with_frame(FailureReplayFrame::reset_run);
        let result = test();
        runs += 1;

        let (triggered, checkpoints) =
            with_frame(|frame| (frame.triggered(), frame.checkpoint_count())).unwrap_or_default();
        if !triggered {
            log::debug!(
                target: "faultline::replay",
                "replay finished after {runs} runs ({checkpoints} checkpoints, result {result})"
            );
            return ReplayOutcome {
                result,
                runs,
                checkpoints,
            };
        }
        log::trace!(target: "faultline::replay", "run {runs}: forced failure, {checkpoints} checkpoints");
        with_frame(FailureReplayFrame::advance);
    }
}

fn with_frame<R>(op: impl FnOnce(&mut FailureReplayFrame) -> R) -> Option<R> {
    ACTIVE.with(|slot| slot.borrow_mut().as_mut().map(op))
}

/// Installs a fresh frame and puts the caller's frame back on drop,
/// including on unwind.
struct FrameScope {
    previous: Option<FailureReplayFrame>,
}

impl FrameScope {
    fn enter() -> Self {
        let previous = ACTIVE.with(|slot| slot.replace(Some(FailureReplayFrame::new())));
        Self { previous }
    }
}

impl Drop for FrameScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = ACTIVE.try_with(|slot| *slot.borrow_mut() = previous);
    }
}
