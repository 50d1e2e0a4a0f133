//! Cooperative layout scheduling.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use beluga::{LayoutRun, Step};

/// A layout run tagged with the request generation that started it.
pub(crate) struct LayoutTask {
    pub(crate) generation: u64,
    pub(crate) algorithm: &'static str,
    run: Box<dyn LayoutRun>,
    steps: usize,
}

impl LayoutTask {
    pub(crate) fn new(generation: u64, algorithm: &'static str, run: Box<dyn LayoutRun>) -> Self {
        Self {
            generation,
            algorithm,
            run,
            steps: 0,
        }
    }

    pub(crate) fn step(&mut self) -> beluga::Result<Step> {
        self.steps += 1;
        let step = self.run.step()?;
        tracing::debug!(
            generation = self.generation,
            algorithm = self.algorithm,
            step = self.steps,
            done = step.is_done(),
            "layout step"
        );
        Ok(step)
    }
}

/// Resolves after being polled once, giving the executor a chance to run other work.
#[derive(Debug, Default)]
pub(crate) struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

pub(crate) fn yield_now() -> YieldNow {
    YieldNow::default()
}
