//! Latest-wins rate limiting for frame streams

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Extension trait adding [`RateLimited`] to any stream
pub trait RateLimitExt: Stream {
    /// Emit at most one item per `period`.
    ///
    /// Items arriving faster are coalesced and only the newest is emitted. The first
    /// item passes through immediately. Nothing is emitted while the source is idle.
    fn at_most_every(self, period: Duration) -> RateLimited<Self>
    where
        Self: Sized,
    {
        RateLimited::new(self, period)
    }
}

impl<T: Stream> RateLimitExt for T {}

pin_project! {
    /// Stream combinator returned by [`RateLimitExt::at_most_every`]
    pub struct RateLimited<S: Stream> {
        #[pin]
        source: S,
        gate: Interval,
        latest: Option<S::Item>,
        source_done: bool,
    }
}

impl<S: Stream> RateLimited<S> {
    pub fn new(source: S, period: Duration) -> Self {
        let mut gate = interval(period);
        gate.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { source, gate, latest: None, source_done: false }
    }
}

impl<S: Stream> Stream for RateLimited<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        while !*this.source_done {
            match this.source.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.latest = Some(item),
                Poll::Ready(None) => *this.source_done = true,
                Poll::Pending => break,
            }
        }

        if this.latest.is_none() {
            return if *this.source_done { Poll::Ready(None) } else { Poll::Pending };
        }

        // A final item after the source ends is flushed without waiting
        if !*this.source_done {
            ready!(this.gate.poll_tick(cx));
        }
        Poll::Ready(this.latest.take())
    }
}
