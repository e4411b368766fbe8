#![forbid(unsafe_code)]

//! One-shot pending results.
//!
//! Every control call hands its caller a [`Pending<T>`] immediately and
//! settles it later, when the call's transition has resolved. A pending result
//! can be awaited like any future or polled without a waker via
//! [`Pending::try_take`].
//!
//! # Invariants
//!
//! 1. A [`Resolver`] settles its pending result at most once (it is consumed
//!    by `resolve`/`reject`).
//! 2. Dropping a `Resolver` without settling yields
//!    [`ModalError::Abandoned`] to the waiting side.
//! 3. Once `try_take` has returned a value, subsequent calls return `None`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::error::{ModalError, Result};

/// Settling side of a [`Pending`].
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Resolver<T> {
    /// Settle with a value. Returns `false` if the waiting side is gone.
    pub fn resolve(self, value: T) -> bool {
        self.tx.send(Ok(value)).is_ok()
    }

    /// Settle with an error. Returns `false` if the waiting side is gone.
    pub fn reject(self, error: ModalError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }

    /// Settle with a result.
    pub fn settle(self, result: Result<T>) -> bool {
        self.tx.send(result).is_ok()
    }

    /// Whether the waiting side has been dropped.
    pub fn is_canceled(&self) -> bool {
        self.tx.is_canceled()
    }
}

/// Result of a control call that may not have completed yet.
#[derive(Debug)]
#[must_use = "a pending result reports the outcome of the call"]
pub struct Pending<T> {
    state: PendingState<T>,
}

#[derive(Debug)]
enum PendingState<T> {
    Waiting(oneshot::Receiver<Result<T>>),
    Ready(Option<Result<T>>),
}

impl<T> Pending<T> {
    /// Create a linked pending/resolver pair.
    pub fn channel() -> (Resolver<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            Resolver { tx },
            Self {
                state: PendingState::Waiting(rx),
            },
        )
    }

    /// A pending result that is already settled with a value.
    pub fn ready(value: T) -> Self {
        Self::settled(Ok(value))
    }

    /// A pending result that is already settled with an error.
    pub fn failed(error: ModalError) -> Self {
        Self::settled(Err(error))
    }

    /// A pending result that is already settled.
    pub fn settled(result: Result<T>) -> Self {
        Self {
            state: PendingState::Ready(Some(result)),
        }
    }

    /// Take the outcome if it is available, without registering a waker.
    ///
    /// Returns `None` while the call is still in flight or after the outcome
    /// was already taken.
    pub fn try_take(&mut self) -> Option<Result<T>> {
        match &mut self.state {
            PendingState::Ready(slot) => slot.take(),
            PendingState::Waiting(rx) => {
                let outcome = match rx.try_recv() {
                    Ok(Some(result)) => result,
                    Ok(None) => return None,
                    Err(oneshot::Canceled) => Err(ModalError::Abandoned),
                };
                self.state = PendingState::Ready(None);
                Some(outcome)
            }
        }
    }

    /// Whether the outcome is available (and not yet taken).
    pub fn is_settled(&self) -> bool {
        matches!(self.state, PendingState::Ready(Some(_)))
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            PendingState::Ready(slot) => match slot.take() {
                Some(result) => Poll::Ready(result),
                None => Poll::Ready(Err(ModalError::invalid("pending result polled after completion"))),
            },
            PendingState::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(outcome) => {
                    this.state = PendingState::Ready(None);
                    Poll::Ready(outcome.unwrap_or(Err(ModalError::Abandoned)))
                }
            },
        }
    }
}

impl<T> Unpin for Pending<T> {}
