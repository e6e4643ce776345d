//! Markers tracking which required builder inputs were supplied
//!
//! `build()` only exists on `ConnectionManagerBuilder<HasUrl, HasRouter>`, so
//! a manager without a socket URL or a message router does not compile.

use std::marker::PhantomData;

/// Whether the socket URL was given
pub trait UrlState {}

/// Socket URL missing
pub struct NoUrl;
/// Socket URL supplied
pub struct HasUrl;

impl UrlState for NoUrl {}
impl UrlState for HasUrl {}

/// Whether the message router was given
pub trait RouterState {}

/// Router missing
pub struct NoRouter;
/// Router supplied
pub struct HasRouter;

impl RouterState for NoRouter {}
impl RouterState for HasRouter {}

/// Zero-sized carrier of both markers
#[derive(Debug, Clone, Copy)]
pub struct Progress<U, R>(PhantomData<(U, R)>);

impl<U, R> Progress<U, R> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}
