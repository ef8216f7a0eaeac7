use crate::Result;
use crate::metrics::{MetricKind, RawRecord};
use core::ops::{Deref, DerefMut};
use core::time::Duration;
use strum::Display;
use url::Url;

const LOG_TARGET: &str = "     session";

/// What to wait for when looking up a page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ElementState {
    /// The element is in the page.
    #[strum(to_string = "present")]
    Present,

    /// The element is in the page and rendered visibly.
    #[strum(to_string = "visible")]
    Visible,
}

/// An authenticated connection to the dashboard, driven one page at a time.
pub trait PageSession: Send {
    fn navigate(&mut self, url: &Url) -> impl Future<Output = Result<()>> + Send;

    /// Waits until an element matching `selector` reaches `state`, failing after `timeout`.
    fn wait_for_element(&mut self, selector: &str, timeout: Duration, state: ElementState) -> impl Future<Output = Result<()>> + Send;

    /// Starts the asynchronous export offered by the current page.
    ///
    /// Returning does not mean the artifact exists yet; it shows up in the download directory later.
    fn trigger_export(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn current_url(&self) -> Option<&Url>;

    /// Leaves a post-mortem trace of the current page, such as a screenshot, named after `label`.
    fn save_diagnostics(&mut self, label: &str) -> impl Future<Output = Result<()>> + Send {
        let _ = label;
        core::future::ready(Ok(()))
    }

    /// Ends the session. Called exactly once by [`SessionScope`].
    fn release(&mut self);
}

/// Reads a page-backed metric off the page the session is currently showing.
pub trait PageExtractor<S: PageSession>: Send {
    fn extract(&mut self, session: &mut S, kind: MetricKind) -> impl Future<Output = Result<RawRecord>> + Send;
}

/// Owns a session for the duration of a run and releases it exactly once.
///
/// The session is released by [`SessionScope::release`] or, failing that, when the scope is
/// dropped, including on early returns and unwinding.
#[derive(Debug)]
pub struct SessionScope<S: PageSession> {
    session: S,
    released: bool,
}

impl<S: PageSession> SessionScope<S> {
    pub const fn new(session: S) -> Self {
        Self { session, released: false }
    }

    /// Releases the session now.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            log::debug!(target: LOG_TARGET, "Releasing dashboard session");
            self.session.release();
        }
    }
}

impl<S: PageSession> Deref for SessionScope<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: PageSession> DerefMut for SessionScope<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: PageSession> Drop for SessionScope<S> {
    fn drop(&mut self) {
        self.release_once();
    }
}
