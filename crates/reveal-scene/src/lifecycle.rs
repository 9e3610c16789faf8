//! Lifetime scopes for registrations.
//!
//! Every handle a section obtains (trigger, timeline, interaction binding,
//! scroll subscription) is tracked by the scope the section was mounted in.
//! The stage tears all of them down together when the scope closes. A scope
//! is closed at most once; closing it again hands back nothing.

use crate::animation::types::{
    IdSource, InteractionId, ScopeId, SubscriptionId, TimelineId, TriggerId,
};
use crate::error::{Result, SceneError};

/// A handle whose owner must be released on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposable {
    Trigger(TriggerId),
    Timeline(TimelineId),
    Interaction(InteractionId),
    Subscription(SubscriptionId),
}

#[derive(Debug)]
pub struct LifecycleScope {
    id: ScopeId,
    name: String,
    tracked: Vec<Disposable>,
    closed: bool,
}

impl LifecycleScope {
    fn new(id: ScopeId, name: String) -> Self {
        Self {
            id,
            name,
            tracked: Vec::new(),
            closed: false,
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Handles tracked so far, in registration order.
    pub fn tracked(&self) -> &[Disposable] {
        &self.tracked
    }

    /// Fails once the scope is closed: registering into a torn down section
    /// is a caller bug.
    pub fn track(&mut self, disposable: Disposable) -> Result<()> {
        if self.closed {
            return Err(SceneError::ScopeClosed(self.id));
        }
        self.tracked.push(disposable);
        Ok(())
    }

    /// Mark closed and hand back everything tracked. `None` if already
    /// closed.
    fn close(&mut self) -> Option<Vec<Disposable>> {
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(std::mem::take(&mut self.tracked))
    }
}

/// Every scope a stage has opened. Closed scopes are kept so late
/// registrations through them still report `ScopeClosed`.
#[derive(Debug, Default)]
pub struct ScopeSet {
    scopes: Vec<LifecycleScope>,
    ids: IdSource,
}

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, name: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.ids.next());
        let scope = LifecycleScope::new(id, name.into());
        tracing::debug!(scope = %id, name = scope.name(), "scope opened");
        self.scopes.push(scope);
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&LifecycleScope> {
        self.scopes.iter().find(|scope| scope.id == id)
    }

    /// Fails with `UnknownScope` or `ScopeClosed` if `id` cannot take new
    /// registrations.
    pub fn ensure_open(&self, id: ScopeId) -> Result<()> {
        match self.get(id) {
            None => Err(SceneError::UnknownScope(id)),
            Some(scope) if scope.closed => Err(SceneError::ScopeClosed(id)),
            Some(_) => Ok(()),
        }
    }

    pub fn track(&mut self, id: ScopeId, disposable: Disposable) -> Result<()> {
        self.scopes
            .iter_mut()
            .find(|scope| scope.id == id)
            .ok_or(SceneError::UnknownScope(id))?
            .track(disposable)
    }

    /// Close a scope and return what it tracked. `None` if the scope is
    /// unknown or was already closed.
    pub fn close(&mut self, id: ScopeId) -> Option<Vec<Disposable>> {
        let scope = self.scopes.iter_mut().find(|scope| scope.id == id)?;
        let tracked = scope.close()?;
        tracing::debug!(scope = %id, name = scope.name(), released = tracked.len(), "scope closed");
        Some(tracked)
    }

    pub fn open_count(&self) -> usize {
        self.scopes.iter().filter(|scope| !scope.closed).count()
    }

    /// Forget closed scopes. Their ids then report `UnknownScope`.
    pub fn prune(&mut self) {
        self.scopes.retain(|scope| !scope.closed);
    }
}
