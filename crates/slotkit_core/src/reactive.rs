//! Reactive core
//!
//! Owns a component's [`State`] and turns state updates into renders.
//!
//! - `set_state` shallow-merges a patch and, if anything changed, schedules a render.
//! - Any number of updates issued in one synchronous turn coalesce into a single
//!   render at the next scheduling boundary, which sees the final merged state.
//! - A render runs `render` on the attached [`RenderHooks`], then `rendered`, then
//!   raises public change events for updates made while `raise_change_events` was set.

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::scheduler::Scheduler;
use crate::state::{ChangedKeys, State, StatePatch};

/// Participant in a component's render pass
pub trait RenderHooks {
    /// Bring the DOM in line with `state`. `changed` lists what changed since the last render.
    fn render(&self, state: &State, changed: &[String]);

    /// Called after `render` completes, e.g. to measure the committed DOM
    fn rendered(&self, _state: &State, _changed: &[String]) {}
}

/// Public change event raised after a render
#[derive(Clone, Debug, PartialEq)]
pub struct StateChange {
    /// Keys updated while change events were being raised
    pub changed: ChangedKeys,
    /// State as of the end of the render
    pub state: State,
}

/// Listener for public change events
pub type ChangeListener = Rc<dyn Fn(&StateChange)>;

#[derive(Default)]
struct PendingRender {
    scheduled: bool,
    changed: ChangedKeys,
    observable: ChangedKeys,
}

impl PendingRender {
    fn note(&mut self, keys: impl IntoIterator<Item = String>, observable: bool) {
        for key in keys {
            if observable && !self.observable.contains(&key) {
                self.observable.push(key.clone());
            }
            if !self.changed.contains(&key) {
                self.changed.push(key);
            }
        }
    }
}

struct CoreShared {
    scheduler: Scheduler,
    state: RefCell<State>,
    pending: RefCell<PendingRender>,
    rendering: Cell<bool>,
    raise_change_events: Cell<bool>,
    hooks: RefCell<Option<Weak<dyn RenderHooks>>>,
    change_listeners: RefCell<Vec<ChangeListener>>,
    render_count: Cell<u64>,
}

/// Handle to a component's reactive core. Clones share the same core.
#[derive(Clone)]
pub struct ReactiveCore {
    shared: Rc<CoreShared>,
}

impl ReactiveCore {
    /// Create a core holding `default_state`. No render is scheduled yet.
    pub fn new(scheduler: Scheduler, default_state: State) -> Self {
        Self {
            shared: Rc::new(CoreShared {
                scheduler,
                state: RefCell::new(default_state),
                pending: RefCell::new(PendingRender::default()),
                rendering: Cell::new(false),
                raise_change_events: Cell::new(false),
                hooks: RefCell::new(None),
                change_listeners: RefCell::new(Vec::new()),
                render_count: Cell::new(0),
            }),
        }
    }

    /// Attach the render participant. The core only holds a weak reference.
    pub fn attach(&self, hooks: Weak<dyn RenderHooks>) {
        *self.shared.hooks.borrow_mut() = Some(hooks);
    }

    /// Current state snapshot
    pub fn state(&self) -> State {
        self.shared.state.borrow().clone()
    }

    /// Merge `patch` into state.
    ///
    /// Returns `true` if the state changed. The render this schedules never
    /// runs inside this call.
    pub fn set_state(&self, patch: StatePatch) -> bool {
        let merged = self.shared.state.borrow().merged(patch);
        let Some((next, changed)) = merged else {
            trace!("set_state produced no change");
            return false;
        };

        *self.shared.state.borrow_mut() = next;
        let observable = self.shared.raise_change_events.get();
        trace!(changed = ?changed, observable, "state updated");
        self.shared
            .pending
            .borrow_mut()
            .note(changed, observable);
        self.schedule();
        true
    }

    /// Schedule a render without a state change, e.g. after content changed
    pub fn request_render<I, K>(&self, changed: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.shared
            .pending
            .borrow_mut()
            .note(changed.into_iter().map(Into::into), false);
        self.schedule();
    }

    /// Run a pending render synchronously.
    ///
    /// Returns `false` if nothing was pending or a render is already underway.
    /// The queued continuation for a flushed render does nothing when it runs.
    pub fn flush(&self) -> bool {
        if self.shared.rendering.get() {
            trace!("flush ignored during render");
            return false;
        }
        self.render_pending()
    }

    /// Check if a render is waiting for the next scheduling boundary
    pub fn is_render_pending(&self) -> bool {
        self.shared.pending.borrow().scheduled
    }

    /// Check if `render` is currently executing
    pub fn is_rendering(&self) -> bool {
        self.shared.rendering.get()
    }

    /// Whether the current transition originated from a host-observable action
    pub fn raise_change_events(&self) -> bool {
        self.shared.raise_change_events.get()
    }

    pub fn set_raise_change_events(&self, raise: bool) {
        self.shared.raise_change_events.set(raise);
    }

    /// Run `f` with `raise_change_events` set, restoring the previous value afterwards
    pub fn with_change_events<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = self.shared.raise_change_events.replace(true);
        let result = f();
        self.shared.raise_change_events.set(previous);
        result
    }

    /// Register a listener for public change events
    pub fn on_change<F: Fn(&StateChange) + 'static>(&self, listener: F) {
        self.shared
            .change_listeners
            .borrow_mut()
            .push(Rc::new(listener));
    }

    /// Number of completed renders
    pub fn render_count(&self) -> u64 {
        self.shared.render_count.get()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.shared.scheduler
    }

    fn schedule(&self) {
        {
            let mut pending = self.shared.pending.borrow_mut();
            if pending.scheduled {
                trace!("render already scheduled");
                return;
            }
            pending.scheduled = true;
        }

        let weak = Rc::downgrade(&self.shared);
        self.shared.scheduler.queue("render", move || {
            if let Some(shared) = weak.upgrade() {
                ReactiveCore { shared }.render_pending();
            }
        });
    }

    fn render_pending(&self) -> bool {
        let (changed, observable) = {
            let mut pending = self.shared.pending.borrow_mut();
            if !pending.scheduled {
                return false;
            }
            pending.scheduled = false;
            (
                mem::take(&mut pending.changed),
                mem::take(&mut pending.observable),
            )
        };

        let state = self.state();
        let hooks = self
            .shared
            .hooks
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade);

        self.shared.rendering.set(true);
        if let Some(hooks) = &hooks {
            hooks.render(&state, &changed);
        }
        self.shared.rendering.set(false);

        let count = self.shared.render_count.get() + 1;
        self.shared.render_count.set(count);
        debug!(render = count, changed = ?changed, "render");

        if let Some(hooks) = &hooks {
            hooks.rendered(&state, &changed);
        }

        if !observable.is_empty() {
            let event = StateChange {
                changed: observable,
                state: self.state(),
            };
            let listeners = self.shared.change_listeners.borrow().clone();
            for listener in listeners {
                listener(&event);
            }
        }
        true
    }
}

impl std::fmt::Debug for ReactiveCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveCore")
            .field("state", &self.shared.state.borrow())
            .field("rendering", &self.shared.rendering.get())
            .field("render_count", &self.shared.render_count.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        renders: RefCell<Vec<(State, Vec<String>)>>,
        log: RefCell<Vec<&'static str>>,
        core: RefCell<Option<ReactiveCore>>,
        update_in_rendered: Cell<bool>,
    }

    impl RenderHooks for Recorder {
        fn render(&self, state: &State, changed: &[String]) {
            self.log.borrow_mut().push("render");
            self.renders
                .borrow_mut()
                .push((state.clone(), changed.to_vec()));
        }

        fn rendered(&self, _state: &State, _changed: &[String]) {
            self.log.borrow_mut().push("rendered");
            if self.update_in_rendered.replace(false) {
                if let Some(core) = self.core.borrow().as_ref() {
                    core.set_state(StatePatch::new().set("measured", true));
                }
            }
        }
    }

    fn setup(default_state: State) -> (Scheduler, ReactiveCore, Rc<Recorder>) {
        let scheduler = Scheduler::new();
        let core = ReactiveCore::new(scheduler.clone(), default_state);
        let recorder = Rc::new(Recorder::default());
        *recorder.core.borrow_mut() = Some(core.clone());
        let hooks: Weak<dyn RenderHooks> = Rc::downgrade(&recorder) as Weak<dyn RenderHooks>;
        core.attach(hooks);
        (scheduler, core, recorder)
    }

    #[test]
    fn test_updates_in_one_turn_coalesce() {
        let (scheduler, core, recorder) = setup(State::new());

        core.set_state(StatePatch::new().set("a", 1));
        core.set_state(StatePatch::new().set("b", 2));

        // Never renders inside set_state
        assert_eq!(core.render_count(), 0);
        assert!(core.is_render_pending());

        scheduler.run_until_idle();

        let renders = recorder.renders.borrow();
        assert_eq!(renders.len(), 1);
        let (state, changed) = &renders[0];
        assert_eq!(state.get("a"), Some(&json!(1)));
        assert_eq!(state.get("b"), Some(&json!(2)));
        assert_eq!(changed, &vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_unchanged_update_schedules_nothing() {
        let default_state: State = [("a", 1)].into_iter().collect();
        let (scheduler, core, recorder) = setup(default_state);

        assert!(!core.set_state(StatePatch::new().set("a", 1)));
        assert!(!core.is_render_pending());
        assert_eq!(scheduler.pending(), 0);

        scheduler.run_until_idle();
        assert!(recorder.renders.borrow().is_empty());
    }

    #[test]
    fn test_render_then_rendered() {
        let (scheduler, core, recorder) = setup(State::new());
        core.request_render(["content"]);
        scheduler.run_until_idle();

        assert_eq!(*recorder.log.borrow(), vec!["render", "rendered"]);
        assert_eq!(recorder.renders.borrow()[0].1, vec!["content".to_string()]);
    }

    #[test]
    fn test_update_in_rendered_schedules_another_render() {
        let (scheduler, core, recorder) = setup(State::new());
        recorder.update_in_rendered.set(true);

        core.set_state(StatePatch::new().set("a", 1));
        scheduler.run_until_idle();

        assert_eq!(core.render_count(), 2);
        assert_eq!(core.state().get_as::<bool>("measured"), Some(true));
        assert_eq!(
            *recorder.log.borrow(),
            vec!["render", "rendered", "render", "rendered"]
        );
    }

    #[test]
    fn test_flush_renders_synchronously_once() {
        let (scheduler, core, _recorder) = setup(State::new());
        core.set_state(StatePatch::new().set("a", 1));

        assert!(core.flush());
        assert_eq!(core.render_count(), 1);

        // The queued continuation finds nothing pending
        scheduler.run_until_idle();
        assert_eq!(core.render_count(), 1);
        assert!(!core.flush());
    }

    #[test]
    fn test_change_events_only_for_observable_updates() {
        let (scheduler, core, _recorder) = setup(State::new());
        let events = Rc::new(RefCell::new(Vec::new()));
        let events_clone = events.clone();
        core.on_change(move |change| events_clone.borrow_mut().push(change.clone()));

        // Internal update stays silent
        core.set_state(StatePatch::new().set("internal", 1));
        scheduler.run_until_idle();
        assert!(events.borrow().is_empty());

        core.with_change_events(|| {
            core.set_state(StatePatch::new().set("selectedIndex", 2));
        });
        core.set_state(StatePatch::new().set("internal", 2));
        assert!(!core.raise_change_events());
        scheduler.run_until_idle();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].changed.as_slice(), ["selectedIndex".to_string()]);
        assert_eq!(events[0].state.get_as::<i64>("internal"), Some(2));
    }

    #[test]
    fn test_core_without_hooks_still_counts_renders() {
        let scheduler = Scheduler::new();
        let core = ReactiveCore::new(scheduler.clone(), State::new());
        core.set_state(StatePatch::new().set("a", true));
        scheduler.run_until_idle();
        assert_eq!(core.render_count(), 1);
    }

    #[test]
    fn test_dropped_core_skips_queued_render() {
        let scheduler = Scheduler::new();
        let core = ReactiveCore::new(scheduler.clone(), State::new());
        core.set_state(StatePatch::new().set("a", true));
        drop(core);

        assert_eq!(scheduler.run_until_idle(), 1);
    }
}
