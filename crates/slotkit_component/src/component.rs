//! Assembled components
//!
//! A [`Component`] wires the pieces together: a [`ReactiveCore`] owning state,
//! a [`ContentObserver`] on the default slot, an [`ItemProjection`] and the
//! component's [`LayerChain`].
//!
//! Each render runs the layers' own render work first, then the item pass,
//! then `rendered` hooks.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotkit_core::{
    PipelineConfig, PipelineWarning, ReactiveCore, RenderHooks, Scheduler, State, StateChange,
    StatePatch, Value,
};
use slotkit_dom::{updates, Content, Element, ListenerId, ShadowRoot, SlotChangeEvent, UpdateDescription};
use tracing::debug;

use crate::items::{ItemProjection, ItemsForState};
use crate::layer::{ItemCalcs, ItemLayer, Items, LayerChain, LayerChainBuilder, LayerContext};
use crate::slot_content::ContentObserver;

/// Listener called after each render with the rendered state and changed keys
pub type RenderedListener = Rc<dyn Fn(&State, &[String])>;

struct ComponentShared {
    name: String,
    core: ReactiveCore,
    observer: ContentObserver,
    content: RefCell<Option<Content>>,
    projection: ItemProjection,
    layers: LayerChain,
    rendered_listeners: RefCell<Vec<RenderedListener>>,
    warnings: Vec<PipelineWarning>,
}

impl ComponentShared {
    fn content_changed(&self, content: &Content) {
        *self.content.borrow_mut() = Some(content.clone());
        self.core.request_render(["content"]);
    }
}

impl RenderHooks for ComponentShared {
    fn render(&self, state: &State, changed: &[String]) {
        let content = self.content.borrow().clone();
        let ctx = LayerContext {
            state,
            content: content.as_ref(),
            changed,
            raise_change_events: self.core.raise_change_events(),
        };

        self.layers.render(&ctx);
        let items = self.projection.items(&ctx, &self.layers);
        let patched = self.projection.render(&ctx, &self.layers, items.as_ref());
        debug!(component = %self.name, items = patched, "items patched");
    }

    fn rendered(&self, state: &State, changed: &[String]) {
        let content = self.content.borrow().clone();
        let ctx = LayerContext {
            state,
            content: content.as_ref(),
            changed,
            raise_change_events: self.core.raise_change_events(),
        };
        self.layers.rendered(&ctx);

        let listeners = self.rendered_listeners.borrow().clone();
        for listener in listeners {
            listener(state, changed);
        }
    }
}

/// A component instance. Clones refer to the same instance.
#[derive(Clone)]
pub struct Component {
    shared: Rc<ComponentShared>,
}

impl Component {
    pub fn builder(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current state snapshot
    pub fn state(&self) -> State {
        self.shared.core.state()
    }

    /// Merge `patch` into state; a render follows at the next boundary if anything changed
    pub fn set_state(&self, patch: StatePatch) -> bool {
        self.shared.core.set_state(patch)
    }

    /// Current items, memoized by content identity
    pub fn items(&self) -> Option<Items> {
        let state = self.state();
        let content = self.content();
        let ctx = self.context(&state, content.as_ref());
        self.shared.projection.items(&ctx, &self.shared.layers)
    }

    /// Projected content from the most recent notification
    pub fn content(&self) -> Option<Content> {
        self.shared.content.borrow().clone()
    }

    /// Facts the layers derive for `item` at `index` under the current state
    pub fn item_calcs(&self, item: &Element, index: usize) -> ItemCalcs {
        let state = self.state();
        let content = self.content();
        let ctx = self.context(&state, content.as_ref());
        self.shared.layers.item_calcs(&ctx, item, index)
    }

    /// Updates the layers want for `item` given `calcs`.
    ///
    /// Uses the item's original snapshot if one has been captured, otherwise
    /// its present state. Reading never captures a snapshot.
    pub fn item_updates(&self, item: &Element, calcs: &ItemCalcs) -> UpdateDescription {
        let state = self.state();
        let content = self.content();
        let ctx = self.context(&state, content.as_ref());
        let original = self
            .shared
            .projection
            .original_snapshot(item)
            .unwrap_or_else(|| Rc::new(updates::current(item)));
        self.shared
            .layers
            .item_updates(&ctx, item, calcs, &original)
    }

    /// The item as first seen by a render
    pub fn original_snapshot(&self, item: &Element) -> Option<Rc<UpdateDescription>> {
        self.shared.projection.original_snapshot(item)
    }

    /// Register a handler for content changes
    pub fn on_content_change<F: Fn(&Content) + 'static>(&self, handler: F) {
        self.shared.observer.on_content_change(handler);
    }

    /// Register a handler for raw `slotchange` events on the default slot
    pub fn on_slot_change<F: Fn(&SlotChangeEvent) + 'static>(&self, handler: F) -> Option<ListenerId> {
        self.shared.observer.on_slot_change(handler)
    }

    /// Register a listener called after each render
    pub fn on_rendered<F: Fn(&State, &[String]) + 'static>(&self, listener: F) {
        self.shared
            .rendered_listeners
            .borrow_mut()
            .push(Rc::new(listener));
    }

    /// Register a listener for public change events
    pub fn on_change<F: Fn(&StateChange) + 'static>(&self, listener: F) {
        self.shared.core.on_change(listener);
    }

    pub fn raise_change_events(&self) -> bool {
        self.shared.core.raise_change_events()
    }

    pub fn set_raise_change_events(&self, raise: bool) {
        self.shared.core.set_raise_change_events(raise);
    }

    /// Run `f` as a host-observable action
    pub fn with_change_events<R>(&self, f: impl FnOnce() -> R) -> R {
        self.shared.core.with_change_events(f)
    }

    /// Schedule a render without changing state
    pub fn invalidate(&self) {
        self.shared.core.request_render(std::iter::empty::<String>());
    }

    /// Run a pending render now. Returns `false` if none was pending.
    pub fn flush(&self) -> bool {
        self.shared.core.flush()
    }

    pub fn render_count(&self) -> u64 {
        self.shared.core.render_count()
    }

    pub fn is_rendering(&self) -> bool {
        self.shared.core.is_rendering()
    }

    /// Configuration warnings raised while assembling the component
    pub fn warnings(&self) -> &[PipelineWarning] {
        &self.shared.warnings
    }

    pub fn scheduler(&self) -> &Scheduler {
        self.shared.core.scheduler()
    }

    pub fn core(&self) -> &ReactiveCore {
        &self.shared.core
    }

    pub fn observer(&self) -> &ContentObserver {
        &self.shared.observer
    }

    fn context<'a>(&self, state: &'a State, content: Option<&'a Content>) -> LayerContext<'a> {
        LayerContext {
            state,
            content,
            changed: &[],
            raise_change_events: self.raise_change_events(),
        }
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.shared.name)
            .field("layers", &self.shared.layers.names())
            .field("core", &self.shared.core)
            .field("warnings", &self.shared.warnings)
            .finish()
    }
}

/// Builder for [`Component`]
pub struct ComponentBuilder {
    name: String,
    config: PipelineConfig,
    default_state: Vec<(String, Value)>,
    shadow_root: Option<ShadowRoot>,
    layers: LayerChainBuilder,
    items_for_state: Option<ItemsForState>,
    scheduler: Option<Scheduler>,
}

impl ComponentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: PipelineConfig::default(),
            default_state: Vec::new(),
            shadow_root: None,
            layers: LayerChain::builder(),
            items_for_state: None,
            scheduler: None,
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default state
    pub fn default_state(mut self, state: State) -> Self {
        self.default_state = state
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        self
    }

    /// Add one default state entry
    pub fn state(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_state.push((key.into(), value.into()));
        self
    }

    pub fn shadow_root(mut self, root: ShadowRoot) -> Self {
        self.shadow_root = Some(root);
        self
    }

    /// Add a layer on top of those already added
    pub fn layer<L: ItemLayer + 'static>(mut self, layer: L) -> Self {
        self.layers = self.layers.layer(layer);
        self
    }

    /// Compute items from content with `f` instead of taking substantive elements
    pub fn items_for_state<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Content>) -> Option<Items> + 'static,
    {
        self.items_for_state = Some(Box::new(f));
        self
    }

    /// Share a scheduler with other components. Defaults to a new one.
    ///
    /// A supplied scheduler keeps its own drain bound; `max_tasks_per_drain`
    /// from [`config`](Self::config) only applies to a scheduler created here.
    pub fn scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Assemble the component and schedule its initial render.
    ///
    /// Nothing renders until the scheduler drains. The first drain delivers
    /// the initial content and renders once with it.
    pub fn build(self) -> Component {
        let scheduler = match self.scheduler {
            Some(scheduler) => {
                if scheduler.max_tasks_per_drain() != self.config.max_tasks_per_drain {
                    debug!(
                        component = %self.name,
                        scheduler = scheduler.max_tasks_per_drain(),
                        config = self.config.max_tasks_per_drain,
                        "supplied scheduler keeps its own drain bound"
                    );
                }
                scheduler
            }
            None => Scheduler::with_config(&self.config),
        };
        let default_state: State = self.default_state.into_iter().collect();
        let default_keys: Vec<String> = default_state.keys().map(str::to_string).collect();

        let core = ReactiveCore::new(scheduler, default_state);
        let observer = ContentObserver::new(&self.name, self.shadow_root.as_ref(), &core, &self.config);
        let warnings: Vec<PipelineWarning> = observer.warning().cloned().into_iter().collect();
        let projection = match self.items_for_state {
            Some(items_for_state) => ItemProjection::with_items_for_state(items_for_state),
            None => ItemProjection::new(),
        };

        let shared = Rc::new(ComponentShared {
            name: self.name,
            core: core.clone(),
            observer,
            content: RefCell::new(None),
            projection,
            layers: self.layers.build(),
            rendered_listeners: RefCell::new(Vec::new()),
            warnings,
        });

        let hooks: Weak<dyn RenderHooks> = Rc::downgrade(&shared) as Weak<dyn RenderHooks>;
        core.attach(hooks);

        let weak = Rc::downgrade(&shared);
        shared.observer.on_content_change(move |content| {
            if let Some(shared) = weak.upgrade() {
                shared.content_changed(content);
            }
        });

        debug!(
            component = %shared.name,
            layers = ?shared.layers.names(),
            "component created"
        );
        core.request_render(default_keys);

        Component { shared }
    }
}
