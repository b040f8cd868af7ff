// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene: node store, class registry, routes, worklist, and bind stacks.
//!
//! Every public entry point that can produce events ([`process_event`],
//! [`emit_event`], [`set_field`], [`bind`], [`initialize`], [`tick`], ...)
//! drains the event worklist to a fixpoint before it returns, so callers
//! always observe a settled scene.
//!
//! [`process_event`]: Scene::process_event
//! [`emit_event`]: Scene::emit_event
//! [`set_field`]: Scene::set_field
//! [`bind`]: Scene::bind
//! [`initialize`]: Scene::initialize
//! [`tick`]: Scene::tick

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::bindable::{BindOutcome, BindableState};
use crate::bounds::BoundingSphere;
use crate::browser::{Browser, NullBrowser};
use crate::config::SceneConfig;
use crate::error::Error;
use crate::event::{Emission, Enqueued, EventQueue, Route, RouteTable};
use crate::field::FieldValue;
use crate::node::capability::{
    AppearanceNode, BindableNode, BoundsSource, BrowserBinding, Capability, GeometryNode,
    GroupingNode, LightNode, PointerEvent, PointingDeviceSensorNode, TextureNode,
    TimeDependentNode,
};
use crate::node::{
    InterfaceKind, NodeClass, NodeContext, NodeId, NodeStore, NodeType, NodeView, Port, Scope,
};
use crate::trace::{
    CascadeTruncated, DeliveryFailure, EventLoopBroken, LifecyclePhase, NodeLifecycleEvent,
    TickEvent, TickSummary, TraceSink, Tracer,
};
use crate::viewer::ObjectHandle;

/// A VRML97 scene.
pub struct Scene {
    store: NodeStore,
    classes: BTreeMap<String, Rc<NodeClass>>,
    default_types: BTreeMap<String, Rc<NodeType>>,
    root_scope: Rc<Scope>,
    roots: Vec<NodeId>,
    routes: RouteTable,
    queue: EventQueue,
    bindables: BTreeMap<String, BindableState>,
    time_dependents: Vec<NodeId>,
    browser: Box<dyn Browser>,
    tracer: Tracer,
    config: SceneConfig,
    tick_index: u64,
    current_time: f64,
    initialized: bool,
    needs_redraw: bool,
    pub(crate) pending_removals: Vec<ObjectHandle>,
    stats: TickSummary,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.store.len())
            .field("roots", &self.roots)
            .field("routes", &self.routes.len())
            .field("config", &self.config)
            .field("current_time", &self.current_time)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    /// Creates an empty scene with a [`NullBrowser`] and no trace sink.
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        Self {
            store: NodeStore::new(),
            classes: BTreeMap::new(),
            default_types: BTreeMap::new(),
            root_scope: Scope::new(""),
            roots: Vec::new(),
            routes: RouteTable::new(),
            queue: EventQueue::default(),
            bindables: BTreeMap::new(),
            time_dependents: Vec::new(),
            browser: Box::new(NullBrowser),
            tracer: Tracer::none(),
            config,
            tick_index: 0,
            current_time: 0.0,
            initialized: false,
            needs_redraw: false,
            pending_removals: Vec::new(),
            stats: TickSummary::default(),
        }
    }

    // -- Collaborators --

    /// Installs the host browser.
    pub fn set_browser(&mut self, browser: Box<dyn Browser>) {
        self.browser = browser;
    }

    /// The host browser.
    pub fn browser_mut(&mut self) -> &mut dyn Browser {
        &mut *self.browser
    }

    /// Installs a trace sink. Without the `trace` feature the sink is dropped.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    /// Node storage.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    #[inline]
    pub(crate) fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    /// Configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The outermost DEF/USE scope.
    #[inline]
    #[must_use]
    pub fn root_scope(&self) -> &Rc<Scope> {
        &self.root_scope
    }

    /// Resolves a DEF name in the root scope.
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.root_scope
            .find_node(name)
            .filter(|&id| self.store.is_alive(id))
    }

    /// Scene time of the latest tick or entry point.
    #[inline]
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Replaces the typed per-node state of `id` from outside a hook, for
    /// browser-side data attached to a node (a viewpoint's navigation
    /// offset).
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`].
    pub fn set_node_state<T: core::any::Any>(&mut self, id: NodeId, state: T) -> Result<(), Error> {
        self.live_type(id)?;
        self.store.state[id.idx as usize] = Some(Box::new(state));
        Ok(())
    }

    /// Read-only view of a live node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn view(&self, id: NodeId) -> NodeView<'_> {
        self.store.view(id)
    }

    /// Whether `id` refers to a live node.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.store.is_alive(id)
    }

    // -- Class registry --

    /// Registers a node class, replacing any class with the same id.
    pub fn add_node_class(&mut self, class: NodeClass) -> Rc<NodeClass> {
        let class = Rc::new(class);
        let id = String::from(class.id());
        self.default_types.remove(&id);
        if class.supports(Capability::Bindable) {
            self.bindables.entry(id.clone()).or_default();
        }
        self.classes.insert(id, class.clone());
        class
    }

    /// The class registered under `id`.
    #[must_use]
    pub fn node_class(&self, id: &str) -> Option<&Rc<NodeClass>> {
        self.classes.get(id)
    }

    /// Registered classes in id order.
    pub fn node_classes(&self) -> impl Iterator<Item = &Rc<NodeClass>> {
        self.classes.values()
    }

    // -- Node creation --

    /// Creates a node of `node_type` in `scope`, optionally DEF-named.
    ///
    /// `initial_values` name fields or exposedFields; unnamed ones keep their
    /// defaults. Values are stored without running side effects. The node
    /// starts unreferenced; attach it with [`add_root`](Self::add_root) or by
    /// writing it into a node-valued field.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownInterface`] for a name that is not a field or
    ///   exposedField of the type.
    /// - [`Error::TypeMismatch`] for a value of the wrong type.
    /// - [`Error::NodeExpired`] for a node-valued value referencing a
    ///   destroyed node.
    /// - [`Error::OutOfMemory`] on allocation failure.
    pub fn create_node(
        &mut self,
        node_type: &Rc<NodeType>,
        scope: &Rc<Scope>,
        name: Option<&str>,
        initial_values: &[(&str, FieldValue)],
    ) -> Result<NodeId, Error> {
        let mut values = node_type.initial_values()?;
        for (field, value) in initial_values {
            let port = field_port(node_type, field)?;
            check_type(&port, value)?;
            if let Some(&dead) = value.node_refs().iter().find(|&&c| !self.store.is_alive(c)) {
                return Err(Error::NodeExpired(dead));
            }
            if let Some(slot) = port.slot {
                values[slot] = value.clone();
            }
        }

        let id = self.store.allocate(node_type.clone(), values)?;
        let children: Vec<NodeId> = self.store.children(id).collect();
        for &child in &children {
            if let Err(error) = self.store.add_bounds_dependency(id, child) {
                let _ = self.store.free(id);
                return Err(error);
            }
        }
        for child in children {
            self.retain(child);
        }
        self.store.scope[id.idx as usize] = Some(scope.clone());
        if let Some(name) = name {
            self.store.name[id.idx as usize] = Some(name.into());
            scope.define(name, id);
        }
        self.tracer.node_lifecycle(&NodeLifecycleEvent {
            node: id,
            class_id: node_type.class_id(),
            phase: LifecyclePhase::Created,
        });
        Ok(id)
    }

    /// Creates a node of the registered class `class_id` exposing every
    /// interface, in the root scope.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNodeClass`], or as [`create_node`](Self::create_node).
    pub fn create_default_node(
        &mut self,
        class_id: &str,
        name: Option<&str>,
        initial_values: &[(&str, FieldValue)],
    ) -> Result<NodeId, Error> {
        let node_type = self.default_type(class_id)?;
        let scope = self.root_scope.clone();
        self.create_node(&node_type, &scope, name, initial_values)
    }

    /// The cached all-interfaces type of a registered class.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNodeClass`] or [`Error::OutOfMemory`].
    pub fn default_type(&mut self, class_id: &str) -> Result<Rc<NodeType>, Error> {
        if let Some(t) = self.default_types.get(class_id) {
            return Ok(t.clone());
        }
        let class = self
            .classes
            .get(class_id)
            .ok_or_else(|| Error::UnknownNodeClass(class_id.into()))?;
        let t = class.create_default_type(String::from(class_id))?;
        self.default_types.insert(class_id.into(), t.clone());
        Ok(t)
    }

    // -- Roots --

    /// Adds a scene root. Initializes it if the scene is initialized.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`] or [`Error::OutOfMemory`].
    pub fn add_root(&mut self, id: NodeId) -> Result<(), Error> {
        self.live_type(id)?;
        self.roots.try_reserve(1)?;
        self.roots.push(id);
        self.retain(id);
        if self.initialized {
            let t = self.current_time;
            self.initialize_node(id, t);
            self.drain();
        }
        Ok(())
    }

    /// Removes the first occurrence of `id` from the roots and releases it.
    /// Returns whether it was a root.
    pub fn remove_root(&mut self, id: NodeId, timestamp: f64) -> bool {
        let Some(pos) = self.roots.iter().position(|&r| r == id) else {
            return false;
        };
        self.roots.remove(pos);
        self.release(id, timestamp);
        self.drain();
        true
    }

    /// Scene roots in order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    // -- Fields --

    /// Current value of a field, exposedField, or eventOut.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`] or [`Error::UnknownInterface`].
    pub fn field(&self, id: NodeId, name: &str) -> Result<&FieldValue, Error> {
        let node_type = self
            .store
            .try_node_type(id)
            .ok_or(Error::NodeExpired(id))?;
        let slot = node_type
            .value_port(name)
            .and_then(|p| p.slot)
            .ok_or_else(|| node_type.unknown(name))?;
        Ok(self.store.value(id, slot))
    }

    /// Stores `value` into a field or exposedField, marks the node modified,
    /// and runs the side effect, without emitting `_changed`.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`], [`Error::UnknownInterface`],
    /// [`Error::TypeMismatch`], [`Error::NodeCycle`], or
    /// [`Error::OutOfMemory`].
    pub fn set_field(&mut self, id: NodeId, name: &str, value: FieldValue) -> Result<(), Error> {
        let t = self.current_time;
        let result = self.write_field(id, name, value, t, false);
        self.drain();
        result
    }

    // -- Events --

    /// Delivers `value` to the eventIn (or exposedField) `event_in` of `id`,
    /// then drains the worklist.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`], [`Error::UnknownInterface`],
    /// [`Error::TypeMismatch`], [`Error::NodeCycle`], or whatever the
    /// handler returns. Errors of
    /// deliveries cascading from this one are traced, not returned.
    pub fn process_event(
        &mut self,
        id: NodeId,
        event_in: &str,
        value: FieldValue,
        timestamp: f64,
    ) -> Result<(), Error> {
        let node_type = self.live_type(id)?;
        let port = node_type
            .listener(event_in)
            .ok_or_else(|| node_type.unknown(event_in))?;
        self.current_time = self.current_time.max(timestamp);
        let result = self.deliver(id, port, &value, timestamp);
        self.drain();
        result
    }

    /// Sends the current value of `event_out` along its routes, then drains
    /// the worklist.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`], [`Error::UnknownInterface`], or
    /// [`Error::OutOfMemory`].
    pub fn emit_event(&mut self, id: NodeId, event_out: &str, timestamp: f64) -> Result<(), Error> {
        let node_type = self.live_type(id)?;
        let port = node_type
            .emitter(event_out)
            .ok_or_else(|| node_type.unknown(event_out))?;
        let value = match port.slot {
            Some(slot) => self.store.value(id, slot).clone(),
            None => port.field_type().default_value(),
        };
        let result = self.queue_emission(id, port, value, timestamp);
        self.drain();
        result
    }

    /// Routes `event_out` of `from` to `event_in` of `to`. Returns `false` if
    /// the route already existed.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`], [`Error::UnknownInterface`],
    /// [`Error::TypeMismatch`], or [`Error::OutOfMemory`].
    pub fn add_route(
        &mut self,
        from: NodeId,
        event_out: &str,
        to: NodeId,
        event_in: &str,
    ) -> Result<bool, Error> {
        let route = self.resolve_route(from, event_out, to, event_in)?;
        self.routes.add(route)
    }

    /// Removes a route. Returns whether it existed.
    pub fn delete_route(&mut self, from: NodeId, event_out: &str, to: NodeId, event_in: &str) -> bool {
        match self.resolve_route(from, event_out, to, event_in) {
            Ok(route) => self.routes.remove(&route),
            Err(_) => false,
        }
    }

    /// All routes.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    fn resolve_route(
        &self,
        from: NodeId,
        event_out: &str,
        to: NodeId,
        event_in: &str,
    ) -> Result<Route, Error> {
        let from_type = self.live_type(from)?;
        let to_type = self.live_type(to)?;
        let out = from_type
            .emitter(event_out)
            .ok_or_else(|| from_type.unknown(event_out))?;
        let inp = to_type
            .listener(event_in)
            .ok_or_else(|| to_type.unknown(event_in))?;
        if out.field_type() != inp.field_type() {
            return Err(Error::TypeMismatch {
                expected: inp.field_type(),
                found: out.field_type(),
            });
        }
        Ok(Route {
            from,
            from_port: out.index,
            event_out: out.name(),
            to,
            to_port: inp.index,
            event_in: inp.name(),
        })
    }

    // -- Bound-node stacks --

    /// Binds `id` (moves it to the top of its class's stack), then drains.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`] or [`Error::OutOfMemory`].
    pub fn bind(&mut self, id: NodeId, timestamp: f64) -> Result<(), Error> {
        let result = self.bind_node(id, timestamp);
        self.drain();
        result
    }

    /// Unbinds `id` (removes it from its class's stack), then drains.
    ///
    /// Removing a node from anywhere in the stack tells the browser the
    /// current top (or `None` when the stack empties). Removing a covered
    /// node emits nothing, since it is already unbound. A revealed top gets
    /// `isBound TRUE` stored and emitted; like every emission, it is dropped
    /// if `isBound` of that node already fired at this timestamp in the same
    /// cascade, but the stored value stays current.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`].
    pub fn unbind(&mut self, id: NodeId, timestamp: f64) -> Result<(), Error> {
        let result = self.unbind_node(id, timestamp);
        self.drain();
        result
    }

    /// Bind bookkeeping of a bindable class.
    #[must_use]
    pub fn bindable_state(&self, class_id: &str) -> Option<&BindableState> {
        self.bindables.get(class_id)
    }

    /// The active (top-of-stack) node of a bindable class.
    #[must_use]
    pub fn active(&self, class_id: &str) -> Option<NodeId> {
        self.bindables.get(class_id)?.stack().top()
    }

    pub(crate) fn bind_node(&mut self, id: NodeId, timestamp: f64) -> Result<(), Error> {
        let node_type = self.live_type(id)?;
        let Some(bindable) = node_type.capabilities().bindable else {
            return Ok(());
        };
        let state = self.bindables.entry(node_type.class_id().into()).or_default();
        match state.stack_mut().bind(id)? {
            BindOutcome::Unchanged => {}
            BindOutcome::Bound { previous_top } => {
                if let Some(prev) = previous_top {
                    self.set_bound(prev, node_type.class_id(), false, timestamp);
                }
                self.set_bound(id, node_type.class_id(), true, timestamp);
                self.emit_if_present(id, "bindTime", FieldValue::SfTime(timestamp), timestamp);
                self.notify_active(bindable, Some(id));
            }
        }
        Ok(())
    }

    pub(crate) fn unbind_node(&mut self, id: NodeId, timestamp: f64) -> Result<(), Error> {
        let node_type = self.live_type(id)?;
        let Some(bindable) = node_type.capabilities().bindable else {
            return Ok(());
        };
        let Some(state) = self.bindables.get_mut(node_type.class_id()) else {
            return Ok(());
        };
        let outcome = state.stack_mut().unbind(id);
        let top = state.stack().top();
        if !outcome.removed {
            return Ok(());
        }
        if outcome.was_top {
            self.set_bound(id, node_type.class_id(), false, timestamp);
            if let Some(revealed) = outcome.new_top {
                self.set_bound(revealed, node_type.class_id(), true, timestamp);
            }
        }
        self.notify_active(bindable, top);
        Ok(())
    }

    fn set_bound(&mut self, id: NodeId, class_id: &str, bound: bool, timestamp: f64) {
        self.emit_if_present(id, "isBound", FieldValue::SfBool(bound), timestamp);
        self.tracer.bind_changed(&crate::trace::BindEvent {
            class_id,
            node: id,
            bound,
            timestamp,
        });
    }

    fn notify_active(&mut self, bindable: BindableNode, node: Option<NodeId>) {
        match bindable.browser {
            BrowserBinding::None => {}
            BrowserBinding::Viewpoint => self.browser.active_viewpoint_changed(node),
            BrowserBinding::NavigationInfo => self.browser.active_navigation_info_changed(node),
        }
    }

    fn emit_if_present(&mut self, id: NodeId, event_out: &str, value: FieldValue, timestamp: f64) {
        let Some(port) = self.store.try_node_type(id).and_then(|t| t.emitter(event_out)) else {
            return;
        };
        if let Err(error) = self.queue_emission(id, port, value, timestamp) {
            self.report_failure(id, event_out, id, "", timestamp, &error);
        }
    }

    // -- Lifecycle --

    /// Initializes every root subtree, binds the first node of each bindable
    /// class (unless configured off), and drains the worklist. Does nothing
    /// if already initialized.
    pub fn initialize(&mut self, timestamp: f64) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.current_time = timestamp;
        let roots = self.roots.clone();
        for root in roots {
            self.initialize_node(root, timestamp);
        }
        if self.config.bind_first_on_initialize {
            let firsts: Vec<NodeId> = self.bindables.values().filter_map(BindableState::first).collect();
            for first in firsts {
                let Some(node_type) = self.store.try_node_type(first).cloned() else {
                    continue;
                };
                let value = FieldValue::SfBool(true);
                let result = match node_type.listener("set_bind") {
                    Some(port) => self.deliver(first, port, &value, timestamp),
                    None => self.bind_node(first, timestamp),
                };
                if let Err(error) = result {
                    self.report_failure(first, "", first, "set_bind", timestamp, &error);
                }
            }
        }
        self.drain();
    }

    /// Shuts down every root subtree and discards pending events.
    pub fn shutdown(&mut self, timestamp: f64) {
        if !self.initialized {
            return;
        }
        let roots = self.roots.clone();
        for root in roots {
            self.shutdown_subtree(root, timestamp);
        }
        self.initialized = false;
        self.queue.clear();
    }

    /// Whether [`initialize`](Self::initialize) has run (and
    /// [`shutdown`](Self::shutdown) has not).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initializes `id` and every uninitialized node reachable through
    /// node-valued fields.
    pub(crate) fn initialize_node(&mut self, id: NodeId, timestamp: f64) {
        let mut pending = alloc::vec![id];
        while let Some(n) = pending.pop() {
            if !self.store.is_alive(n) || self.store.initialized[n.idx as usize] {
                continue;
            }
            self.store.initialized[n.idx as usize] = true;
            let node_type = self.store.node_type(n).clone();
            let caps = node_type.capabilities();
            if caps.time_dependent.is_some() {
                self.time_dependents.push(n);
                self.browser.add_time_dependent(n);
            }
            if let Some(LightNode { scoped: true, .. }) = caps.light {
                self.browser.add_scoped_light(n);
            }
            if let Some(bindable) = caps.bindable {
                let state = self.bindables.entry(node_type.class_id().into()).or_default();
                if !state.has_first() {
                    state.set_first(n);
                }
                if bindable.browser == BrowserBinding::Viewpoint {
                    self.browser.add_viewpoint(n);
                }
            }
            if let Some(hook) = node_type.decl().initialize {
                hook(&mut NodeContext::new(self, n), timestamp);
            }
            self.tracer.node_lifecycle(&NodeLifecycleEvent {
                node: n,
                class_id: node_type.class_id(),
                phase: LifecyclePhase::Initialized,
            });
            if self.store.is_alive(n) {
                let start = pending.len();
                pending.extend(self.store.children(n));
                pending[start..].reverse();
            }
        }
    }

    fn shutdown_subtree(&mut self, id: NodeId, timestamp: f64) {
        let mut pending = alloc::vec![id];
        while let Some(n) = pending.pop() {
            if !self.store.is_alive(n) || !self.store.initialized[n.idx as usize] {
                continue;
            }
            pending.extend(self.store.children(n));
            self.shutdown_node(n, timestamp);
        }
    }

    /// Undoes [`initialize_node`](Self::initialize_node) for one node. Bind
    /// state is cleared whether or not the node was initialized.
    fn shutdown_node(&mut self, id: NodeId, timestamp: f64) {
        let node_type = self.store.node_type(id).clone();
        let caps = node_type.capabilities();
        let initialized = self.store.initialized[id.idx as usize];

        if initialized && let Some(hook) = node_type.decl().shutdown {
            hook(&mut NodeContext::new(self, id), timestamp);
        }
        if let Some(bindable) = caps.bindable {
            if let Err(error) = self.unbind_node(id, timestamp) {
                self.report_failure(id, "", id, "set_bind", timestamp, &error);
            }
            if let Some(state) = self.bindables.get_mut(node_type.class_id())
                && state.is_first(id)
            {
                state.reset_first();
            }
            if initialized && bindable.browser == BrowserBinding::Viewpoint {
                self.browser.remove_viewpoint(id);
            }
        }
        if !initialized {
            return;
        }
        if caps.time_dependent.is_some() {
            self.time_dependents.retain(|&n| n != id);
            self.browser.remove_time_dependent(id);
        }
        if let Some(LightNode { scoped: true, .. }) = caps.light {
            self.browser.remove_scoped_light(id);
        }
        if let Some(object) = self.store.viewer_object[id.idx as usize].take() {
            self.pending_removals.push(object);
        }
        self.store.initialized[id.idx as usize] = false;
        self.tracer.node_lifecycle(&NodeLifecycleEvent {
            node: id,
            class_id: node_type.class_id(),
            phase: LifecyclePhase::ShutDown,
        });
    }

    // -- Ownership --

    fn retain(&mut self, id: NodeId) {
        self.store.ref_count[id.idx as usize] += 1;
    }

    /// Drops one reference to `id`, destroying it (and releasing its
    /// children) when none remain.
    fn release(&mut self, id: NodeId, timestamp: f64) {
        let mut pending = alloc::vec![id];
        while let Some(n) = pending.pop() {
            if !self.store.is_alive(n) {
                continue;
            }
            let count = &mut self.store.ref_count[n.idx as usize];
            *count = count.saturating_sub(1);
            if *count > 0 {
                continue;
            }
            let node_type = self.store.node_type(n).clone();
            self.shutdown_node(n, timestamp);
            self.routes.remove_node(n);
            if let (Some(name), Some(scope)) = (
                self.store.name[n.idx as usize].as_deref(),
                self.store.scope[n.idx as usize].as_ref(),
            ) {
                scope.undefine(name, n);
            }
            if let Some(object) = self.store.viewer_object[n.idx as usize].take() {
                self.pending_removals.push(object);
            }
            for value in self.store.free(n) {
                pending.extend_from_slice(value.node_refs());
            }
            self.needs_redraw = true;
            self.tracer.node_lifecycle(&NodeLifecycleEvent {
                node: n,
                class_id: node_type.class_id(),
                phase: LifecyclePhase::Destroyed,
            });
        }
    }

    // -- Writes and emissions --

    fn live_type(&self, id: NodeId) -> Result<Rc<NodeType>, Error> {
        self.store
            .try_node_type(id)
            .cloned()
            .ok_or(Error::NodeExpired(id))
    }

    /// Writes a field or exposedField by name; with `notify`, an exposedField
    /// also emits `_changed`.
    pub(crate) fn write_field(
        &mut self,
        id: NodeId,
        name: &str,
        value: FieldValue,
        timestamp: f64,
        notify: bool,
    ) -> Result<(), Error> {
        let node_type = self.live_type(id)?;
        let port = field_port(&node_type, name)?;
        check_type(&port, &value)?;
        if notify && port.kind() == InterfaceKind::ExposedField {
            self.write_exposed(id, port, value, timestamp)
        } else {
            self.assign(id, port, value, timestamp)
        }
    }

    /// Emits from an eventOut, or writes and emits an exposedField.
    pub(crate) fn emit_value(
        &mut self,
        id: NodeId,
        event_out: &str,
        value: FieldValue,
        timestamp: f64,
    ) -> Result<(), Error> {
        let node_type = self.live_type(id)?;
        let port = node_type
            .emitter(event_out)
            .ok_or_else(|| node_type.unknown(event_out))?;
        check_type(&port, &value)?;
        if port.kind() == InterfaceKind::ExposedField {
            self.write_exposed(id, port, value, timestamp)
        } else {
            self.queue_emission(id, port, value, timestamp)
        }
    }

    fn write_exposed(&mut self, id: NodeId, port: Port, value: FieldValue, timestamp: f64) -> Result<(), Error> {
        self.assign(id, port, value.clone(), timestamp)?;
        self.queue_emission(id, port, value, timestamp)
    }

    /// Stores `value` in the port's slot, keeps ownership and the bounds
    /// graph in sync for node-valued fields, marks the node modified, and
    /// runs the side effect once.
    fn assign(&mut self, id: NodeId, port: Port, value: FieldValue, timestamp: f64) -> Result<(), Error> {
        let Some(slot) = port.slot else {
            return Err(self.store.node_type(id).unknown(port.name()));
        };
        if port.field_type().is_node() {
            if let Some(&dead) = value.node_refs().iter().find(|&&c| !self.store.is_alive(c)) {
                return Err(Error::NodeExpired(dead));
            }
            if let Some(&child) = value.node_refs().iter().find(|&&c| self.store.reaches(c, id)) {
                return Err(Error::NodeCycle { parent: id, child });
            }
            for &child in value.node_refs() {
                self.store.add_bounds_dependency(id, child)?;
            }
            for &child in value.node_refs() {
                self.retain(child);
            }
            let old = self.store.replace_value(id, slot, value);
            let still: Vec<NodeId> = self.store.children(id).collect();
            for &child in old.node_refs() {
                if !still.contains(&child) {
                    self.store.remove_bounds_dependency(id, child);
                }
            }
            if self.store.initialized[id.idx as usize] {
                let attached: Vec<NodeId> = self.store.value(id, slot).node_refs().to_vec();
                for child in attached {
                    self.initialize_node(child, timestamp);
                }
            }
            for &child in old.node_refs() {
                self.release(child, timestamp);
            }
            self.store.mark_bounds_dirty(id);
        } else {
            let _ = self.store.replace_value(id, slot, value);
        }
        self.store.modified[id.idx as usize] = true;
        self.needs_redraw = true;
        if let Some(side_effect) = port.decl.side_effect {
            let current = self.store.value(id, slot).clone();
            side_effect(&mut NodeContext::new(self, id), &current, timestamp);
        }
        Ok(())
    }

    /// Records an eventOut value and queues it for every route leaving the
    /// emitter. Node-valued eventOut slots are not written, so emitting a node
    /// never takes ownership of it.
    fn queue_emission(&mut self, id: NodeId, port: Port, value: FieldValue, timestamp: f64) -> Result<(), Error> {
        if port.kind() == InterfaceKind::EventOut
            && !port.field_type().is_node()
            && let Some(slot) = port.slot
        {
            let _ = self.store.replace_value(id, slot, value.clone());
        }
        let mut targets = Vec::new();
        for route in self.routes.targets(id, port.index) {
            targets.try_reserve(1)?;
            targets.push((route.to, route.to_port, route.event_in));
        }
        if targets.is_empty() {
            return Ok(());
        }
        let emission = Emission {
            source: id,
            event_out: port.name(),
            value,
            timestamp,
            targets,
        };
        match self.queue.push(emission, port.index, self.config.break_event_loops)? {
            Enqueued::Queued => {}
            Enqueued::LoopBroken => {
                self.stats.loops_broken += 1;
                self.tracer.event_loop_broken(&EventLoopBroken {
                    source: id,
                    event_out: port.name(),
                    timestamp,
                });
            }
        }
        Ok(())
    }

    /// Applies one event to a listener.
    fn deliver(&mut self, target: NodeId, port: Port, value: &FieldValue, timestamp: f64) -> Result<(), Error> {
        if !self.store.is_alive(target) {
            return Err(Error::NodeExpired(target));
        }
        check_type(&port, value)?;
        match port.kind() {
            InterfaceKind::ExposedField => self.write_exposed(target, port, value.clone(), timestamp),
            InterfaceKind::EventIn => match port.decl.handler {
                Some(handler) => handler(&mut NodeContext::new(self, target), value, timestamp),
                None => Ok(()),
            },
            InterfaceKind::Field | InterfaceKind::EventOut => {
                Err(self.store.node_type(target).unknown(port.name()))
            }
        }
    }

    /// Drains the worklist to a fixpoint. Re-entrant calls return at once;
    /// the outermost call finishes the cascade.
    pub(crate) fn drain(&mut self) {
        if self.queue.draining {
            return;
        }
        self.queue.draining = true;
        while let Some(emission) = self.queue.pop() {
            if self.queue.processed >= self.config.max_cascade_events {
                self.tracer.cascade_truncated(&CascadeTruncated {
                    processed: self.queue.processed,
                    discarded: self.queue.len() + 1,
                });
                self.queue.clear();
                break;
            }
            self.queue.processed += 1;
            for &(target, to_port, event_in) in &emission.targets {
                let result = match self.store.try_node_type(target).map(|t| t.port(to_port)) {
                    None => Err(Error::NodeExpired(target)),
                    Some(None) => Err(Error::NodeExpired(target)),
                    Some(Some(port)) => self.deliver(target, port, &emission.value, emission.timestamp),
                };
                match result {
                    Ok(()) => {
                        self.stats.events_delivered += 1;
                        #[cfg(feature = "trace-rich")]
                        self.tracer.event_delivered(&crate::trace::EventDelivered {
                            source: emission.source,
                            event_out: emission.event_out,
                            target,
                            event_in,
                            timestamp: emission.timestamp,
                        });
                    }
                    Err(error) => self.report_failure(
                        emission.source,
                        emission.event_out,
                        target,
                        event_in,
                        emission.timestamp,
                        &error,
                    ),
                }
            }
        }
        self.queue.end_cascade();
        self.queue.draining = false;
        if core::mem::take(&mut self.needs_redraw) {
            self.browser.scene_modified();
        }
    }

    fn report_failure(
        &mut self,
        source: NodeId,
        event_out: &str,
        target: NodeId,
        event_in: &str,
        timestamp: f64,
        error: &Error,
    ) {
        self.stats.deliveries_dropped += 1;
        self.tracer.delivery_failed(&DeliveryFailure {
            source,
            event_out,
            target,
            event_in,
            timestamp,
            error,
        });
    }

    // -- Ticking --

    /// Advances scene time: updates every time-dependent node registered at
    /// the start of the tick, then drains the worklist.
    pub fn tick(&mut self, now: f64) -> TickSummary {
        self.tick_index += 1;
        self.current_time = now;
        self.stats = TickSummary {
            tick_index: self.tick_index,
            now,
            ..TickSummary::default()
        };
        self.tracer.tick_begin(&TickEvent {
            tick_index: self.tick_index,
            now,
        });
        let snapshot = self.time_dependents.clone();
        for n in snapshot {
            let Some(td) = self.as_time_dependent(n) else {
                continue;
            };
            (td.update)(&mut NodeContext::new(self, n), now);
            self.stats.time_dependents += 1;
        }
        self.drain();
        let summary = self.stats;
        self.tracer.tick_end(&summary);
        summary
    }

    /// Delivers pointer input to every pointing-device sensor among the
    /// children of `group`, then drains. Returns how many sensors saw it.
    pub fn pointer_event(&mut self, group: NodeId, event: &PointerEvent) -> usize {
        let Some(grouping) = self.as_grouping(group) else {
            return 0;
        };
        let sensors: Vec<(NodeId, PointingDeviceSensorNode)> = self
            .store
            .view(group)
            .nodes(grouping.children)
            .filter_map(|c| Some((c.id(), c.node_type().capabilities().pointing_device_sensor?)))
            .collect();
        self.current_time = self.current_time.max(event.timestamp);
        for &(sensor, caps) in &sensors {
            (caps.activate)(&mut NodeContext::new(self, sensor), event);
        }
        self.drain();
        sensors.len()
    }

    // -- Bounds and modification --

    /// Marks the bounding volume of `id` and every node whose volume depends
    /// on it stale.
    pub fn mark_bounds_dirty(&mut self, id: NodeId) {
        if self.store.is_alive(id) {
            self.store.mark_bounds_dirty(id);
            self.needs_redraw = true;
        }
    }

    /// Bounding sphere of `id` in its own frame, recomputed if stale.
    /// `None` for stale handles and nodes without a bounding volume.
    pub fn bounding_volume(&mut self, id: NodeId) -> Option<BoundingSphere> {
        if !self.store.is_alive(id) {
            return None;
        }
        let _ = self.store.invalidate_bounds();
        self.compute_bounds(id)
    }

    fn compute_bounds(&mut self, id: NodeId) -> Option<BoundingSphere> {
        let node_type = self.store.node_type(id).clone();
        let caps = node_type.capabilities();
        let source = caps.bounded_volume?;
        if let Some(cached) = self.store.bounds[id.idx as usize] {
            return Some(cached);
        }
        let sphere = match source {
            BoundsSource::Leaf(f) => f(&self.store.view(id)),
            BoundsSource::Children => {
                let mut union = BoundingSphere::EMPTY;
                let children: Vec<NodeId> = self.store.children(id).collect();
                for child in children {
                    if self.store.is_alive(child)
                        && let Some(b) = self.compute_bounds(child)
                    {
                        union.extend(&b);
                    }
                }
                match caps.grouping.and_then(|g| g.transform) {
                    Some(transform) => union.transform(&transform(&self.store.view(id))),
                    None => union,
                }
            }
        };
        self.store.bounds[id.idx as usize] = Some(sphere);
        #[cfg(feature = "trace-rich")]
        self.tracer.bounds_recomputed(&crate::trace::BoundsRecomputed { node: id, sphere });
        Some(sphere)
    }

    /// Whether `id` or any node reachable through its node-valued fields is
    /// modified.
    #[must_use]
    pub fn modified(&self, id: NodeId) -> bool {
        let mut pending = alloc::vec![id];
        while let Some(n) = pending.pop() {
            if !self.store.is_alive(n) {
                continue;
            }
            if self.store.modified[n.idx as usize] {
                return true;
            }
            pending.extend(self.store.children(n));
        }
        false
    }

    /// Sets the own `modified` flag of `id`.
    pub fn set_modified(&mut self, id: NodeId, modified: bool) {
        if self.store.is_alive(id) {
            self.store.modified[id.idx as usize] = modified;
            self.needs_redraw |= modified;
        }
    }

    /// Path from a scene root down to `id` (both included), following the
    /// first match in root and field order.
    #[must_use]
    pub fn node_path(&self, id: NodeId) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        for &root in &self.roots {
            if self.find_path(root, id, &mut path) {
                return Some(path);
            }
        }
        None
    }

    fn find_path(&self, from: NodeId, target: NodeId, path: &mut Vec<NodeId>) -> bool {
        if !self.store.is_alive(from) {
            return false;
        }
        path.push(from);
        if from == target {
            return true;
        }
        for child in self.store.children(from) {
            if self.find_path(child, target, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    // -- Capabilities --

    /// Whether `id` is live and supports `capability`.
    #[must_use]
    pub fn supports(&self, id: NodeId, capability: Capability) -> bool {
        self.store
            .try_node_type(id)
            .is_some_and(|t| t.capabilities().supports(capability))
    }

    /// Grouping record of `id`.
    #[must_use]
    pub fn as_grouping(&self, id: NodeId) -> Option<GroupingNode> {
        self.store.try_node_type(id)?.capabilities().grouping
    }

    /// Geometry record of `id`.
    #[must_use]
    pub fn as_geometry(&self, id: NodeId) -> Option<GeometryNode> {
        self.store.try_node_type(id)?.capabilities().geometry
    }

    /// Light record of `id`.
    #[must_use]
    pub fn as_light(&self, id: NodeId) -> Option<LightNode> {
        self.store.try_node_type(id)?.capabilities().light
    }

    /// Appearance record of `id`.
    #[must_use]
    pub fn as_appearance(&self, id: NodeId) -> Option<AppearanceNode> {
        self.store.try_node_type(id)?.capabilities().appearance
    }

    /// Texture record of `id`.
    #[must_use]
    pub fn as_texture(&self, id: NodeId) -> Option<TextureNode> {
        self.store.try_node_type(id)?.capabilities().texture
    }

    /// Time-dependent record of `id`.
    #[must_use]
    pub fn as_time_dependent(&self, id: NodeId) -> Option<TimeDependentNode> {
        self.store.try_node_type(id)?.capabilities().time_dependent
    }

    /// Bindable record of `id`.
    #[must_use]
    pub fn as_bindable(&self, id: NodeId) -> Option<BindableNode> {
        self.store.try_node_type(id)?.capabilities().bindable
    }

    /// Pointing-device sensor record of `id`.
    #[must_use]
    pub fn as_pointing_device_sensor(&self, id: NodeId) -> Option<PointingDeviceSensorNode> {
        self.store.try_node_type(id)?.capabilities().pointing_device_sensor
    }

    pub(crate) fn bindable_tops(&self) -> Vec<NodeId> {
        self.bindables.values().filter_map(|s| s.stack().top()).collect()
    }
}

/// Resolves `name` as a field or exposedField (exact name).
fn field_port(node_type: &NodeType, name: &str) -> Result<Port, Error> {
    node_type
        .interfaces()
        .find(name)
        .and_then(|(i, _)| node_type.port(i))
        .filter(|p| matches!(p.kind(), InterfaceKind::Field | InterfaceKind::ExposedField))
        .ok_or_else(|| node_type.unknown(name))
}

fn check_type(port: &Port, value: &FieldValue) -> Result<(), Error> {
    if value.field_type() == port.field_type() {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: port.field_type(),
            found: value.field_type(),
        })
    }
}
