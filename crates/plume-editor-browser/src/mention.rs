//! DOM host for the mention engine: the suggestion list, key interception
//! and fetch spawning.

use std::rc::{Rc, Weak};

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use plume_editor_core::mention::{
    FetchTicket, KeyResult, ListMetrics, MentionEngine, MentionListView, MentionOptions,
    MentionSource, StaticMentionSource,
};
use plume_editor_core::{ChangeFeed, DocumentPort, FrameId, PlatformError, Subscription};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlImageElement, KeyboardEvent};

use crate::dom;
use crate::frames::AnimationFrames;
use crate::reactor::{Reactor, dispatch_weak};

pub const LIST_CLASS: &str = "ql-mention-list";
pub const HIDDEN_CLASS: &str = "is-hidden";
pub const ACTIVE_CLASS: &str = "is-active";

/// The suggestion list DOM.
struct MentionList {
    element: HtmlElement,
    items: HtmlElement,
    empty: HtmlElement,
    buttons: Vec<HtmlElement>,
    listeners: Vec<EventListener>,
    revision: Option<u64>,
}

impl MentionList {
    fn new(document: &Document, empty_message: &str) -> Result<Self, PlatformError> {
        let element: HtmlElement = dom::create(document, "div", &format!("{LIST_CLASS} {HIDDEN_CLASS}"))?;
        dom::set_attr(&element, "role", "listbox");
        dom::set_attr(&element, "aria-label", "Mention suggestions");

        let items: HtmlElement = dom::create(document, "div", "ql-mention-items")?;
        let empty: HtmlElement = dom::create(document, "div", "ql-mention-empty")?;
        empty.set_text_content(Some(empty_message));

        dom::append(&element, &items)?;
        dom::append(&element, &empty)?;

        Ok(Self {
            element,
            items,
            empty,
            buttons: Vec::new(),
            listeners: Vec::new(),
            revision: None,
        })
    }

    /// Sync the DOM with `view`. Items are rebuilt only when the candidate
    /// revision changed; highlight moves only toggle classes.
    fn render(
        &mut self,
        view: &MentionListView<'_>,
        pick: impl Fn(usize) + Clone + 'static,
    ) -> Result<(), PlatformError> {
        dom::toggle_class(&self.element, HIDDEN_CLASS, !view.open);

        if self.revision != Some(view.revision) {
            self.revision = Some(view.revision);
            self.rebuild(view, pick)?;
        }

        for (index, button) in self.buttons.iter().enumerate() {
            let active = view.highlighted == Some(index);
            dom::toggle_class(button, ACTIVE_CLASS, active);
            dom::set_attr(button, "aria-selected", if active { "true" } else { "false" });
        }
        Ok(())
    }

    fn rebuild(
        &mut self,
        view: &MentionListView<'_>,
        pick: impl Fn(usize) + Clone + 'static,
    ) -> Result<(), PlatformError> {
        self.listeners.clear();
        self.buttons.clear();
        self.items.set_inner_html("");

        let show_empty = view.empty_message.is_some();
        if let Some(message) = view.empty_message {
            self.empty.set_text_content(Some(message));
        }
        dom::set_style(&self.empty, "display", if show_empty { "block" } else { "none" });

        let document = gloo_utils::document();
        for (index, candidate) in view.candidates.iter().enumerate() {
            let button: HtmlElement = dom::create(&document, "button", "ql-mention-item")?;
            dom::set_attr(&button, "type", "button");
            dom::set_attr(&button, "role", "option");
            dom::set_attr(&button, "data-index", &index.to_string());

            if let Some(url) = &candidate.avatar_url {
                let avatar: HtmlImageElement =
                    dom::create(&document, "img", "ql-mention-item-avatar")?;
                avatar.set_src(url);
                avatar.set_alt(&candidate.label);
                dom::append(&button, &avatar)?;
            }

            let label: HtmlElement = dom::create(&document, "span", "ql-mention-item-label")?;
            label.set_text_content(Some(candidate.list_text()));
            dom::append(&button, &label)?;

            // Pointer-down, not click, so the editor never loses focus.
            let pick = pick.clone();
            self.listeners.push(EventListener::new_with_options(
                &button,
                "mousedown",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    event.prevent_default();
                    pick(index);
                },
            ));

            dom::append(&self.items, &button)?;
            self.buttons.push(button);
        }
        Ok(())
    }

    fn place(&self, left: f64, top: f64) {
        dom::set_px(&self.element, "top", top);
        dom::set_px(&self.element, "left", left);
    }

    fn remove(&mut self) {
        self.listeners.clear();
        self.buttons.clear();
        self.element.remove();
    }
}

struct MentionHost<P, S> {
    this: Weak<Reactor<MentionHost<P, S>>>,
    engine: MentionEngine,
    port: Rc<P>,
    source: Rc<S>,
    frames: AnimationFrames,
    root: HtmlElement,
    container: HtmlElement,
    list: MentionList,
}

impl<P, S> MentionHost<P, S>
where
    P: DocumentPort + 'static,
    S: MentionSource + 'static,
{
    fn on_content_change(&mut self, source: plume_editor_core::Source) {
        self.engine
            .on_content_change(source, &*self.port, &mut self.frames);
        self.render();
    }

    fn on_selection_change(
        &mut self,
        selection: Option<plume_editor_core::Selection>,
        source: plume_editor_core::Source,
    ) {
        let ticket = self.engine.on_selection_change(selection, source, &*self.port);
        self.fetch(ticket);
        self.render();
    }

    fn on_frame(&mut self, id: FrameId) {
        let ticket = self.engine.on_frame(id, &*self.port);
        self.fetch(ticket);
        self.render();
    }

    fn handle_key(&mut self, key: &str) -> KeyResult {
        let result = self.engine.handle_key(key, &*self.port);
        if result == KeyResult::Handled {
            self.render();
        }
        result
    }

    fn select(&mut self, index: usize) {
        self.engine.select(index, &*self.port);
        self.render();
    }

    fn outside_pointer(&mut self) {
        if self.engine.on_outside_pointer() {
            self.render();
        }
    }

    fn fetch(&self, ticket: Option<FetchTicket>) {
        let Some(FetchTicket { token, query }) = ticket else {
            return;
        };
        let search = self.source.search(&query);
        let this = self.this.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let results = search.await;
            dispatch_weak(&this, move |host| {
                if host.engine.apply_results(token, results) {
                    host.render();
                }
            });
        });
    }

    fn render(&mut self) {
        let this = self.this.clone();
        let pick = move |index: usize| dispatch_weak(&this, move |host| host.select(index));
        let view = self.engine.view();
        if let Err(e) = self.list.render(&view, pick) {
            tracing::warn!("mention list render failed: {e}");
        }
        self.reposition();
    }

    fn reposition(&self) {
        let metrics = ListMetrics {
            scroll_top: self.root.scroll_top() as f64,
            scroll_left: self.root.scroll_left() as f64,
            container_width: self.container.client_width() as f64,
            list_width: Some(self.list.element.offset_width() as f64),
        };
        if let Some(point) = self.engine.list_position(&*self.port, &metrics) {
            self.list.place(point.x, point.y);
        }
    }

    fn destroy(&mut self) {
        self.engine.destroy(&mut self.frames);
        self.list.remove();
    }
}

/// The mention module bound to an editing surface.
pub struct MentionModule<P, S = StaticMentionSource>
where
    P: DocumentPort + ChangeFeed + 'static,
    S: MentionSource + 'static,
{
    host: Rc<Reactor<MentionHost<P, S>>>,
    listeners: Vec<EventListener>,
    subscriptions: Vec<Subscription>,
}

impl<P> MentionModule<P, StaticMentionSource>
where
    P: DocumentPort + ChangeFeed + 'static,
{
    /// Mount with the built-in demo directory as the source.
    pub fn with_default_source(
        port: Rc<P>,
        root: HtmlElement,
        container: HtmlElement,
        options: MentionOptions,
    ) -> Result<Self, PlatformError> {
        Self::new(port, root, container, StaticMentionSource::default(), options)
    }
}

impl<P, S> MentionModule<P, S>
where
    P: DocumentPort + ChangeFeed + 'static,
    S: MentionSource + 'static,
{
    /// Mount the module. `root` is the editing surface, `container` the
    /// positioned element the list is appended to.
    pub fn new(
        port: Rc<P>,
        root: HtmlElement,
        container: HtmlElement,
        source: S,
        options: MentionOptions,
    ) -> Result<Self, PlatformError> {
        let document = gloo_utils::document();
        let list = MentionList::new(&document, &options.empty_message)?;
        dom::ensure_positioned(&container);
        dom::append(&container, &list.element)?;

        let host = Reactor::new_cyclic(|this: &Weak<Reactor<MentionHost<P, S>>>| {
            let frames_target = this.clone();
            MentionHost {
                this: this.clone(),
                engine: MentionEngine::new(options),
                port: port.clone(),
                source: Rc::new(source),
                frames: AnimationFrames::new(move |id| {
                    dispatch_weak(&frames_target, move |host| host.on_frame(id))
                }),
                root: root.clone(),
                container: container.clone(),
                list,
            }
        });

        let weak = Rc::downgrade(&host);
        let subscriptions = vec![
            port.on_content_change(Box::new({
                let weak = weak.clone();
                move |source| dispatch_weak(&weak, move |host| host.on_content_change(source))
            })),
            port.on_selection_change(Box::new({
                let weak = weak.clone();
                move |selection, source| {
                    dispatch_weak(&weak, move |host| host.on_selection_change(selection, source))
                }
            })),
        ];

        let key_options = EventListenerOptions {
            phase: EventListenerPhase::Capture,
            passive: false,
        };
        let keydown = EventListener::new_with_options(&root, "keydown", key_options, {
            let weak = weak.clone();
            move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let key = event.key();
                let result = weak
                    .upgrade()
                    .and_then(|host| host.try_run(|host| host.handle_key(&key)));
                if result == Some(KeyResult::Handled) {
                    event.prevent_default();
                    event.stop_immediate_propagation();
                }
            }
        });

        let scroll = EventListener::new(&root, "scroll", {
            let weak = weak.clone();
            move |_| dispatch_weak(&weak, |host| host.reposition())
        });

        let click = EventListener::new(&document, "click", {
            let weak = weak.clone();
            let root = root.clone();
            move |event| {
                let target = dom::event_node(event);
                let Some(host) = weak.upgrade() else {
                    return;
                };
                let inside = host
                    .try_run(|host| dom::contains(&host.list.element, target.as_ref()))
                    .unwrap_or(true);
                if !inside && !dom::contains(&root, target.as_ref()) {
                    host.dispatch(|host| host.outside_pointer());
                }
            }
        });

        tracing::debug!("mention module mounted");
        Ok(Self {
            host,
            listeners: vec![keydown, scroll, click],
            subscriptions,
        })
    }

    pub fn is_open(&self) -> bool {
        self.host
            .try_run(|host| host.engine.is_open())
            .unwrap_or(false)
    }

    /// Detach every listener, cancel pending work and remove the list.
    /// Idempotent.
    pub fn destroy(&mut self) {
        if self.listeners.is_empty() && self.subscriptions.is_empty() {
            return;
        }
        self.listeners.clear();
        self.subscriptions.clear();
        self.host.dispatch(|host| host.destroy());
        tracing::debug!("mention module destroyed");
    }
}

impl<P, S> Drop for MentionModule<P, S>
where
    P: DocumentPort + ChangeFeed + 'static,
    S: MentionSource + 'static,
{
    fn drop(&mut self) {
        self.destroy();
    }
}
