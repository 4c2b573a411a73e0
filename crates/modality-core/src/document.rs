#![forbid(unsafe_code)]

//! Host-driven element tree with events, focus and timers.
//!
//! [`Document`] is a cheap, cloneable handle (`Rc<RefCell<..>>`) over an
//! arena of element nodes. It models the slice of a browser page the modal
//! widget needs: ids, classes, attributes, inline style, a focused element,
//! event listeners with bubbling, link default actions, and a virtual-time
//! timer queue.
//!
//! # Re-entrancy
//!
//! Listener and timer callbacks routinely call back into the document (a
//! click handler adds a class, a timer moves focus). The document therefore
//! never holds its internal borrow while running user code: handlers are
//! cloned out of the listener table before they are invoked, and due timers
//! are popped one at a time.
//!
//! # Invariants
//!
//! - The tree is acyclic: `append_child` / `replace_child` refuse to insert
//!   a node into its own subtree.
//! - A node has at most one parent, and appears exactly once in that
//!   parent's child list.
//! - Detached nodes stay valid; they are simply not reachable from `root()`
//!   and never match `element_by_id` / `query_selector_all`.
//! - Listeners removed during a dispatch are not invoked later in that
//!   dispatch.
//!
//! # Panics
//!
//! [`NodeId`]s are only minted by the document that owns them. Passing an id
//! from a different document may panic.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::fmt::Write as _;
use std::rc::Rc;
use std::time::Duration;

use ahash::AHashMap;

use crate::event::{DispatchOutcome, Event, EventContext, EventKind, ListenerId};
use crate::selector::{SelectorError, SelectorList, SelectorTarget};
use crate::timer::{TimerId, TimerQueue};

/// Handle to an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Arena index of this node.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shared event handler.
pub type Handler = Rc<dyn Fn(&mut EventContext<'_>)>;

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    /// Everything except `class` and `style`, in insertion order.
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    style: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<ListenerId>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    fn raw_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn style_text(&self) -> String {
        let mut out = String::new();
        for (i, (prop, value)) in self.style.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{prop}: {value};");
        }
        out
    }
}

impl SelectorTarget for NodeData {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn attribute_value(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "class" if !self.classes.is_empty() => Some(Cow::Owned(self.classes.join(" "))),
            "class" => None,
            "style" if !self.style.is_empty() => Some(Cow::Owned(self.style_text())),
            "style" => None,
            _ => self.raw_attribute(name).map(Cow::Borrowed),
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

struct ListenerEntry {
    node: NodeId,
    kind: EventKind,
    handler: Handler,
}

struct DocumentInner {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    listeners: AHashMap<ListenerId, ListenerEntry>,
    next_listener: u64,
    active: Option<NodeId>,
    location_hash: Option<String>,
    navigations: Vec<String>,
    timers: TimerQueue,
}

impl DocumentInner {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(tag));
        id
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.node(n).parent;
        }
        false
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node_mut(child).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != child);
        }
    }

    /// Pre-order traversal of `start` and its descendants.
    fn subtree(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.node(n).children.iter().rev().copied());
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let data = self.node(node);
        let _ = write!(out, "<{}", data.tag);
        if let Some(id) = data.raw_attribute("id") {
            let _ = write!(out, " id=\"{}\"", escape_attr(id));
        }
        if !data.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_attr(&data.classes.join(" ")));
        }
        for (name, value) in data.attributes.iter().filter(|(k, _)| k != "id") {
            let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
        }
        if !data.style.is_empty() {
            let _ = write!(out, " style=\"{}\"", escape_attr(&data.style_text()));
        }
        out.push('>');
        for child in &data.children {
            self.write_html(*child, out);
        }
        let _ = write!(out, "</{}>", data.tag);
    }
}

fn escape_attr(value: &str) -> Cow<'_, str> {
    if value.contains(['&', '"']) {
        Cow::Owned(value.replace('&', "&amp;").replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}

/// `data-click-off` → `clickOff`, following the DOM dataset rule: a dash
/// followed by a lower-case ASCII letter becomes that letter upper-cased.
fn dataset_key(rest: &str) -> String {
    let mut out = String::with_capacity(rest.len());
    let mut pending_dash = false;
    for c in rest.chars() {
        if pending_dash {
            pending_dash = false;
            if c.is_ascii_lowercase() {
                out.push(c.to_ascii_uppercase());
                continue;
            }
            out.push('-');
        }
        if c == '-' {
            pending_dash = true;
        } else {
            out.push(c);
        }
    }
    if pending_dash {
        out.push('-');
    }
    out
}

/// A page: element tree, listeners, focus, navigation log and timers.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("listeners", &inner.listeners.len())
            .field("active", &inner.active)
            .field("timers", &inner.timers)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut inner = DocumentInner {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            listeners: AHashMap::new(),
            next_listener: 1,
            active: None,
            location_hash: None,
            navigations: Vec::new(),
            timers: TimerQueue::new(),
        };
        let root = inner.alloc("html");
        let body = inner.alloc("body");
        inner.node_mut(body).parent = Some(root);
        inner.node_mut(root).children.push(body);
        inner.root = root;
        inner.body = body;
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// True when both handles refer to the same document.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Tree ---

    /// The `<html>` element.
    pub fn root(&self) -> NodeId {
        self.inner.borrow().root
    }

    /// The `<body>` element.
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().alloc(tag)
    }

    /// Create a detached element and configure it fluently.
    pub fn build(&self, tag: &str) -> ElementBuilder<'_> {
        ElementBuilder {
            doc: self,
            node: self.create_element(tag),
        }
    }

    pub fn tag_name(&self, node: NodeId) -> String {
        self.inner.borrow().node(node).tag.clone()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(node).parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.borrow().node(node).children.clone()
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// Returns `false` (and leaves the tree untouched) if `child` is `parent`
    /// or one of its ancestors.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.is_inclusive_ancestor(child, parent) {
            return false;
        }
        inner.detach(child);
        inner.node_mut(child).parent = Some(parent);
        inner.node_mut(parent).children.push(child);
        true
    }

    /// Put `new` where `old` sits among `parent`'s children; `old` becomes
    /// detached.
    ///
    /// Returns `false` if `old` is not a child of `parent`, if `new == old`,
    /// or if `new` is an ancestor of `parent`.
    pub fn replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if new == old
            || inner.node(old).parent != Some(parent)
            || inner.is_inclusive_ancestor(new, parent)
        {
            return false;
        }
        inner.detach(new);
        let Some(idx) = inner.node(parent).children.iter().position(|c| *c == old) else {
            return false;
        };
        inner.node_mut(parent).children[idx] = new;
        inner.node_mut(new).parent = Some(parent);
        inner.node_mut(old).parent = None;
        true
    }

    /// Replace `old` by `new` in whatever parent `old` has.
    pub fn replace_with(&self, old: NodeId, new: NodeId) -> bool {
        match self.parent(old) {
            Some(parent) => self.replace_child(parent, new, old),
            None => false,
        }
    }

    /// Detach `child` from `parent`. Returns `false` if it is not a child.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.node(child).parent != Some(parent) {
            return false;
        }
        inner.detach(child);
        true
    }

    /// True when `node` is `ancestor` or lies inside its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inner.borrow().is_inclusive_ancestor(ancestor, node)
    }

    /// True when `node` is reachable from the root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let inner = self.inner.borrow();
        inner.is_inclusive_ancestor(inner.root, node)
    }

    // --- Attributes ---

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.inner
            .borrow()
            .node(node)
            .attribute_value(&name)
            .map(Cow::into_owned)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Set an attribute. `class` and `style` replace the class list and
    /// inline style respectively.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let mut inner = self.inner.borrow_mut();
        let data = inner.node_mut(node);
        if name == "class" {
            data.classes.clear();
            for class in value.split_whitespace() {
                if !data.classes.iter().any(|c| c == class) {
                    data.classes.push(class.to_owned());
                }
            }
        } else if name == "style" {
            data.style = value
                .split(';')
                .filter_map(|decl| {
                    let (prop, val) = decl.split_once(':')?;
                    let prop = prop.trim();
                    (!prop.is_empty()).then(|| (prop.to_ascii_lowercase(), val.trim().to_owned()))
                })
                .collect();
        } else {
            match data.attributes.iter_mut().find(|(k, _)| *k == name) {
                Some((_, v)) => *v = value.to_owned(),
                None => data.attributes.push((name, value.to_owned())),
            }
        }
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        let name = name.to_ascii_lowercase();
        let mut inner = self.inner.borrow_mut();
        let data = inner.node_mut(node);
        match name.as_str() {
            "class" => data.classes.clear(),
            "style" => data.style.clear(),
            _ => data.attributes.retain(|(k, _)| *k != name),
        }
    }

    /// The `id` attribute.
    pub fn id(&self, node: NodeId) -> Option<String> {
        self.attribute(node, "id")
    }

    /// `data-*` attributes as `(camelCaseKey, value)` pairs, in attribute order.
    pub fn dataset(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .node(node)
            .attributes
            .iter()
            .filter_map(|(k, v)| k.strip_prefix("data-").map(|rest| (dataset_key(rest), v.clone())))
            .collect()
    }

    // --- Classes ---

    /// Add a class; no-op if already present.
    pub fn add_class(&self, node: NodeId, class: &str) {
        if class.is_empty() {
            return;
        }
        let mut inner = self.inner.borrow_mut();
        let data = inner.node_mut(node);
        if !data.has_class(class) {
            data.classes.push(class.to_owned());
        }
    }

    pub fn remove_class(&self, node: NodeId, class: &str) {
        self.inner
            .borrow_mut()
            .node_mut(node)
            .classes
            .retain(|c| c != class);
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.inner.borrow().node(node).has_class(class)
    }

    /// Space-joined class list (empty string when there are none).
    pub fn class_name(&self, node: NodeId) -> String {
        self.inner.borrow().node(node).classes.join(" ")
    }

    // --- Inline style ---

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.inner
            .borrow()
            .node(node)
            .style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.clone())
    }

    pub fn set_style(&self, node: NodeId, property: &str, value: &str) {
        let mut inner = self.inner.borrow_mut();
        let style = &mut inner.node_mut(node).style;
        match style.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value.to_owned(),
            None => style.push((property.to_owned(), value.to_owned())),
        }
    }

    pub fn remove_style(&self, node: NodeId, property: &str) {
        self.inner
            .borrow_mut()
            .node_mut(node)
            .style
            .retain(|(p, _)| p != property);
    }

    // --- Lookup ---

    /// First connected element (in document order) with the given `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner
            .subtree(inner.root)
            .into_iter()
            .find(|n| inner.node(*n).raw_attribute("id") == Some(id))
    }

    /// Connected elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.select(&list))
    }

    /// Connected elements matching a parsed selector, in document order.
    pub fn select(&self, selector: &SelectorList) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        inner
            .subtree(inner.root)
            .into_iter()
            .filter(|n| selector.matches(inner.node(*n)))
            .collect()
    }

    /// True when `node` matches `selector`.
    pub fn matches(&self, node: NodeId, selector: &SelectorList) -> bool {
        selector.matches(self.inner.borrow().node(node))
    }

    // --- Focus ---

    /// Focus a connected element. Returns `false` for detached nodes.
    pub fn focus(&self, node: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.is_inclusive_ancestor(inner.root, node) {
            return false;
        }
        inner.active = Some(node);
        true
    }

    pub fn blur(&self) {
        self.inner.borrow_mut().active = None;
    }

    /// The focused element, or `<body>` when nothing (connected) has focus.
    pub fn active_element(&self) -> NodeId {
        let inner = self.inner.borrow();
        match inner.active {
            Some(n) if inner.is_inclusive_ancestor(inner.root, n) => n,
            _ => inner.body,
        }
    }

    // --- Events ---

    /// Register `handler` for `kind` events reaching `node`.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        handler: impl Fn(&mut EventContext<'_>) + 'static,
    ) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.insert(
            id,
            ListenerEntry {
                node,
                kind,
                handler: Rc::new(handler),
            },
        );
        inner.node_mut(node).listeners.push(id);
        id
    }

    /// Detach a listener. Returns `false` if it was already removed.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.listeners.remove(&id) {
            Some(entry) => {
                inner.node_mut(entry.node).listeners.retain(|l| *l != id);
                true
            }
            None => false,
        }
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.inner.borrow().listeners.contains_key(&id)
    }

    /// Number of `kind` listeners attached directly to `node`.
    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        let inner = self.inner.borrow();
        inner
            .node(node)
            .listeners
            .iter()
            .filter(|id| inner.listeners.get(id).is_some_and(|e| e.kind == kind))
            .count()
    }

    /// Total number of live listeners in the document.
    pub fn total_listeners(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Dispatch `event`, bubbling from its target to the root.
    ///
    /// After the listeners ran, an unprevented click on or inside an
    /// `<a href>` performs the default action: the href is appended to
    /// [`navigations`](Self::navigations) and fragment links update
    /// [`location_hash`](Self::location_hash).
    pub fn dispatch(&self, event: Event) -> DispatchOutcome {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!(
            "dispatch",
            kind = ?event.kind,
            target = event.target.index()
        )
        .entered();

        let path: Vec<NodeId> = {
            let inner = self.inner.borrow();
            let mut path = vec![event.target];
            let mut cur = inner.node(event.target).parent;
            while let Some(n) = cur {
                path.push(n);
                cur = inner.node(n).parent;
            }
            path
        };

        let mut ctx = EventContext::new(&event);
        let mut invoked = 0usize;
        for node in &path {
            let handlers: Vec<(ListenerId, Handler)> = {
                let inner = self.inner.borrow();
                inner
                    .node(*node)
                    .listeners
                    .iter()
                    .filter_map(|id| {
                        inner
                            .listeners
                            .get(id)
                            .filter(|e| e.kind == event.kind)
                            .map(|e| (*id, Rc::clone(&e.handler)))
                    })
                    .collect()
            };
            ctx.set_current_target(*node);
            for (id, handler) in handlers {
                if !self.has_listener(id) {
                    continue;
                }
                handler(&mut ctx);
                invoked += 1;
                if ctx.immediate_stopped() {
                    break;
                }
            }
            if ctx.is_propagation_stopped() {
                break;
            }
        }

        if event.kind == EventKind::Click && !ctx.is_default_prevented() {
            let mut inner = self.inner.borrow_mut();
            let href = path.iter().find_map(|n| {
                let data = inner.node(*n);
                (data.tag == "a")
                    .then(|| data.raw_attribute("href").map(str::to_owned))
                    .flatten()
            });
            if let Some(href) = href {
                if href.starts_with('#') {
                    inner.location_hash = Some(href.clone());
                }
                inner.navigations.push(href);
            }
        }

        DispatchOutcome {
            default_prevented: ctx.is_default_prevented(),
            propagation_stopped: ctx.is_propagation_stopped(),
            listeners_invoked: invoked,
        }
    }

    /// Fragment of the last followed `#` link.
    pub fn location_hash(&self) -> Option<String> {
        self.inner.borrow().location_hash.clone()
    }

    /// Every href followed by a link default action, oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.inner.borrow().navigations.clone()
    }

    // --- Timers ---

    /// Run `callback` once `delay` of virtual time has passed.
    pub fn set_timeout(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        self.inner
            .borrow_mut()
            .timers
            .schedule(delay, Box::new(callback))
    }

    /// Cancel a pending timeout. Returns `false` if it already ran.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.inner.borrow_mut().timers.cancel(id)
    }

    pub fn is_timer_pending(&self, id: TimerId) -> bool {
        self.inner.borrow().timers.is_pending(id)
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().timers.now()
    }

    /// Move virtual time forward, running every timer that falls due
    /// (including ones scheduled by earlier callbacks). Returns how many ran.
    pub fn advance(&self, by: Duration) -> usize {
        let until = self.now().saturating_add(by);
        let mut ran = 0usize;
        loop {
            let due = self.inner.borrow_mut().timers.pop_due(until);
            match due {
                Some(callback) => {
                    callback();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    // --- Serialization ---

    /// Markup of `node` and its subtree (`id`, then `class`, then other
    /// attributes in insertion order, then `style`).
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.inner.borrow().write_html(node, &mut out);
        out
    }
}

/// Fluent element construction, see [`Document::build`].
#[derive(Debug)]
pub struct ElementBuilder<'d> {
    doc: &'d Document,
    node: NodeId,
}

impl ElementBuilder<'_> {
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.doc.set_attribute(self.node, "id", id);
        self
    }

    /// Add one or more whitespace-separated classes.
    #[must_use]
    pub fn class(self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            self.doc.add_class(self.node, class);
        }
        self
    }

    #[must_use]
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.doc.set_attribute(self.node, name, value);
        self
    }

    #[must_use]
    pub fn style(self, property: &str, value: &str) -> Self {
        self.doc.set_style(self.node, property, value);
        self
    }

    /// Append an existing node as the last child.
    #[must_use]
    pub fn child(self, child: NodeId) -> Self {
        self.doc.append_child(self.node, child);
        self
    }

    /// Append to `parent` and return the new node.
    pub fn append_to(self, parent: NodeId) -> NodeId {
        self.doc.append_child(parent, self.node);
        self.node
    }

    /// Return the (still detached) node.
    pub fn finish(self) -> NodeId {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Key;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn page() -> (Document, NodeId) {
        let doc = Document::new();
        let body = doc.body();
        (doc, body)
    }

    #[test]
    fn new_document_has_html_and_body() {
        let (doc, body) = page();
        assert_eq!(doc.tag_name(doc.root()), "html");
        assert_eq!(doc.tag_name(body), "body");
        assert_eq!(doc.parent(body), Some(doc.root()));
        assert_eq!(doc.active_element(), body);
    }

    #[test]
    fn append_moves_between_parents() {
        let (doc, body) = page();
        let a = doc.build("div").append_to(body);
        let b = doc.build("div").append_to(body);
        let child = doc.build("span").append_to(a);

        assert!(doc.append_child(b, child));
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), vec![child]);
        assert_eq!(doc.parent(child), Some(b));
    }

    #[test]
    fn append_refuses_cycles() {
        let (doc, body) = page();
        let outer = doc.build("div").append_to(body);
        let inner = doc.build("div").append_to(outer);
        assert!(!doc.append_child(inner, outer));
        assert!(!doc.append_child(outer, outer));
        assert_eq!(doc.parent(outer), Some(body));
    }

    #[test]
    fn replace_child_keeps_position() {
        let (doc, body) = page();
        let first = doc.build("p").append_to(body);
        let target = doc.build("div").id("m1").append_to(body);
        let last = doc.build("p").append_to(body);
        let wrapper = doc.create_element("div");

        assert!(doc.replace_child(body, wrapper, target));
        assert_eq!(doc.children(body), vec![first, wrapper, last]);
        assert_eq!(doc.parent(target), None);
        assert!(!doc.is_connected(target));
        assert_eq!(doc.element_by_id("m1"), None);

        assert!(doc.append_child(wrapper, target));
        assert_eq!(doc.element_by_id("m1"), Some(target));
    }

    #[test]
    fn replace_child_rejects_non_child() {
        let (doc, body) = page();
        let stray = doc.create_element("div");
        let other = doc.create_element("div");
        assert!(!doc.replace_child(body, other, stray));
        assert!(!doc.replace_with(stray, other));
    }

    #[test]
    fn classes_and_class_attribute_agree() {
        let (doc, body) = page();
        let el = doc.build("div").class("a b").append_to(body);
        doc.add_class(el, "c");
        doc.add_class(el, "a");
        doc.add_class(el, "");
        assert_eq!(doc.class_name(el), "a b c");
        assert_eq!(doc.attribute(el, "class").as_deref(), Some("a b c"));

        doc.remove_class(el, "b");
        assert!(!doc.has_class(el, "b"));

        doc.set_attribute(el, "class", "x  y x");
        assert_eq!(doc.class_name(el), "x y");
    }

    #[test]
    fn style_attribute_round_trip() {
        let (doc, body) = page();
        let el = doc.build("div").attr("style", "display: none; color:red").append_to(body);
        assert_eq!(doc.style(el, "display").as_deref(), Some("none"));
        assert_eq!(doc.style(el, "color").as_deref(), Some("red"));

        doc.remove_style(el, "display");
        assert_eq!(doc.attribute(el, "style").as_deref(), Some("color: red;"));
    }

    #[test]
    fn dataset_camel_cases_keys() {
        let (doc, body) = page();
        let el = doc
            .build("div")
            .attr("data-click-off-to-close", "no")
            .attr("data-effect", "fade")
            .attr("DATA-Open-On-Load", "1")
            .attr("title", "x")
            .append_to(body);
        assert_eq!(
            doc.dataset(el),
            vec![
                ("clickOffToClose".to_owned(), "no".to_owned()),
                ("effect".to_owned(), "fade".to_owned()),
                ("openOnLoad".to_owned(), "1".to_owned()),
            ]
        );
    }

    #[test]
    fn dataset_key_edge_cases() {
        assert_eq!(dataset_key("a-1"), "a-1");
        assert_eq!(dataset_key("trailing-"), "trailing-");
        assert_eq!(dataset_key("x--y"), "x-Y");
    }

    #[test]
    fn query_selector_all_in_document_order() {
        let (doc, body) = page();
        let modal = doc.build("div").id("m1").append_to(body);
        let inside = doc.build("a").attr("href", "#m1").append_to(modal);
        let before = doc.create_element("button");
        doc.set_attribute(before, "data-modality", "#m1");
        doc.append_child(body, before);
        let detached = doc.build("a").attr("href", "#m1").finish();

        let found = doc
            .query_selector_all(r##"a[href="#m1"], [data-modality="#m1"]"##)
            .unwrap();
        assert_eq!(found, vec![inside, before]);
        assert!(!found.contains(&detached));
    }

    #[test]
    fn query_selector_all_reports_bad_selector() {
        let (doc, _) = page();
        assert!(doc.query_selector_all("div >").is_err());
    }

    #[test]
    fn focus_requires_connection() {
        let (doc, body) = page();
        let button = doc.build("button").append_to(body);
        let detached = doc.create_element("button");

        assert!(doc.focus(button));
        assert_eq!(doc.active_element(), button);
        assert!(!doc.focus(detached));
        assert_eq!(doc.active_element(), button);

        doc.remove_child(body, button);
        assert_eq!(doc.active_element(), body);
    }

    #[test]
    fn dispatch_bubbles_to_root() {
        let (doc, body) = page();
        let outer = doc.build("div").append_to(body);
        let inner = doc.build("span").append_to(outer);
        let order = Rc::new(RefCell::new(Vec::new()));

        for (node, name) in [(inner, "inner"), (outer, "outer"), (body, "body")] {
            let order = Rc::clone(&order);
            doc.add_event_listener(node, EventKind::Click, move |ctx| {
                order.borrow_mut().push((name, ctx.target(), ctx.current_target()));
            });
        }

        let outcome = doc.dispatch(Event::click(inner));
        assert_eq!(outcome.listeners_invoked, 3);
        assert_eq!(
            *order.borrow(),
            vec![("inner", inner, inner), ("outer", inner, outer), ("body", inner, body)]
        );
    }

    #[test]
    fn dispatch_filters_by_kind() {
        let (doc, body) = page();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        doc.add_event_listener(body, EventKind::KeyUp, move |_| h.set(h.get() + 1));

        doc.dispatch(Event::click(body));
        assert_eq!(hits.get(), 0);
        doc.dispatch(Event::key_up(body, Key::Escape));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn stop_propagation_halts_after_current_node() {
        let (doc, body) = page();
        let el = doc.build("div").append_to(body);
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        doc.add_event_listener(el, EventKind::Click, move |ctx| {
            h.set(h.get() + 1);
            ctx.stop_propagation();
        });
        let h = Rc::clone(&hits);
        doc.add_event_listener(el, EventKind::Click, move |_| h.set(h.get() + 1));
        let h = Rc::clone(&hits);
        doc.add_event_listener(body, EventKind::Click, move |_| h.set(h.get() + 100));

        let outcome = doc.dispatch(Event::click(el));
        assert_eq!(hits.get(), 2);
        assert!(outcome.propagation_stopped);
    }

    #[test]
    fn stop_immediate_skips_siblings() {
        let (doc, body) = page();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        doc.add_event_listener(body, EventKind::Click, move |ctx| {
            h.set(h.get() + 1);
            ctx.stop_immediate_propagation();
        });
        let h = Rc::clone(&hits);
        doc.add_event_listener(body, EventKind::Click, move |_| h.set(h.get() + 1));

        doc.dispatch(Event::click(body));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn removal_is_exact_and_idempotent() {
        let (doc, body) = page();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let first = doc.add_event_listener(body, EventKind::Click, move |_| h.set(h.get() + 1));
        let h = Rc::clone(&hits);
        let _second = doc.add_event_listener(body, EventKind::Click, move |_| h.set(h.get() + 10));

        assert!(doc.remove_event_listener(first));
        assert!(!doc.remove_event_listener(first));
        assert_eq!(doc.listener_count(body, EventKind::Click), 1);

        doc.dispatch(Event::click(body));
        assert_eq!(hits.get(), 10);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let (doc, body) = page();
        let el = doc.build("div").append_to(body);
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        let victim = doc.add_event_listener(body, EventKind::Click, move |_| h.set(h.get() + 1));
        let d = doc.clone();
        doc.add_event_listener(el, EventKind::Click, move |_| {
            d.remove_event_listener(victim);
        });

        doc.dispatch(Event::click(el));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn handlers_may_mutate_the_document() {
        let (doc, body) = page();
        let el = doc.build("div").append_to(body);
        let d = doc.clone();
        doc.add_event_listener(el, EventKind::Click, move |ctx| {
            d.add_class(ctx.current_target(), "clicked");
            d.add_event_listener(ctx.current_target(), EventKind::KeyUp, |_| {});
        });

        doc.dispatch(Event::click(el));
        assert!(doc.has_class(el, "clicked"));
        assert_eq!(doc.listener_count(el, EventKind::KeyUp), 1);
    }

    #[test]
    fn link_default_action_records_navigation() {
        let (doc, body) = page();
        let link = doc.build("a").attr("href", "#m1").append_to(body);
        let icon = doc.build("span").append_to(link);

        doc.dispatch(Event::click(icon));
        assert_eq!(doc.location_hash().as_deref(), Some("#m1"));
        assert_eq!(doc.navigations(), vec!["#m1".to_owned()]);
    }

    #[test]
    fn prevent_default_suppresses_navigation() {
        let (doc, body) = page();
        let link = doc.build("a").attr("href", "#m1").append_to(body);
        doc.add_event_listener(link, EventKind::Click, |ctx| ctx.prevent_default());

        let outcome = doc.dispatch(Event::click(link));
        assert!(outcome.default_prevented);
        assert!(doc.navigations().is_empty());
        assert_eq!(doc.location_hash(), None);
    }

    #[test]
    fn timers_run_on_advance_and_may_touch_document() {
        let (doc, body) = page();
        let el = doc.build("div").append_to(body);
        let d = doc.clone();
        doc.set_timeout(Duration::from_millis(50), move || {
            d.focus(el);
        });
        let cancelled = doc.set_timeout(Duration::from_millis(10), move || {
            panic!("cancelled timer ran");
        });
        assert!(doc.clear_timeout(cancelled));

        assert_eq!(doc.advance(Duration::from_millis(49)), 0);
        assert_eq!(doc.active_element(), body);
        assert_eq!(doc.advance(Duration::from_millis(1)), 1);
        assert_eq!(doc.active_element(), el);
        assert_eq!(doc.now(), Duration::from_millis(50));
    }

    #[test]
    fn timers_scheduled_by_timers_run_in_same_advance() {
        let (doc, _) = page();
        let hits = Rc::new(Cell::new(0));
        let d = doc.clone();
        let h = Rc::clone(&hits);
        doc.set_timeout(Duration::from_millis(10), move || {
            let h2 = Rc::clone(&h);
            d.set_timeout(Duration::from_millis(10), move || h2.set(h2.get() + 1));
        });

        assert_eq!(doc.advance(Duration::from_millis(25)), 2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn outer_html_serializes_subtree() {
        let (doc, body) = page();
        let wrapper = doc
            .build("div")
            .class("modality-modal fade")
            .attr("aria-hidden", "true")
            .append_to(body);
        let inner = doc.build("div").class("mm-wrap").append_to(wrapper);
        doc.build("div")
            .id("m1")
            .attr("title", "a \"quote\"")
            .style("display", "block")
            .append_to(inner);

        assert_eq!(
            doc.outer_html(wrapper),
            "<div class=\"modality-modal fade\" aria-hidden=\"true\"><div class=\"mm-wrap\">\
             <div id=\"m1\" title=\"a &quot;quote&quot;\" style=\"display: block;\"></div></div></div>"
        );
    }
}
