//! Rendered document with mountable containers
//!
//! After the page markup is rendered, every element carrying an `id` becomes
//! a container that scripts can be attached to. Attached children are
//! serialized right after the container's opening tag.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;

use crate::helpers::attributes;

lazy_static! {
    static ref ID_ATTR: Regex =
        Regex::new(r#"<[a-zA-Z][a-zA-Z0-9-]*\b[^>]*?\sid="([^"]+)"[^>]*>"#).unwrap();
}

/// Identity of an attached child node
pub type NodeId = u64;

/// A childless element attached to a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, Option<String>)>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
        }
    }

    /// Set an attribute, or a bare flag when `value` is `None`
    pub fn attr(mut self, name: &str, value: Option<&str>) -> Self {
        self.attrs
            .push((name.to_string(), value.map(str::to_string)));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn to_html(&self) -> String {
        let attrs = attributes(
            self.attrs
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_deref())),
        );
        format!("<{tag}{attrs}></{tag}>", tag = self.tag, attrs = attrs)
    }
}

#[derive(Debug)]
struct Container {
    /// Byte offset just past the opening tag
    insert_at: usize,
    children: Vec<(NodeId, Element)>,
}

#[derive(Debug)]
struct Inner {
    html: String,
    containers: IndexMap<String, Container>,
    next_node: NodeId,
}

/// Shared handle to a rendered document
#[derive(Debug, Clone)]
pub struct Document {
    inner: Rc<RefCell<Inner>>,
}

impl Document {
    /// Wrap rendered markup and register its `id` containers
    ///
    /// When an id repeats, the last element carrying it is the container:
    /// layout markup follows the post body it wraps.
    pub fn new(html: String) -> Self {
        let mut containers = IndexMap::new();
        for caps in ID_ATTR.captures_iter(&html) {
            let (Some(tag), Some(id)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            containers.insert(
                id.as_str().to_string(),
                Container {
                    insert_at: tag.end(),
                    children: Vec::new(),
                },
            );
        }

        Self {
            inner: Rc::new(RefCell::new(Inner {
                html,
                containers,
                next_node: 0,
            })),
        }
    }

    /// Children currently attached to a container
    pub fn children(&self, id: &str) -> Vec<Element> {
        self.inner
            .borrow()
            .containers
            .get(id)
            .map(|c| c.children.iter().map(|(_, e)| e.clone()).collect())
            .unwrap_or_default()
    }

    /// Attach `element` to container `id`. `None` if there is no such container.
    pub fn append_child(&self, id: &str, element: Element) -> Option<NodeId> {
        let mut inner = self.inner.borrow_mut();
        let node = inner.next_node;
        let container = inner.containers.get_mut(id)?;
        container.children.push((node, element));
        inner.next_node += 1;
        Some(node)
    }

    /// Detach exactly the node `node` from container `id`
    pub fn remove_child(&self, id: &str, node: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(container) = inner.containers.get_mut(id) else {
            return false;
        };
        let before = container.children.len();
        container.children.retain(|(n, _)| *n != node);
        container.children.len() != before
    }

    /// Serialize the markup with every attached child in place
    pub fn to_html(&self) -> String {
        let inner = self.inner.borrow();
        let mut inserts: Vec<(usize, String)> = inner
            .containers
            .values()
            .filter(|c| !c.children.is_empty())
            .map(|c| {
                let children: String = c.children.iter().map(|(_, e)| e.to_html()).collect();
                (c.insert_at, children)
            })
            .collect();
        inserts.sort_by_key(|(at, _)| *at);

        let mut html = String::with_capacity(inner.html.len());
        let mut last = 0;
        for (at, children) in inserts {
            html.push_str(&inner.html[last..at]);
            html.push_str(&children);
            last = at;
        }
        html.push_str(&inner.html[last..]);
        html
    }
}
