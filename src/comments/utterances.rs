//! utterances comment widget

use super::document::{Document, Element, NodeId};
use crate::config::CommentsConfig;

/// Builds and attaches the utterances embed script
#[derive(Debug, Clone)]
pub struct CommentWidget {
    config: CommentsConfig,
}

impl CommentWidget {
    pub fn new(config: CommentsConfig) -> Self {
        Self { config }
    }

    /// The embed `<script>` element
    pub fn script(&self) -> Element {
        let mut script = Element::new("script")
            .attr("src", Some(self.config.script_src.as_str()))
            .attr("async", None);
        // Without a repo the widget fails on its own side.
        if let Some(repo) = &self.config.repo {
            script = script.attr("repo", Some(repo.as_str()));
        }
        script
            .attr("issue-term", Some(self.config.issue_term.as_str()))
            .attr("theme", Some(self.config.theme.as_str()))
            .attr("crossorigin", Some("anonymous"))
    }

    /// Attach one script to `container_id`
    ///
    /// Returns `None`, and does nothing, when the container is not in the
    /// document. Dropping the guard removes the script again.
    pub fn mount(&self, document: &Document, container_id: &str) -> Option<WidgetGuard> {
        let Some(node) = document.append_child(container_id, self.script()) else {
            tracing::debug!("No #{} container, comments not mounted", container_id);
            return None;
        };
        Some(WidgetGuard {
            document: document.clone(),
            container_id: container_id.to_string(),
            node,
        })
    }
}

/// An attached widget script; detached on drop
#[derive(Debug)]
pub struct WidgetGuard {
    document: Document,
    container_id: String,
    node: NodeId,
}

impl Drop for WidgetGuard {
    fn drop(&mut self) {
        self.document.remove_child(&self.container_id, self.node);
    }
}

/// The comment section of a page: at most one widget at a time
#[derive(Debug)]
pub struct CommentSection {
    widget: CommentWidget,
    mounted: Option<WidgetGuard>,
}

impl CommentSection {
    pub fn new(widget: CommentWidget) -> Self {
        Self {
            widget,
            mounted: None,
        }
    }

    /// (Re)mount into `container_id`, detaching any previous script first
    pub fn mount(&mut self, document: &Document, container_id: &str) -> bool {
        self.mounted = None;
        self.mounted = self.widget.mount(document, container_id);
        self.mounted.is_some()
    }

    pub fn unmount(&mut self) {
        self.mounted = None;
    }
}
