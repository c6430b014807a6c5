use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::history::History;
use crate::interchange::{export_graph, import_graph};
use crate::layout::{
    LayoutOutcome, apply_auto_layout, child_position, duplicate_position, parent_position,
    resolve_collisions, sibling_position,
};
use crate::model::{Document, GraphEdge, GraphNode, LayoutMode, Position};
use crate::persist::{PersistedState, SaveDebouncer, StateStore};
use crate::theme::{NodeColor, ThemeMode};
use crate::workspace::Workspace;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const NEW_NODE_LABEL: &str = "New Node";

/// Structural edits a UI collaborator can request by id.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddChild(String),
    AddParent(String),
    AddSibling(String),
    Duplicate(String),
    Delete(String),
    TogglePortal(String),
    AddRootNode(Position),
    Connect { source: String, target: String },
    AutoLayout,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    NodeCreated(String),
    /// `None` when the pair was already connected.
    EdgeCreated(Option<String>),
    NodeDeleted,
    PortalToggled {
        is_portal: bool,
        document_id: Option<String>,
    },
    LayoutApplied(LayoutOutcome),
    /// Whether undo/redo had anything to apply.
    HistoryStep(bool),
}

/// The single owner of editor state. Every mutation goes through one of its
/// methods: validate, snapshot, mutate, optionally resolve collisions, then
/// re-arm the autosave with the fresh state.
#[derive(Debug, Clone)]
pub struct Editor {
    workspace: Workspace,
    history: History,
    config: EditorConfig,
    layout_mode: LayoutMode,
    sidebar_open: bool,
    theme: ThemeMode,
    authenticated: bool,
    autosave: SaveDebouncer,
}

impl Editor {
    /// A fresh editor holding one empty top-level document.
    pub fn new(config: EditorConfig) -> Self {
        Self::from_persisted(PersistedState::default(), config)
    }

    pub fn from_persisted(state: PersistedState, config: EditorConfig) -> Self {
        let mut workspace =
            Workspace::from_parts(state.documents, state.active_document_id, state.breadcrumb);
        if workspace.documents().is_empty() {
            if let Err(err) = workspace.create_document(None, None, None) {
                warn!(%err, "could not create initial document");
            }
        }
        Self {
            workspace,
            history: History::new(config.history_limit),
            autosave: SaveDebouncer::new(Duration::from_millis(config.autosave_delay_ms)),
            config,
            layout_mode: state.layout_mode,
            sidebar_open: state.sidebar_open,
            theme: state.theme,
            authenticated: state.authenticated,
        }
    }

    pub fn load(store: &dyn StateStore, config: EditorConfig) -> anyhow::Result<Self> {
        let state = store.load()?.unwrap_or_default();
        let editor = Self::from_persisted(state, config);
        info!(
            documents = editor.workspace.documents().len(),
            "editor state loaded"
        );
        Ok(editor)
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            documents: self.workspace.documents().to_vec(),
            active_document_id: self.workspace.active_id().map(str::to_string),
            breadcrumb: self.workspace.breadcrumb().to_vec(),
            layout_mode: self.layout_mode,
            sidebar_open: self.sidebar_open,
            theme: self.theme,
            authenticated: self.authenticated,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn active_document(&self) -> EditResult<&Document> {
        self.workspace.active()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn dispatch(&mut self, command: Command) -> EditResult<CommandOutcome> {
        debug!(?command, "dispatch");
        match command {
            Command::AddChild(id) => self.add_child(&id).map(CommandOutcome::NodeCreated),
            Command::AddParent(id) => self.add_parent(&id).map(CommandOutcome::NodeCreated),
            Command::AddSibling(id) => self.add_sibling(&id).map(CommandOutcome::NodeCreated),
            Command::Duplicate(id) => self.duplicate(&id).map(CommandOutcome::NodeCreated),
            Command::Delete(id) => self.delete_node(&id).map(|_| CommandOutcome::NodeDeleted),
            Command::TogglePortal(id) => {
                self.toggle_portal(&id)
                    .map(|document_id| CommandOutcome::PortalToggled {
                        is_portal: document_id.is_some(),
                        document_id,
                    })
            }
            Command::AddRootNode(position) => {
                self.add_root_node(position).map(CommandOutcome::NodeCreated)
            }
            Command::Connect { source, target } => self
                .connect(&source, &target)
                .map(CommandOutcome::EdgeCreated),
            Command::AutoLayout => self.apply_auto_layout().map(CommandOutcome::LayoutApplied),
            Command::Undo => Ok(CommandOutcome::HistoryStep(self.undo())),
            Command::Redo => Ok(CommandOutcome::HistoryStep(self.redo())),
        }
    }

    // ---- graph edits -------------------------------------------------------

    pub fn add_root_node(&mut self, position: Position) -> EditResult<String> {
        let node_id = self.workspace.active()?.fresh_node_id();
        self.commit(Some(&node_id), |doc| {
            doc.nodes
                .push(GraphNode::new(node_id.clone(), position, NEW_NODE_LABEL));
        })?;
        debug!(node = %node_id, "root node added");
        Ok(node_id)
    }

    pub fn add_child(&mut self, source_id: &str) -> EditResult<String> {
        let doc = self.workspace.active()?;
        let parent = require_node(doc, source_id)?;
        let position = child_position(
            parent.position,
            doc.child_count(source_id),
            self.layout_mode,
            &self.config.placement,
        );
        let node_id = doc.fresh_node_id();
        let edge = GraphEdge::new(doc.fresh_edge_id(), source_id, node_id.clone())
            .with_anchors(self.layout_mode.edge_anchors());

        self.commit(Some(&node_id), |doc| {
            doc.nodes
                .push(GraphNode::new(node_id.clone(), position, NEW_NODE_LABEL));
            doc.edges.push(edge);
        })?;
        debug!(parent = source_id, node = %node_id, "child added");
        Ok(node_id)
    }

    /// Splice a new node into the incoming edges of `node_id`.
    pub fn add_parent(&mut self, node_id: &str) -> EditResult<String> {
        let doc = self.workspace.active()?;
        let child = require_node(doc, node_id)?;
        let position = parent_position(child.position, self.layout_mode, &self.config.placement);
        let parent_id = doc.fresh_node_id();
        let edge = GraphEdge::new(doc.fresh_edge_id(), parent_id.clone(), node_id)
            .with_anchors(self.layout_mode.edge_anchors());

        self.commit(Some(&parent_id), |doc| {
            for existing in doc.edges.iter_mut().filter(|e| e.target == node_id) {
                existing.target = parent_id.clone();
            }
            doc.nodes
                .push(GraphNode::new(parent_id.clone(), position, NEW_NODE_LABEL));
            doc.edges.push(edge);
        })?;
        debug!(child = node_id, node = %parent_id, "parent spliced in");
        Ok(parent_id)
    }

    /// Add a node next to `selected_id`, sharing its parent when it has one.
    pub fn add_sibling(&mut self, selected_id: &str) -> EditResult<String> {
        let doc = self.workspace.active()?;
        let selected = require_node(doc, selected_id)?;
        let parent = doc
            .parent_edge(selected_id)
            .and_then(|edge| doc.node(&edge.source));
        let position = sibling_position(
            selected.position,
            parent.map(|p| (p.position, doc.child_count(&p.id))),
            self.layout_mode,
            &self.config.placement,
        );
        let node_id = doc.fresh_node_id();
        let edge = parent.map(|p| {
            GraphEdge::new(doc.fresh_edge_id(), p.id.clone(), node_id.clone())
                .with_anchors(self.layout_mode.edge_anchors())
        });

        self.commit(Some(&node_id), |doc| {
            doc.nodes
                .push(GraphNode::new(node_id.clone(), position, NEW_NODE_LABEL));
            doc.edges.extend(edge);
        })?;
        debug!(selected = selected_id, node = %node_id, "sibling added");
        Ok(node_id)
    }

    /// Copy label and color to a new node. Edges are not copied, and the copy
    /// is a plain node: a portal document belongs to exactly one node.
    pub fn duplicate(&mut self, node_id: &str) -> EditResult<String> {
        let doc = self.workspace.active()?;
        let original = require_node(doc, node_id)?;
        let copy_id = doc.fresh_node_id();
        let mut copy = original.clone();
        copy.id = copy_id.clone();
        copy.position = duplicate_position(original.position, &self.config.placement);
        copy.is_portal = false;
        copy.portal_document_id = None;

        self.commit(Some(&copy_id), |doc| doc.nodes.push(copy))?;
        debug!(original = node_id, node = %copy_id, "node duplicated");
        Ok(copy_id)
    }

    /// Remove a node and every edge touching it. A document the node opened
    /// is kept so that undo can restore the link.
    pub fn delete_node(&mut self, node_id: &str) -> EditResult<()> {
        require_node(self.workspace.active()?, node_id)?;
        self.commit(None, |doc| {
            doc.nodes.retain(|node| node.id != node_id);
            doc.edges.retain(|edge| !edge.touches(node_id));
        })?;
        debug!(node = node_id, "node deleted");
        Ok(())
    }

    /// Returns the new edge id, or `None` when the pair is already connected.
    pub fn connect(&mut self, source_id: &str, target_id: &str) -> EditResult<Option<String>> {
        let doc = self.workspace.active()?;
        require_node(doc, source_id)?;
        require_node(doc, target_id)?;
        if source_id == target_id {
            return Err(EditError::SelfLoop(source_id.to_string()));
        }
        if doc.has_edge_between(source_id, target_id) {
            return Ok(None);
        }
        let edge = GraphEdge::new(doc.fresh_edge_id(), source_id, target_id)
            .with_anchors(self.layout_mode.edge_anchors());
        let edge_id = edge.id.clone();

        self.commit(None, |doc| doc.edges.push(edge))?;
        debug!(source = source_id, target = target_id, edge = %edge_id, "nodes connected");
        Ok(Some(edge_id))
    }

    pub fn delete_edge(&mut self, edge_id: &str) -> EditResult<()> {
        if self.workspace.active()?.edge(edge_id).is_none() {
            return Err(EditError::EdgeNotFound(edge_id.to_string()));
        }
        self.commit(None, |doc| doc.edges.retain(|edge| edge.id != edge_id))?;
        debug!(edge = edge_id, "edge deleted");
        Ok(())
    }

    /// Turn a node into a portal (returning the document it opens) or back
    /// into a plain node (returning `None`). An earlier child document of the
    /// same node is re-linked rather than duplicated.
    pub fn toggle_portal(&mut self, node_id: &str) -> EditResult<Option<String>> {
        let doc = self.workspace.active()?;
        let node = require_node(doc, node_id)?;

        if node.is_portal {
            self.commit(None, |doc| {
                if let Some(node) = doc.node_mut(node_id) {
                    node.is_portal = false;
                    node.portal_document_id = None;
                }
            })?;
            debug!(node = node_id, "portal cleared");
            return Ok(None);
        }

        let label = node.label.clone();
        let active_id = doc.id.clone();
        let existing = self
            .workspace
            .portal_document(&active_id, node_id)
            .map(|doc| doc.id.clone());
        let target = match existing {
            Some(id) => id,
            None => self
                .workspace
                .insert_document(Some(&label), Some(&active_id), Some(node_id))?,
        };
        self.commit(None, |doc| {
            if let Some(node) = doc.node_mut(node_id) {
                node.is_portal = true;
                node.portal_document_id = Some(target.clone());
            }
        })?;
        debug!(node = node_id, document = %target, "portal linked");
        Ok(Some(target))
    }

    pub fn update_label(&mut self, node_id: &str, label: &str) -> EditResult<()> {
        require_node(self.workspace.active()?, node_id)?;
        self.commit(None, |doc| {
            if let Some(node) = doc.node_mut(node_id) {
                node.label = label.to_string();
            }
        })
    }

    pub fn set_color(&mut self, node_id: &str, color: NodeColor) -> EditResult<()> {
        require_node(self.workspace.active()?, node_id)?;
        self.commit(None, |doc| {
            if let Some(node) = doc.node_mut(node_id) {
                node.color = color;
            }
        })
    }

    /// Drag end: write the final position.
    pub fn move_node(&mut self, node_id: &str, position: Position) -> EditResult<()> {
        require_node(self.workspace.active()?, node_id)?;
        self.commit(None, |doc| {
            if let Some(node) = doc.node_mut(node_id) {
                node.position = position;
            }
        })
    }

    pub fn apply_auto_layout(&mut self) -> EditResult<LayoutOutcome> {
        if self.workspace.active()?.nodes.is_empty() {
            return Ok(LayoutOutcome::Empty);
        }
        let mode = self.layout_mode;
        let footprint = self.config.footprint;
        let auto = self.config.auto_layout.clone();
        let outcome = self.commit(None, |doc| {
            let Document { nodes, edges, .. } = doc;
            apply_auto_layout(nodes, edges, mode, &footprint, &auto)
        })?;
        info!(?outcome, ?mode, "auto layout");
        Ok(outcome)
    }

    /// Replace the active graph with an interchange payload. Malformed input
    /// leaves everything untouched; a successful import can be undone.
    ///
    /// A portal link survives only when it names the document this node
    /// already owns here; any other link is cleared.
    pub fn import_document(&mut self, input: &str) -> EditResult<()> {
        let active_id = self.workspace.active()?.id.clone();
        let mut snapshot =
            import_graph(input).inspect_err(|err| warn!(%err, "import rejected"))?;
        for node in &mut snapshot.nodes {
            let owned = self
                .workspace
                .portal_document(&active_id, &node.id)
                .map(|doc| doc.id.as_str());
            let linked =
                node.is_portal && owned.is_some() && node.portal_document_id.as_deref() == owned;
            if !linked && (node.is_portal || node.portal_document_id.is_some()) {
                debug!(node = %node.id, "imported portal link dropped");
                node.is_portal = false;
                node.portal_document_id = None;
            }
        }
        self.commit(None, |doc| doc.restore(snapshot))
    }

    pub fn export_document(&self) -> EditResult<String> {
        export_graph(&self.workspace.active()?.snapshot())
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        if self.layout_mode != mode {
            self.layout_mode = mode;
            self.schedule_save();
        }
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.schedule_save();
        self.sidebar_open
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.theme = self.theme.toggled();
        self.schedule_save();
        self.theme
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
        self.schedule_save();
    }

    // ---- history -----------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let Ok(doc) = self.workspace.active_mut() else {
            return false;
        };
        let Some(previous) = self.history.undo(doc.snapshot()) else {
            return false;
        };
        doc.restore(previous);
        self.schedule_save();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Ok(doc) = self.workspace.active_mut() else {
            return false;
        };
        let Some(next) = self.history.redo(doc.snapshot()) else {
            return false;
        };
        doc.restore(next);
        self.schedule_save();
        true
    }

    // ---- documents & navigation ---------------------------------------------

    pub fn create_document(
        &mut self,
        name: Option<&str>,
        parent_document_id: Option<&str>,
        parent_node_id: Option<&str>,
    ) -> EditResult<String> {
        let id = self
            .workspace
            .create_document(name, parent_document_id, parent_node_id)?;
        self.history.clear();
        self.schedule_save();
        Ok(id)
    }

    pub fn delete_document(&mut self, id: &str) -> EditResult<Vec<String>> {
        let before = self.workspace.active_id().map(str::to_string);
        let removed = self.workspace.delete_document(id)?;
        if self.workspace.active_id() != before.as_deref() {
            self.history.clear();
        } else {
            let workspace = &self.workspace;
            self.history.drop_portal_links(|target| workspace.contains(target));
        }
        self.schedule_save();
        Ok(removed)
    }

    pub fn rename_document(&mut self, id: &str, name: &str) -> EditResult<()> {
        self.workspace.rename_document(id, name)?;
        self.schedule_save();
        Ok(())
    }

    pub fn toggle_pin(&mut self, id: &str) -> EditResult<bool> {
        let pinned = self.workspace.toggle_pin(id)?;
        self.schedule_save();
        Ok(pinned)
    }

    pub fn set_active_document(&mut self, id: &str) -> EditResult<()> {
        self.workspace.set_active(id)?;
        self.history.clear();
        self.schedule_save();
        Ok(())
    }

    pub fn push_breadcrumb(&mut self, id: &str) -> EditResult<()> {
        self.workspace.push_breadcrumb(id)?;
        self.history.clear();
        self.schedule_save();
        Ok(())
    }

    /// Returns the document now active, or `None` at the outermost level.
    pub fn pop_breadcrumb(&mut self) -> Option<String> {
        let previous = self.workspace.pop_breadcrumb()?;
        self.history.clear();
        self.schedule_save();
        Some(previous)
    }

    pub fn navigate_to(&mut self, id: &str) -> EditResult<()> {
        self.workspace.navigate_to(id)?;
        self.history.clear();
        self.schedule_save();
        Ok(())
    }

    /// Descend into the document a portal node opens.
    pub fn enter_portal(&mut self, node_id: &str) -> EditResult<String> {
        let node = require_node(self.workspace.active()?, node_id)?;
        let target = node
            .portal_document_id
            .clone()
            .filter(|_| node.is_portal)
            .ok_or_else(|| EditError::DocumentNotFound(format!("portal of `{node_id}`")))?;
        self.push_breadcrumb(&target)?;
        Ok(target)
    }

    // ---- autosave ----------------------------------------------------------

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Write the pending state once its quiet window has passed.
    /// Returns whether a write happened.
    pub fn poll_autosave(
        &mut self,
        now: Instant,
        store: &mut dyn StateStore,
    ) -> anyhow::Result<bool> {
        match self.autosave.poll(now) {
            Some(state) => self.write(state, now, store),
            None => Ok(false),
        }
    }

    pub fn flush_autosave(&mut self, store: &mut dyn StateStore) -> anyhow::Result<bool> {
        match self.autosave.flush() {
            Some(state) => self.write(state, Instant::now(), store),
            None => Ok(false),
        }
    }

    fn write(
        &mut self,
        state: PersistedState,
        now: Instant,
        store: &mut dyn StateStore,
    ) -> anyhow::Result<bool> {
        if let Err(err) = store.save(&state) {
            warn!(%err, "autosave failed, will retry");
            if !self.autosave.is_pending() {
                self.autosave.arm(now, state);
            }
            return Err(err);
        }
        Ok(true)
    }

    fn schedule_save(&mut self) {
        let state = self.to_persisted();
        self.autosave.arm(Instant::now(), state);
    }

    /// Snapshot the active graph, apply `mutate`, and when `locked` names a
    /// freshly inserted node push overlapping neighbours away from it.
    fn commit<T>(
        &mut self,
        locked: Option<&str>,
        mutate: impl FnOnce(&mut Document) -> T,
    ) -> EditResult<T> {
        let mode = self.layout_mode;
        let doc = self.workspace.active_mut()?;
        self.history.record(doc.snapshot());
        let out = mutate(doc);
        if let Some(locked) = locked {
            resolve_collisions(
                &mut doc.nodes,
                mode,
                Some(locked),
                &self.config.footprint,
                &self.config.collision,
            );
        }
        doc.touch();
        self.schedule_save();
        Ok(out)
    }
}

fn require_node<'a>(doc: &'a Document, node_id: &str) -> EditResult<&'a GraphNode> {
    doc.node(node_id)
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))
}
