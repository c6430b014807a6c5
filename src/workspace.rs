use crate::error::{EditError, EditResult};
use crate::model::{DEFAULT_DOCUMENT_NAME, Document, document_id};
use std::collections::{HashSet, VecDeque};
use tracing::info;

/// The tree of documents plus the navigation state over it.
///
/// Documents are kept in display order; within each parent group pinned
/// documents sort first. The breadcrumb is never empty while a document is
/// active.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    documents: Vec<Document>,
    active_id: Option<String>,
    breadcrumb: Vec<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts, ordered by creation time, repairing
    /// navigation that points at documents which no longer exist.
    pub fn from_parts(
        mut documents: Vec<Document>,
        active_id: Option<String>,
        breadcrumb: Vec<String>,
    ) -> Self {
        documents.sort_by_key(|doc| doc.created_at);
        let mut workspace = Self {
            documents,
            active_id: None,
            breadcrumb: Vec::new(),
        };
        let active = active_id
            .filter(|id| workspace.contains(id))
            .or_else(|| workspace.documents.first().map(|doc| doc.id.clone()));
        if let Some(active) = active {
            let mut crumbs: Vec<String> = breadcrumb
                .into_iter()
                .filter(|id| workspace.contains(id))
                .collect();
            if crumbs.last() != Some(&active) {
                crumbs = vec![active.clone()];
            }
            workspace.active_id = Some(active);
            workspace.breadcrumb = crumbs;
        }
        workspace
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn contains(&self, id: &str) -> bool {
        self.document(id).is_some()
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn document_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|doc| doc.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> EditResult<&Document> {
        let id = self.active_id.as_deref().ok_or(EditError::NoActiveDocument)?;
        self.document(id)
            .ok_or_else(|| EditError::DocumentNotFound(id.to_string()))
    }

    pub fn active_mut(&mut self) -> EditResult<&mut Document> {
        let id = self.active_id.clone().ok_or(EditError::NoActiveDocument)?;
        self.document_mut(&id).ok_or(EditError::DocumentNotFound(id))
    }

    pub fn breadcrumb(&self) -> &[String] {
        &self.breadcrumb
    }

    /// Allocate a document holding one default root node and append it.
    /// Does not change the active document.
    pub fn insert_document(
        &mut self,
        name: Option<&str>,
        parent_document_id: Option<&str>,
        parent_node_id: Option<&str>,
    ) -> EditResult<String> {
        if let Some(parent_id) = parent_document_id {
            let parent = self
                .document(parent_id)
                .ok_or_else(|| EditError::DocumentNotFound(parent_id.to_string()))?;
            if let Some(node_id) = parent_node_id {
                if !parent.has_node(node_id) {
                    return Err(EditError::NodeNotFound(node_id.to_string()));
                }
                if let Some(existing) = self.portal_document(parent_id, node_id) {
                    return Err(EditError::PortalExists {
                        node: node_id.to_string(),
                        document: existing.id.clone(),
                    });
                }
            }
        }

        let id = document_id();
        let mut doc = Document::new(id.clone(), name.unwrap_or(DEFAULT_DOCUMENT_NAME));
        doc.parent_document_id = parent_document_id.map(str::to_string);
        doc.parent_node_id = parent_document_id.and(parent_node_id).map(str::to_string);
        info!(document = %id, parent = ?doc.parent_document_id, "document created");
        self.documents.push(doc);
        Ok(id)
    }

    /// Create a document and navigate to it.
    pub fn create_document(
        &mut self,
        name: Option<&str>,
        parent_document_id: Option<&str>,
        parent_node_id: Option<&str>,
    ) -> EditResult<String> {
        let id = self.insert_document(name, parent_document_id, parent_node_id)?;
        self.navigate_to(&id)?;
        Ok(id)
    }

    /// Remove a document together with every document nested beneath it.
    /// Portal nodes elsewhere that opened a removed document stop being portals.
    pub fn delete_document(&mut self, id: &str) -> EditResult<Vec<String>> {
        if !self.contains(id) {
            return Err(EditError::DocumentNotFound(id.to_string()));
        }
        let removed = self.subtree_ids(id);
        let removed_set: HashSet<&str> = removed.iter().map(String::as_str).collect();
        self.documents
            .retain(|doc| !removed_set.contains(doc.id.as_str()));

        for doc in &mut self.documents {
            let mut touched = false;
            for node in &mut doc.nodes {
                let dangling = node
                    .portal_document_id
                    .as_deref()
                    .is_some_and(|target| removed_set.contains(target));
                if dangling {
                    node.is_portal = false;
                    node.portal_document_id = None;
                    touched = true;
                }
            }
            if touched {
                doc.touch();
            }
        }

        self.breadcrumb
            .retain(|crumb| !removed_set.contains(crumb.as_str()));
        let active_removed = self
            .active_id
            .as_deref()
            .is_some_and(|active| removed_set.contains(active));
        if active_removed {
            match self.documents.first().map(|doc| doc.id.clone()) {
                Some(first) => {
                    self.active_id = Some(first.clone());
                    self.breadcrumb = vec![first];
                }
                None => {
                    self.active_id = None;
                    self.breadcrumb.clear();
                }
            }
        }
        info!(document = %id, removed = removed.len(), "document deleted");
        Ok(removed)
    }

    pub fn rename_document(&mut self, id: &str, name: &str) -> EditResult<()> {
        let doc = self
            .document_mut(id)
            .ok_or_else(|| EditError::DocumentNotFound(id.to_string()))?;
        doc.name = name.to_string();
        doc.touch();
        Ok(())
    }

    /// Flip the pin and move the document to the pinned/unpinned boundary of
    /// its parent group. Returns the new pin state.
    pub fn toggle_pin(&mut self, id: &str) -> EditResult<bool> {
        let index = self
            .documents
            .iter()
            .position(|doc| doc.id == id)
            .ok_or_else(|| EditError::DocumentNotFound(id.to_string()))?;
        let mut doc = self.documents.remove(index);
        doc.pinned = !doc.pinned;
        doc.touch();
        let pinned = doc.pinned;
        let group = doc.parent_document_id.clone();

        let members: Vec<usize> = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, other)| other.parent_document_id == group)
            .map(|(idx, _)| idx)
            .collect();
        let last_pinned = members
            .iter()
            .copied()
            .filter(|idx| self.documents[*idx].pinned)
            .last();
        let insert_at = match (last_pinned, members.first()) {
            (Some(idx), _) => idx + 1,
            (None, Some(first)) => *first,
            (None, None) => index,
        };
        self.documents.insert(insert_at.min(self.documents.len()), doc);
        Ok(pinned)
    }

    /// Make `id` active with a single-element breadcrumb.
    pub fn set_active(&mut self, id: &str) -> EditResult<()> {
        if !self.contains(id) {
            return Err(EditError::DocumentNotFound(id.to_string()));
        }
        self.active_id = Some(id.to_string());
        self.breadcrumb = vec![id.to_string()];
        Ok(())
    }

    pub fn push_breadcrumb(&mut self, id: &str) -> EditResult<()> {
        if !self.contains(id) {
            return Err(EditError::DocumentNotFound(id.to_string()));
        }
        self.breadcrumb.push(id.to_string());
        self.active_id = Some(id.to_string());
        Ok(())
    }

    /// Step back out one level. Returns the newly active id, or `None` when
    /// already at the outermost crumb.
    pub fn pop_breadcrumb(&mut self) -> Option<String> {
        if self.breadcrumb.len() <= 1 {
            return None;
        }
        self.breadcrumb.pop();
        let previous = self.breadcrumb.last().cloned()?;
        self.active_id = Some(previous.clone());
        Some(previous)
    }

    /// Activate `id` with the breadcrumb set to its full ancestor path.
    pub fn navigate_to(&mut self, id: &str) -> EditResult<()> {
        let path = self.ancestor_path(id)?;
        self.active_id = Some(id.to_string());
        self.breadcrumb = path;
        Ok(())
    }

    /// Ids from the top-level ancestor down to `id`, inclusive.
    pub fn ancestor_path(&self, id: &str) -> EditResult<Vec<String>> {
        let mut current = self
            .document(id)
            .ok_or_else(|| EditError::DocumentNotFound(id.to_string()))?;
        let mut path = vec![current.id.clone()];
        while let Some(parent_id) = current.parent_document_id.as_deref() {
            let Some(parent) = self.document(parent_id) else {
                break;
            };
            if path.iter().any(|seen| seen == parent_id) || path.len() > self.documents.len() {
                break;
            }
            path.push(parent.id.clone());
            current = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// `id` followed by all transitive child documents, breadth first.
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::from([id.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for child in &self.documents {
                if child.parent_document_id.as_deref() == Some(current.as_str()) {
                    queue.push_back(child.id.clone());
                }
            }
            out.push(current);
        }
        out
    }

    /// Children of `parent` (top-level documents for `None`) with pinned first,
    /// otherwise in stored order.
    pub fn child_documents(&self, parent: Option<&str>) -> Vec<&Document> {
        let mut group: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| doc.parent_document_id.as_deref() == parent)
            .collect();
        group.sort_by_key(|doc| !doc.pinned);
        group
    }

    pub fn top_level_documents(&self) -> Vec<&Document> {
        self.child_documents(None)
    }

    /// The document opened by portal node `node_id` of document `document_id`.
    pub fn portal_document(&self, document_id: &str, node_id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| {
            doc.parent_document_id.as_deref() == Some(document_id)
                && doc.parent_node_id.as_deref() == Some(node_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ROOT_NODE_ID;

    fn names(docs: &[&Document]) -> Vec<String> {
        docs.iter().map(|doc| doc.name.clone()).collect()
    }

    #[test]
    fn create_activates_with_single_crumb() {
        let mut ws = Workspace::new();
        let id = ws.create_document(Some("Plans"), None, None).unwrap();
        assert_eq!(ws.active_id(), Some(id.as_str()));
        assert_eq!(ws.breadcrumb(), &[id.clone()]);
        assert_eq!(ws.active().unwrap().nodes[0].id, ROOT_NODE_ID);
    }

    #[test]
    fn child_document_path_includes_ancestors() {
        let mut ws = Workspace::new();
        let top = ws.create_document(None, None, None).unwrap();
        let child = ws
            .create_document(Some("Inner"), Some(&top), Some(ROOT_NODE_ID))
            .unwrap();
        assert_eq!(ws.breadcrumb(), &[top.clone(), child.clone()]);
        assert_eq!(ws.pop_breadcrumb(), Some(top.clone()));
        assert_eq!(ws.pop_breadcrumb(), None);
        assert_eq!(ws.active_id(), Some(top.as_str()));
    }

    #[test]
    fn portal_node_owns_at_most_one_document() {
        let mut ws = Workspace::new();
        let top = ws.create_document(None, None, None).unwrap();
        ws.insert_document(None, Some(&top), Some(ROOT_NODE_ID)).unwrap();
        let err = ws
            .insert_document(None, Some(&top), Some(ROOT_NODE_ID))
            .unwrap_err();
        assert!(matches!(err, EditError::PortalExists { .. }));
    }

    #[test]
    fn delete_cascades_through_grandchildren() {
        let mut ws = Workspace::new();
        let top = ws.create_document(None, None, None).unwrap();
        let child = ws.insert_document(None, Some(&top), Some(ROOT_NODE_ID)).unwrap();
        let grandchild = ws
            .insert_document(None, Some(&child), Some(ROOT_NODE_ID))
            .unwrap();
        let other = ws.insert_document(Some("Other"), None, None).unwrap();

        let removed = ws.delete_document(&child).unwrap();
        assert_eq!(removed, vec![child.clone(), grandchild.clone()]);
        assert!(!ws.contains(&grandchild));
        assert!(ws.contains(&other));
        assert_eq!(ws.active_id(), Some(top.as_str()));
    }

    #[test]
    fn deleting_active_falls_back_to_first_remaining() {
        let mut ws = Workspace::new();
        let first = ws.create_document(Some("A"), None, None).unwrap();
        let second = ws.create_document(Some("B"), None, None).unwrap();
        ws.delete_document(&second).unwrap();
        assert_eq!(ws.active_id(), Some(first.as_str()));
        assert_eq!(ws.breadcrumb(), &[first.clone()]);
        ws.delete_document(&first).unwrap();
        assert_eq!(ws.active_id(), None);
        assert!(ws.breadcrumb().is_empty());
        assert!(matches!(ws.active(), Err(EditError::NoActiveDocument)));
    }

    #[test]
    fn pinning_moves_to_group_boundary() {
        let mut ws = Workspace::new();
        let a = ws.insert_document(Some("A"), None, None).unwrap();
        let _b = ws.insert_document(Some("B"), None, None).unwrap();
        let c = ws.insert_document(Some("C"), None, None).unwrap();

        assert!(ws.toggle_pin(&c).unwrap());
        assert_eq!(names(&ws.top_level_documents()), ["C", "A", "B"]);
        assert!(ws.toggle_pin(&a).unwrap());
        assert_eq!(names(&ws.top_level_documents()), ["C", "A", "B"]);
        assert!(!ws.toggle_pin(&c).unwrap());
        assert_eq!(names(&ws.top_level_documents()), ["A", "C", "B"]);
    }

    #[test]
    fn from_parts_repairs_stale_navigation() {
        let mut ws = Workspace::new();
        let a = ws.insert_document(Some("A"), None, None).unwrap();
        let b = ws.insert_document(Some("B"), None, None).unwrap();
        ws.toggle_pin(&b).unwrap();
        let docs = ws.documents().to_vec();

        let restored = Workspace::from_parts(docs, Some("gone".into()), vec!["gone".into()]);
        assert_eq!(restored.top_level_documents()[0].id, b);
        let active = restored.active_id().unwrap().to_string();
        assert!(active == a || active == b);
        assert_eq!(restored.breadcrumb(), &[active]);
        assert!(restored.contains(&a));
    }

    #[test]
    fn rename_and_unknown_ids() {
        let mut ws = Workspace::new();
        let id = ws.create_document(None, None, None).unwrap();
        ws.rename_document(&id, "Renamed").unwrap();
        assert_eq!(ws.document(&id).unwrap().name, "Renamed");
        assert!(ws.rename_document("missing", "x").is_err());
        assert!(ws.set_active("missing").is_err());
        assert!(ws.push_breadcrumb("missing").is_err());
    }
}
