//! Category Model

use serde::{Deserialize, Serialize};

/// Category tree node as returned by `GET /categories/tree`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, mut child: CategoryNode) -> Self {
        child.parent = Some(self.id);
        self.children.push(child);
        self
    }

    /// This node followed by all descendants, depth first
    pub fn walk(&self) -> Vec<&CategoryNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    /// Names from the root down to the node with `id` (`["Apparel", "Shoes"]`)
    pub fn path_to(&self, id: i64) -> Option<Vec<&str>> {
        if self.id == id {
            return Some(vec![self.name.as_str()]);
        }
        self.children.iter().find_map(|child| {
            child.path_to(id).map(|mut path| {
                path.insert(0, self.name.as_str());
                path
            })
        })
    }
}

/// Find the display path of a category anywhere in a forest
pub fn category_path(roots: &[CategoryNode], id: i64) -> Option<String> {
    roots
        .iter()
        .find_map(|root| root.path_to(id))
        .map(|path| path.join(" / "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<CategoryNode> {
        vec![
            CategoryNode::new(1, "Apparel")
                .with_child(CategoryNode::new(4, "Shoes").with_child(CategoryNode::new(7, "Boots"))),
            CategoryNode::new(2, "Home"),
        ]
    }

    #[test]
    fn test_walk_visits_every_depth() {
        let ids: Vec<i64> = tree().iter().flat_map(CategoryNode::walk).map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 4, 7, 2]);
    }

    #[test]
    fn test_category_path() {
        let roots = tree();
        assert_eq!(category_path(&roots, 7).as_deref(), Some("Apparel / Shoes / Boots"));
        assert_eq!(category_path(&roots, 2).as_deref(), Some("Home"));
        assert_eq!(category_path(&roots, 99), None);
    }

    #[test]
    fn test_with_child_sets_parent() {
        let roots = tree();
        assert_eq!(roots[0].children[0].parent, Some(1));
    }
}
