use crate::error::{CostHierarchyError, Result};
use crate::schema::CostItem;
use std::collections::HashMap;
use uuid::Uuid;

/// Arena of cost items in sort order with index-based parent/child links.
#[derive(Debug, Clone, Default)]
pub struct CostTree {
    items: Vec<CostItem>,
    index: HashMap<Uuid, usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl CostTree {
    /// Assembles a tree from items produced by the hierarchy builder, where every
    /// parent link is already known to point backwards.
    pub(crate) fn from_built(items: Vec<CostItem>, parent: Vec<Option<usize>>) -> Self {
        let mut children = vec![Vec::new(); items.len()];
        for (idx, p) in parent.iter().enumerate() {
            if let Some(p) = p {
                children[*p].push(idx);
            }
        }

        let index = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id, idx))
            .collect();

        Self {
            items,
            index,
            parent,
            children,
        }
    }

    /// Rebuilds a tree from previously persisted items.
    ///
    /// Items are ordered by `sort_order`. A duplicate id, a parent that does not
    /// exist, or a parent that does not precede its child is an internal defect
    /// upstream and is reported as [`CostHierarchyError::BrokenHierarchy`].
    pub fn from_items(mut items: Vec<CostItem>) -> Result<Self> {
        items.sort_by_key(|item| item.sort_order);

        let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(items.len());
        let mut parent = Vec::with_capacity(items.len());

        for (idx, item) in items.iter().enumerate() {
            if index.insert(item.id, idx).is_some() {
                return Err(CostHierarchyError::BrokenHierarchy {
                    item: item.item_number.clone(),
                    details: format!("duplicate item id {}", item.id),
                });
            }

            let parent_idx = match item.parent_id {
                None => None,
                Some(parent_id) => {
                    let p = *index.get(&parent_id).ok_or_else(|| {
                        CostHierarchyError::BrokenHierarchy {
                            item: item.item_number.clone(),
                            details: format!(
                                "parent {} is missing or does not precede the item",
                                parent_id
                            ),
                        }
                    })?;

                    if p == idx || items[p].sort_order >= item.sort_order {
                        return Err(CostHierarchyError::BrokenHierarchy {
                            item: item.item_number.clone(),
                            details: format!(
                                "parent sort order {} is not before {}",
                                items[p].sort_order, item.sort_order
                            ),
                        });
                    }
                    Some(p)
                }
            };
            parent.push(parent_idx);
        }

        Ok(Self::from_built(items, parent))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CostItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CostItem> {
        self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&CostItem> {
        self.index.get(&id).map(|&idx| &self.items[idx])
    }

    pub fn require(&self, id: Uuid) -> Result<&CostItem> {
        self.get(id).ok_or(CostHierarchyError::UnknownItem(id))
    }

    /// First item carrying `item_number`, in sort order.
    pub fn get_by_number(&self, item_number: &str) -> Option<&CostItem> {
        let wanted = item_number.trim();
        self.items.iter().find(|item| item.item_number == wanted)
    }

    pub fn roots(&self) -> impl Iterator<Item = &CostItem> + '_ {
        self.items.iter().filter(|item| item.is_root())
    }

    pub fn parent(&self, id: Uuid) -> Option<&CostItem> {
        let idx = *self.index.get(&id)?;
        self.parent[idx].map(|p| &self.items[p])
    }

    /// Direct children of `id` in sort order. Empty for leaves and unknown ids.
    pub fn children(&self, id: Uuid) -> Vec<&CostItem> {
        match self.index.get(&id) {
            Some(&idx) => self.children[idx].iter().map(|&c| &self.items[c]).collect(),
            None => Vec::new(),
        }
    }

    pub fn has_children(&self, id: Uuid) -> bool {
        self.index
            .get(&id)
            .map(|&idx| !self.children[idx].is_empty())
            .unwrap_or(false)
    }

    /// Items with at least one direct child, in sort order.
    pub fn parents(&self) -> impl Iterator<Item = &CostItem> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.children[*idx].is_empty())
            .map(|(_, item)| item)
    }

    /// Number of ancestors above the item; roots are at depth 0.
    pub fn depth(&self, id: Uuid) -> usize {
        let mut depth = 0;
        let mut current = self.index.get(&id).copied();

        while let Some(idx) = current {
            match self.parent[idx] {
                Some(p) => {
                    depth += 1;
                    current = Some(p);
                }
                None => break,
            }
        }

        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn item(number: &str, sort_order: u32, parent_id: Option<Uuid>) -> CostItem {
        CostItem {
            id: Uuid::new_v4(),
            item_number: number.to_string(),
            description: format!("Item {}", number),
            job_cost_id: None,
            unit: None,
            budget: Some(dec!(100)),
            scheduled_value: Decimal::ZERO,
            quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            cost_method: "Cost".to_string(),
            sort_order,
            parent_id,
        }
    }

    #[test]
    fn test_from_items_sorts_and_links() {
        let root = item("1", 1, None);
        let child = item("AUTO-2", 2, Some(root.id));
        let grandchild = item("AUTO-3", 3, Some(child.id));

        let tree = CostTree::from_items(vec![
            grandchild.clone(),
            root.clone(),
            child.clone(),
        ])
        .unwrap();

        assert_eq!(tree.items()[0].id, root.id);
        assert_eq!(tree.roots().count(), 1);
        assert_eq!(tree.children(root.id).len(), 1);
        assert_eq!(tree.parent(grandchild.id).unwrap().id, child.id);
        assert_eq!(tree.depth(grandchild.id), 2);
        assert_eq!(tree.parents().count(), 2);
        assert!(!tree.has_children(grandchild.id));
        assert_eq!(tree.get_by_number("AUTO-3").unwrap().id, grandchild.id);
    }

    #[test]
    fn test_missing_parent_is_broken_hierarchy() {
        let orphan = item("1", 1, Some(Uuid::new_v4()));
        let result = CostTree::from_items(vec![orphan]);
        assert!(matches!(
            result,
            Err(CostHierarchyError::BrokenHierarchy { .. })
        ));
    }

    #[test]
    fn test_forward_parent_reference_rejected() {
        let mut early = item("1", 1, None);
        let late = item("2", 2, None);
        early.parent_id = Some(late.id);

        let result = CostTree::from_items(vec![early, late]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let a = item("1", 1, None);
        let mut b = item("2", 2, None);
        b.id = a.id;

        assert!(CostTree::from_items(vec![a, b]).is_err());
    }

    #[test]
    fn test_unknown_id_lookups() {
        let tree = CostTree::from_items(vec![item("1", 1, None)]).unwrap();
        let stranger = Uuid::new_v4();

        assert!(tree.get(stranger).is_none());
        assert!(tree.children(stranger).is_empty());
        assert!(matches!(
            tree.require(stranger),
            Err(CostHierarchyError::UnknownItem(_))
        ));
    }
}
