use super::node::{Children, Layout, NodeId};
use super::{ItemsetTree, ROOT};
use crate::ap::tract::tree::NodeKind;
use crate::ap::tract::{Support, TransactionBag, TransactionTree};

impl ItemsetTree {
    /// Counts one transaction (items ascending) into the deepest level.
    pub fn count_transaction(&mut self, items: &[usize], weight: Support) {
        let height = self.height();
        if items.len() < height {
            return;
        }
        self.count_items(ROOT, items, weight, height);
    }

    /// Counts every transaction of the bag into the deepest level.
    pub fn count_bag(&mut self, bag: &TransactionBag) {
        for transaction in bag.iter() {
            self.count_transaction(&transaction.items, transaction.weight);
        }
    }

    /// Counts a transaction prefix tree into the deepest level.
    pub fn count_tree(&mut self, tree: &TransactionTree) {
        let height = self.height();
        self.count_tree_node(ROOT, tree, tree.root_index, height);
    }

    /// `min` is the number of items still needed to reach a counter.
    fn count_items(&mut self, id: NodeId, items: &[usize], weight: Support, min: usize) {
        let node = &mut self.nodes[id];
        if node.is_new_leaf() {
            match &node.layout {
                Layout::Dense { offset } => {
                    let offset = *offset;
                    let start = items.partition_point(|&item| item < offset);
                    for &item in &items[start..] {
                        match node.counters.get_mut(item - offset) {
                            Some(counter) => counter.support += weight,
                            None => break,
                        }
                    }
                }
                Layout::Sparse { ids } => {
                    let (mut i, mut k) = (0, 0);
                    while i < items.len() && k < ids.len() {
                        match items[i].cmp(&ids[k]) {
                            std::cmp::Ordering::Less => i += 1,
                            std::cmp::Ordering::Greater => k += 1,
                            std::cmp::Ordering::Equal => {
                                node.counters[k].support += weight;
                                i += 1;
                                k += 1;
                            }
                        }
                    }
                }
            }
            return;
        }
        if node.skip || min == 0 || items.len() < min {
            return;
        }
        for p in 0..=items.len() - min {
            if let Some(child) = self.nodes[id].children.get(items[p]) {
                self.count_items(child, &items[p + 1..], weight, min - 1);
            }
        }
    }

    fn count_tree_node(&mut self, id: NodeId, tree: &TransactionTree, index: usize, min: usize) {
        let tnode = tree.node(index);
        if tnode.max < min || self.nodes[id].skip {
            return;
        }
        let (items, children) = match &tnode.kind {
            NodeKind::Leaf { suffix } => {
                self.count_items(id, suffix, tnode.weight, min);
                return;
            }
            NodeKind::Branch { items, children } => (items, children),
        };
        // transactions not containing the branch item
        for &child in children.iter().rev() {
            self.count_tree_node(id, tree, child, min);
        }
        if self.nodes[id].is_new_leaf() {
            let node = &mut self.nodes[id];
            for (&item, &child) in items.iter().zip(children) {
                if let Some(slot) = node.slot(item) {
                    node.counters[slot].support += tree.node(child).weight;
                }
            }
        } else if min > 1 && !matches!(self.nodes[id].children, Children::None) {
            for (&item, &child) in items.iter().zip(children) {
                if let Some(next) = self.nodes[id].children.get(item) {
                    self.count_tree_node(next, tree, child, min - 1);
                }
            }
        }
    }
}
