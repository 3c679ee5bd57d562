use super::{Support, Transaction, TransactionBag};

/// Node of a transaction prefix tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Total weight of the transactions below this node
    pub weight: Support,
    /// Length of the longest item sequence below this node
    pub max: usize,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Distinct next items with one child subtree per item
    Branch { items: Vec<usize>, children: Vec<usize> },
    /// Remaining items of a single (aggregated) transaction
    Leaf { suffix: Vec<usize> },
}

/// Prefix tree over a sorted transaction bag.
///
/// Transactions sharing leading items share the path for those items, so
/// counting against the tree visits each common prefix once.
#[derive(Debug, Clone)]
pub struct TransactionTree {
    pub nodes: Vec<TreeNode>,
    pub root_index: usize,
}

impl TransactionTree {
    /// Builds the tree from `bag`. The bag is expected to be sorted in
    /// ascending order; an unsorted bag is ordered on a copy of references.
    pub fn build(bag: &TransactionBag) -> Self {
        let mut tracts: Vec<&Transaction> = bag.iter().collect();
        if !tracts.windows(2).all(|w| w[0].items <= w[1].items) {
            tracts.sort_by(|a, b| a.items.cmp(&b.items));
        }
        let mut tree = Self {
            nodes: Vec::new(),
            root_index: 0,
        };
        tree.root_index = tree.create(&tracts, 0);
        tree
    }

    fn create(&mut self, tracts: &[&Transaction], index: usize) -> usize {
        let weight: Support = tracts.iter().map(|t| t.weight).sum();
        if tracts.len() <= 1 || weight == 0 {
            let suffix = match tracts.first() {
                Some(t) if weight > 0 => t.items[index.min(t.len())..].to_vec(),
                _ => Vec::new(),
            };
            return self.push(TreeNode {
                weight,
                max: suffix.len(),
                kind: NodeKind::Leaf { suffix },
            });
        }

        // transactions ending at this position sort before their extensions
        let ended = tracts.iter().take_while(|t| t.len() <= index).count();
        let rest = &tracts[ended..];

        let node_index = self.push(TreeNode {
            weight,
            max: 0,
            kind: NodeKind::Branch {
                items: Vec::new(),
                children: Vec::new(),
            },
        });

        let mut items = Vec::new();
        let mut children = Vec::new();
        let mut max = 0;
        let mut start = 0;
        while start < rest.len() {
            let item = rest[start].items[index];
            let len = rest[start..]
                .iter()
                .take_while(|t| t.items[index] == item)
                .count();
            let child = self.create(&rest[start..start + len], index + 1);
            max = max.max(self.nodes[child].max + 1);
            items.push(item);
            children.push(child);
            start += len;
        }

        let node = &mut self.nodes[node_index];
        node.max = max;
        node.kind = NodeKind::Branch { items, children };
        node_index
    }

    fn push(&mut self, node: TreeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[self.root_index]
    }

    pub fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn total_weight(&self) -> Support {
        self.root().weight
    }

    /// Rebuilds the aggregated transactions stored in the tree.
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut result = Vec::new();
        let mut path = Vec::new();
        self.collect(self.root_index, &mut path, &mut result);
        result
    }

    fn collect(&self, index: usize, path: &mut Vec<usize>, out: &mut Vec<Transaction>) {
        let node = &self.nodes[index];
        match &node.kind {
            NodeKind::Leaf { suffix } => {
                if node.weight > 0 {
                    let mut items = path.clone();
                    items.extend_from_slice(suffix);
                    out.push(Transaction { items, weight: node.weight });
                }
            }
            NodeKind::Branch { items, children } => {
                let below: Support = children.iter().map(|&c| self.nodes[c].weight).sum();
                if node.weight > below {
                    out.push(Transaction {
                        items: path.clone(),
                        weight: node.weight - below,
                    });
                }
                for (&item, &child) in items.iter().zip(children) {
                    path.push(item);
                    self.collect(child, path, out);
                    path.pop();
                }
            }
        }
    }
}
