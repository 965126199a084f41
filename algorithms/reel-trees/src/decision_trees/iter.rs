use std::collections::VecDeque;

use super::TreeNode;

/// Breadth-first iterator over the nodes of a regression tree, starting at the root
///
/// Nodes of the same depth are yielded left to right.
pub struct NodeIter<'a, F> {
    pending: VecDeque<&'a TreeNode<F>>,
}

impl<'a, F> NodeIter<'a, F> {
    pub fn new(root: &'a TreeNode<F>) -> Self {
        NodeIter {
            pending: VecDeque::from(vec![root]),
        }
    }
}

impl<'a, F: reel::Float> Iterator for NodeIter<'a, F> {
    type Item = &'a TreeNode<F>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pending.pop_front()?;
        self.pending
            .extend(node.children().into_iter().filter_map(|child| child.as_deref()));

        Some(node)
    }
}
