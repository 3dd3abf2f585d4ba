use crate::interval::Interval;
use std::cmp::Ordering;

pub(super) type Link<C, P> = Option<Box<Node<C, P>>>;

/// A node of the AVL-balanced engine.
///
/// `height` is the augmentation used to derive the balance factor in
/// `O(1)` after a rotation, rather than recomputing it from scratch; the
/// invariant the spec states directly (`|height(left) - height(right)| <=
/// 1`) is checked against this field in the property tests.
pub(super) struct Node<C, P> {
    pub(super) interval: Interval<C, P>,
    pub(super) max: C,
    pub(super) left: Link<C, P>,
    pub(super) right: Link<C, P>,
    pub(super) height: i8,
    pub(super) size: u32,
}

impl<C: Copy, P> Node<C, P> {
    fn leaf(interval: Interval<C, P>) -> Self {
        let max = interval.end;
        Self {
            interval,
            max,
            left: None,
            right: None,
            height: 1,
            size: 1,
        }
    }
}

pub(super) fn height<C, P>(link: &Link<C, P>) -> i8 {
    link.as_ref().map_or(0, |n| n.height)
}

pub(super) fn size<C, P>(link: &Link<C, P>) -> u32 {
    link.as_ref().map_or(0, |n| n.size)
}

fn balance_factor<C, P>(node: &Node<C, P>) -> i8 {
    height(&node.right) - height(&node.left)
}

/// Recomputes `height`, `size`, and `max` for `node` from its (already
/// correct) children. Called bottom-up after any structural change.
fn recompute<C: Ord + Copy, P>(node: &mut Node<C, P>) {
    node.height = 1 + height(&node.left).max(height(&node.right));
    node.size = 1 + size(&node.left) + size(&node.right);

    let mut max = node.interval.end;
    if let Some(l) = &node.left {
        if l.max > max {
            max = l.max;
        }
    }
    if let Some(r) = &node.right {
        if r.max > max {
            max = r.max;
        }
    }
    node.max = max;
}

fn rotate_left<C: Ord + Copy, P>(mut node: Box<Node<C, P>>) -> Box<Node<C, P>> {
    let mut pivot = node.right.take().expect("rotate_left requires a right child");
    node.right = pivot.left.take();
    recompute(&mut node);
    pivot.left = Some(node);
    recompute(&mut pivot);
    pivot
}

fn rotate_right<C: Ord + Copy, P>(mut node: Box<Node<C, P>>) -> Box<Node<C, P>> {
    let mut pivot = node.left.take().expect("rotate_right requires a left child");
    node.left = pivot.right.take();
    recompute(&mut node);
    pivot.right = Some(node);
    recompute(&mut pivot);
    pivot
}

/// Restores the AVL invariant at `node`, assuming both children already
/// satisfy it. At most one single or double rotation is applied, per the
/// spec's rotation contract.
pub(super) fn rebalance<C: Ord + Copy, P>(mut node: Box<Node<C, P>>) -> Box<Node<C, P>> {
    recompute(&mut node);
    let bf = balance_factor(&node);

    if bf > 1 {
        if balance_factor(node.right.as_ref().unwrap()) < 0 {
            let right = node.right.take().unwrap();
            node.right = Some(rotate_right(right));
        }
        rotate_left(node)
    } else if bf < -1 {
        if balance_factor(node.left.as_ref().unwrap()) > 0 {
            let left = node.left.take().unwrap();
            node.left = Some(rotate_left(left));
        }
        rotate_right(node)
    } else {
        node
    }
}

/// Inserts `interval`, returning the new subtree root and whether a new
/// node was created (`false` means an equal-keyed node already existed and
/// was left unchanged).
pub(super) fn insert<C: Ord + Copy, P>(link: Link<C, P>, interval: Interval<C, P>) -> (Link<C, P>, bool) {
    match link {
        None => (Some(Box::new(Node::leaf(interval))), true),
        Some(mut node) => {
            match interval.cmp(&node.interval) {
                Ordering::Equal => (Some(node), false),
                Ordering::Less => {
                    if interval.end > node.max {
                        node.max = interval.end;
                    }
                    let (new_left, inserted) = insert(node.left.take(), interval);
                    node.left = new_left;
                    if inserted {
                        node = rebalance(node);
                    }
                    (Some(node), inserted)
                }
                Ordering::Greater => {
                    if interval.end > node.max {
                        node.max = interval.end;
                    }
                    let (new_right, inserted) = insert(node.right.take(), interval);
                    node.right = new_right;
                    if inserted {
                        node = rebalance(node);
                    }
                    (Some(node), inserted)
                }
            }
        }
    }
}

/// Removes the minimum-keyed node from `link`, returning the new subtree
/// root and the removed interval (used to implement successor
/// substitution in `erase`, and directly for the "no key" erase variant).
pub(super) fn remove_min<C: Ord + Copy, P>(link: Link<C, P>) -> (Link<C, P>, Option<Interval<C, P>>) {
    match link {
        None => (None, None),
        Some(mut node) => {
            if node.left.is_none() {
                (node.right.take(), Some(node.interval))
            } else {
                let (new_left, removed) = remove_min(node.left.take());
                node.left = new_left;
                let node = rebalance(node);
                (Some(node), removed)
            }
        }
    }
}

/// Removes the node whose key is `(start, end)`, if present.
pub(super) fn erase<C: Ord + Copy, P>(link: Link<C, P>, start: C, end: C) -> (Link<C, P>, Option<Interval<C, P>>) {
    match link {
        None => (None, None),
        Some(mut node) => match (start, end).cmp(&(node.interval.start, node.interval.end)) {
            Ordering::Less => {
                let (new_left, removed) = erase(node.left.take(), start, end);
                node.left = new_left;
                let node = if removed.is_some() { rebalance(node) } else { node };
                (Some(node), removed)
            }
            Ordering::Greater => {
                let (new_right, removed) = erase(node.right.take(), start, end);
                node.right = new_right;
                let node = if removed.is_some() { rebalance(node) } else { node };
                (Some(node), removed)
            }
            Ordering::Equal => match (node.left.take(), node.right.take()) {
                (None, None) => (None, Some(node.interval)),
                (Some(l), None) => (Some(l), Some(node.interval)),
                (None, Some(r)) => (Some(r), Some(node.interval)),
                (Some(l), Some(r)) => {
                    let (new_right, successor) = remove_min(Some(r));
                    let successor = successor.expect("right subtree was non-empty");
                    let removed = std::mem::replace(&mut node.interval, successor);
                    node.left = Some(l);
                    node.right = new_right;
                    let node = rebalance(node);
                    (Some(node), Some(removed))
                }
            },
        },
    }
}
