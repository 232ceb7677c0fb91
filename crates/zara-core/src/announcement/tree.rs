//! Pure operations on comment forests.
//!
//! Every mutation returns a new forest. Only the nodes on the path from the
//! root to the edited node are rebuilt; all other subtrees are the same
//! `Arc`s as in the input.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::model::{Comment, CommentForest};

pub fn append_comment(forest: &CommentForest, comment: Comment) -> CommentForest {
    let mut next = forest.clone();
    next.push(Arc::new(comment));
    next
}

/// Appends `reply` to the first comment with `parent_id` in pre-order.
///
/// Returns `None` when no such comment exists.
pub fn append_reply(forest: &CommentForest, parent_id: &str, reply: Comment) -> Option<CommentForest> {
    let path = locate(forest, parent_id)?;
    let nodes = nodes_along(forest, &path);

    let mut rebuilt = Comment::clone(nodes.last()?);
    rebuilt.replies.push(Arc::new(reply));
    for depth in (0..path.len() - 1).rev() {
        let mut parent = Comment::clone(nodes[depth]);
        parent.replies[path[depth + 1]] = Arc::new(rebuilt);
        rebuilt = parent;
    }

    let mut next = forest.clone();
    next[path[0]] = Arc::new(rebuilt);
    Some(next)
}

/// Child indices leading to the first comment with `id` in pre-order.
///
/// Walks with an explicit stack so reply chains of any depth are safe.
fn locate(forest: &CommentForest, id: &str) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut levels = vec![forest];
    let mut cursor = 0;
    loop {
        let level = *levels.last()?;
        if let Some(node) = level.get(cursor) {
            path.push(cursor);
            if node.id == id {
                return Some(path);
            }
            levels.push(&node.replies);
            cursor = 0;
        } else {
            levels.pop();
            cursor = path.pop()? + 1;
        }
    }
}

fn nodes_along<'a>(forest: &'a CommentForest, path: &[usize]) -> Vec<&'a Arc<Comment>> {
    let mut nodes = Vec::with_capacity(path.len());
    let mut level = forest;
    for &index in path {
        let node = &level[index];
        nodes.push(node);
        level = &node.replies;
    }
    nodes
}

/// Flips `user_id`'s membership in `likes`.
pub fn toggle_like(likes: &BTreeSet<String>, user_id: &str) -> BTreeSet<String> {
    let mut next = likes.clone();
    if !next.remove(user_id) {
        next.insert(user_id.to_string());
    }
    next
}

/// Pre-order search.
pub fn find_comment<'a>(forest: &'a CommentForest, id: &str) -> Option<&'a Comment> {
    let path = locate(forest, id)?;
    nodes_along(forest, &path).pop().map(Arc::as_ref)
}

/// Total number of comments at any depth.
pub fn count_comments(forest: &CommentForest) -> usize {
    let mut pending: Vec<&CommentForest> = vec![forest];
    let mut total = 0;
    while let Some(level) = pending.pop() {
        total += level.len();
        pending.extend(level.iter().map(|node| &node.replies));
    }
    total
}
