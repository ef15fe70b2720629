//! Comment thread assembly.
//!
//! Turns a flat, chronologically ordered comment list into a parent/reply
//! forest. Pure transformation: the caller fetches and filters, this module
//! only shapes.

use lyceum_db::entities::comment;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A comment together with its (possibly empty) replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    /// The comment itself.
    #[serde(flatten)]
    pub comment: comment::Model,
    /// Direct replies, in the same order the input carried them.
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Wrap a comment with no replies.
    #[must_use]
    pub const fn leaf(comment: comment::Model) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }
}

/// Assemble the reply forest from a flat comment list.
///
/// All comments must belong to one content item; the caller filters by
/// `post_id`/`essay_id` before invoking this. Input order is preserved at
/// every level, so passing comments sorted ascending by creation time
/// yields chronological ordering throughout the forest.
///
/// A comment whose `parent_id` references an id absent from the input set
/// is dropped silently, along with anything nested under it. Nesting depth
/// is otherwise unbounded.
#[must_use]
pub fn build_forest(comments: Vec<comment::Model>) -> Vec<CommentNode> {
    let ids: HashSet<String> = comments.iter().map(|c| c.id.clone()).collect();

    let mut children: HashMap<String, Vec<comment::Model>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.parent_id.clone() {
            Some(parent_id) if ids.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(comment);
            }
            // Orphan: parent not in the set. Tolerated, excluded from the forest.
            Some(_) => {}
            None => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_replies(root, &mut children))
        .collect()
}

fn attach_replies(
    comment: comment::Model,
    children: &mut HashMap<String, Vec<comment::Model>>,
) -> CommentNode {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| attach_replies(reply, children))
        .collect();

    CommentNode { comment, replies }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn comment(id: &str, parent_id: Option<&str>, offset_secs: i64) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            author_id: "u1".to_string(),
            post_id: Some("p1".to_string()),
            essay_id: None,
            parent_id: parent_id.map(ToString::to_string),
            body: format!("comment {id}"),
            votes: 0,
            created_at: (Utc::now() + Duration::seconds(offset_secs)).into(),
        }
    }

    #[test]
    fn test_roots_in_chronological_order() {
        let flat = vec![
            comment("c1", None, 0),
            comment("c2", None, 1),
            comment("c3", None, 2),
        ];

        let forest = build_forest(flat);

        assert_eq!(forest.len(), 3);
        assert_eq!(forest[0].comment.id, "c1");
        assert_eq!(forest[1].comment.id, "c2");
        assert_eq!(forest[2].comment.id, "c3");
        assert!(forest.iter().all(|n| n.replies.is_empty()));
    }

    #[test]
    fn test_replies_attach_to_parents() {
        let flat = vec![
            comment("c1", None, 0),
            comment("c2", None, 1),
            comment("r1", Some("c1"), 2),
            comment("r2", Some("c1"), 3),
            comment("r3", Some("c2"), 4),
        ];

        let forest = build_forest(flat);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].replies.len(), 2);
        assert_eq!(forest[0].replies[0].comment.id, "r1");
        assert_eq!(forest[0].replies[1].comment.id, "r2");
        assert_eq!(forest[1].replies.len(), 1);
        assert_eq!(forest[1].replies[0].comment.id, "r3");
    }

    #[test]
    fn test_no_comment_lost_or_duplicated() {
        let flat = vec![
            comment("c1", None, 0),
            comment("r1", Some("c1"), 1),
            comment("r2", Some("c1"), 2),
            comment("c2", None, 3),
            comment("r3", Some("c2"), 4),
        ];
        let input_len = flat.len();

        let forest = build_forest(flat);

        fn count(nodes: &[CommentNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.replies)).sum()
        }
        assert_eq!(count(&forest), input_len);
    }

    #[test]
    fn test_arbitrary_nesting_depth() {
        let flat = vec![
            comment("c1", None, 0),
            comment("r1", Some("c1"), 1),
            comment("r2", Some("r1"), 2),
            comment("r3", Some("r2"), 3),
        ];

        let forest = build_forest(flat);

        assert_eq!(forest.len(), 1);
        let depth1 = &forest[0].replies[0];
        let depth2 = &depth1.replies[0];
        let depth3 = &depth2.replies[0];
        assert_eq!(depth3.comment.id, "r3");
        assert!(depth3.replies.is_empty());
    }

    #[test]
    fn test_orphan_dropped_silently() {
        let flat = vec![
            comment("c1", None, 0),
            comment("orphan", Some("gone"), 1),
        ];

        let forest = build_forest(flat);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment.id, "c1");
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn test_orphan_subtree_dropped() {
        // A reply under an orphan disappears with it.
        let flat = vec![
            comment("c1", None, 0),
            comment("orphan", Some("gone"), 1),
            comment("r1", Some("orphan"), 2),
        ];

        let forest = build_forest(flat);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment.id, "c1");
    }

    #[test]
    fn test_empty_input() {
        assert!(build_forest(Vec::new()).is_empty());
    }

    #[test]
    fn test_replies_never_null_in_json() {
        let forest = build_forest(vec![comment("c1", None, 0)]);
        let json = serde_json::to_value(&forest).unwrap();

        assert!(json[0]["replies"].is_array());
    }
}
