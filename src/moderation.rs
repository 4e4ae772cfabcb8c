use crate::audit::{self, actions};
use crate::error::{ApiError, ApiResult};
use crate::models::activity::NewActivity;
use crate::models::comment::CommentStatus;
use crate::security::auth::authorize_admin;
use crate::store::Store;

/// Admin transition applied to a single comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject,
    Spam,
    Pending,
}

impl ModerationAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(ModerationAction::Approve),
            "reject" => Some(ModerationAction::Reject),
            "spam" => Some(ModerationAction::Spam),
            "pending" => Some(ModerationAction::Pending),
            _ => None,
        }
    }

    /// Reject and spam land in the same state.
    pub fn target(self) -> CommentStatus {
        match self {
            ModerationAction::Approve => CommentStatus::Approved,
            ModerationAction::Reject | ModerationAction::Spam => CommentStatus::Spam,
            ModerationAction::Pending => CommentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Set(ModerationAction),
    Delete,
}

impl BulkAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delete" => Some(BulkAction::Delete),
            other => ModerationAction::parse(other).map(BulkAction::Set),
        }
    }
}

/// Move one comment to the state named by `action` and return that state.
///
/// Order of checks: caller must be an existing admin, then the id and
/// action must be valid, then the comment must exist.
pub fn moderate(
    store: &dyn Store,
    actor_id: Option<i64>,
    comment_id: i64,
    action: &str,
    ip: Option<&str>,
) -> ApiResult<CommentStatus> {
    let actor = authorize_admin(store, actor_id.ok_or(ApiError::Unauthorized)?)?;
    if comment_id <= 0 {
        return Err(ApiError::invalid("Missing or invalid comment id."));
    }
    let action = ModerationAction::parse(action).ok_or_else(|| ApiError::invalid("Invalid action"))?;
    let status = action.target();

    store.comment_update_status(comment_id, status)?;

    let details = format!("Comment #{} marked as {}", comment_id, status);
    audit::record(
        store,
        NewActivity {
            user_id: Some(actor.id),
            action: actions::MODERATE,
            entity_type: Some("comment"),
            entity_id: Some(comment_id),
            details: Some(details.as_str()),
            ip_address: ip,
        },
    );
    Ok(status)
}

/// Apply `action` to every id in a single statement. Returns rows affected.
pub fn bulk_moderate(
    store: &dyn Store,
    actor_id: Option<i64>,
    comment_ids: &[i64],
    action: &str,
    ip: Option<&str>,
) -> ApiResult<usize> {
    let actor = authorize_admin(store, actor_id.ok_or(ApiError::Unauthorized)?)?;
    if comment_ids.is_empty() {
        return Err(ApiError::invalid("No comment IDs provided"));
    }
    let action = BulkAction::parse(action).ok_or_else(|| ApiError::invalid("Invalid bulk action"))?;

    let (affected, label) = match action {
        BulkAction::Delete => (store.comment_bulk_delete(comment_ids)?, "delete"),
        BulkAction::Set(a) => {
            let status = a.target();
            (store.comment_bulk_update_status(comment_ids, status)?, status.as_str())
        }
    };

    let details = format!("{} of {} comments: {}", affected, comment_ids.len(), label);
    audit::record(
        store,
        NewActivity {
            user_id: Some(actor.id),
            action: actions::BULK_MODERATE,
            entity_type: Some("comment"),
            details: Some(details.as_str()),
            ip_address: ip,
            ..Default::default()
        },
    );
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_map_to_statuses() {
        assert_eq!(ModerationAction::parse("approve").map(|a| a.target()), Some(CommentStatus::Approved));
        assert_eq!(ModerationAction::parse("reject").map(|a| a.target()), Some(CommentStatus::Spam));
        assert_eq!(ModerationAction::parse("spam").map(|a| a.target()), Some(CommentStatus::Spam));
        assert_eq!(ModerationAction::parse("pending").map(|a| a.target()), Some(CommentStatus::Pending));
        assert_eq!(ModerationAction::parse("delete"), None);
        assert_eq!(ModerationAction::parse("Approve"), None);
    }

    #[test]
    fn bulk_adds_delete() {
        assert_eq!(BulkAction::parse("delete"), Some(BulkAction::Delete));
        assert_eq!(
            BulkAction::parse("reject"),
            Some(BulkAction::Set(ModerationAction::Reject))
        );
        assert_eq!(BulkAction::parse("purge"), None);
    }
}
