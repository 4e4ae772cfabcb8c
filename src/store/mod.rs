use crate::error::StoreResult;
use crate::models::activity::{ActivityEntry, ActivityQuery, ActivityStats, NewActivity};
use crate::models::analytics::{DailyCount, Engagement, OverviewStats, TopPost};
use crate::models::comment::{Comment, CommentFilter, CommentStatus, StatusCounts};
use crate::models::contact::{ContactForm, ContactMessage};
use crate::models::post::{Post, PostDetail, PostForm};
use crate::models::project::{Project, ProjectForm};
use crate::models::user::{OnlineUser, Registered, User};

pub mod sqlite;

/// Unified data-access trait. Every database operation goes through here.
/// Implementation: `SqliteStore` (wraps rusqlite/r2d2).
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> StoreResult<()>;
    /// Version string of the database engine; doubles as a health check.
    fn server_info(&self) -> StoreResult<String>;

    // ── Users ───────────────────────────────────────────────────────
    fn user_get_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    fn user_get_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    fn user_list_all(&self) -> StoreResult<Vec<User>>;
    fn user_list_online(&self, minutes: i64) -> StoreResult<Vec<OnlineUser>>;
    fn user_register(&self, username: &str, email: &str, password_hash: &str)
        -> StoreResult<Registered>;
    fn user_touch_last_active(&self, id: i64) -> StoreResult<()>;
    fn user_set_admin(&self, id: i64, is_admin: bool) -> StoreResult<()>;
    fn user_delete(&self, id: i64) -> StoreResult<()>;

    // ── Sessions ────────────────────────────────────────────────────
    fn session_create(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> StoreResult<()>;
    fn session_user(&self, token_hash: &str) -> StoreResult<Option<User>>;
    fn session_delete(&self, token_hash: &str) -> StoreResult<()>;
    fn session_cleanup_expired(&self) -> StoreResult<usize>;

    // ── Posts ───────────────────────────────────────────────────────
    fn post_list(&self) -> StoreResult<Vec<Post>>;
    fn post_find_by_id(&self, id: i64) -> StoreResult<Option<Post>>;
    fn post_detail(&self, id: i64, all_comments: bool) -> StoreResult<Option<PostDetail>>;
    fn post_exists(&self, id: i64) -> StoreResult<bool>;
    fn post_create(&self, form: &PostForm, author_id: i64) -> StoreResult<i64>;
    fn post_update(&self, id: i64, form: &PostForm) -> StoreResult<()>;
    fn post_delete(&self, id: i64) -> StoreResult<()>;

    // ── Likes ───────────────────────────────────────────────────────
    fn like_add(&self, post_id: i64, user_id: i64) -> StoreResult<bool>;
    fn like_remove(&self, post_id: i64, user_id: i64) -> StoreResult<bool>;
    fn like_exists(&self, post_id: i64, user_id: i64) -> StoreResult<bool>;
    fn like_count(&self, post_id: i64) -> StoreResult<i64>;

    // ── Projects ────────────────────────────────────────────────────
    fn project_list(&self) -> StoreResult<Vec<Project>>;
    fn project_find_by_id(&self, id: i64) -> StoreResult<Option<Project>>;
    fn project_create(&self, form: &ProjectForm) -> StoreResult<i64>;
    fn project_update(&self, id: i64, form: &ProjectForm) -> StoreResult<()>;
    fn project_delete(&self, id: i64) -> StoreResult<()>;

    // ── Comments ────────────────────────────────────────────────────
    fn comment_find_by_id(&self, id: i64) -> StoreResult<Option<Comment>>;
    fn comment_list(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>>;
    fn comment_counts(&self) -> StoreResult<StatusCounts>;
    fn comment_create(
        &self,
        post_id: i64,
        user_id: i64,
        body: &str,
        status: CommentStatus,
    ) -> StoreResult<i64>;
    fn comment_update_body(&self, id: i64, body: &str) -> StoreResult<()>;
    fn comment_update_status(&self, id: i64, status: CommentStatus) -> StoreResult<()>;
    fn comment_delete(&self, id: i64) -> StoreResult<()>;
    fn comment_bulk_update_status(&self, ids: &[i64], status: CommentStatus)
        -> StoreResult<usize>;
    fn comment_bulk_delete(&self, ids: &[i64]) -> StoreResult<usize>;

    // ── Contact ─────────────────────────────────────────────────────
    fn contact_create(&self, form: &ContactForm) -> StoreResult<i64>;
    fn contact_list(&self) -> StoreResult<Vec<ContactMessage>>;

    // ── Activity Log ────────────────────────────────────────────────
    fn activity_insert(&self, entry: &NewActivity<'_>) -> StoreResult<()>;
    fn activity_list(&self, query: &ActivityQuery) -> StoreResult<Vec<ActivityEntry>>;
    fn activity_count(&self, query: &ActivityQuery) -> StoreResult<i64>;
    fn activity_all(&self) -> StoreResult<Vec<ActivityEntry>>;
    fn activity_stats(&self, days: i64) -> StoreResult<ActivityStats>;

    // ── Analytics ───────────────────────────────────────────────────
    fn post_view_record(
        &self,
        post_id: i64,
        user_id: Option<i64>,
        ip_address: Option<&str>,
    ) -> StoreResult<()>;
    fn analytics_overview(&self) -> StoreResult<OverviewStats>;
    fn analytics_top_posts(&self, limit: i64) -> StoreResult<Vec<TopPost>>;
    fn analytics_engagement(&self, days: i64) -> StoreResult<Engagement>;
    fn analytics_user_growth(&self, days: i64) -> StoreResult<Vec<DailyCount>>;
}
