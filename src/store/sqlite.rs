use crate::db::DbPool;
use crate::error::StoreResult;
use crate::models::activity::{ActivityEntry, ActivityQuery, ActivityStats, NewActivity};
use crate::models::analytics::{DailyCount, Engagement, OverviewStats, PostView, TopPost};
use crate::models::comment::{Comment, CommentFilter, CommentStatus, StatusCounts};
use crate::models::contact::{ContactForm, ContactMessage};
use crate::models::like::Like;
use crate::models::post::{Post, PostDetail, PostForm};
use crate::models::project::{Project, ProjectForm};
use crate::models::session::Session;
use crate::models::user::{OnlineUser, Registered, User};

use super::Store;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> StoreResult<()> {
        crate::db::run_migrations(&self.pool)
    }

    fn server_info(&self) -> StoreResult<String> {
        let conn = self.pool.get()?;
        Ok(conn.query_row("SELECT sqlite_version()", [], |r| r.get(0))?)
    }

    // ── Users ───────────────────────────────────────────────────────

    fn user_get_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        User::get_by_id(&self.pool, id)
    }

    fn user_get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        User::get_by_username(&self.pool, username)
    }

    fn user_list_all(&self) -> StoreResult<Vec<User>> {
        User::list_all(&self.pool)
    }


    fn user_list_online(&self, minutes: i64) -> StoreResult<Vec<OnlineUser>> {
        User::list_online(&self.pool, minutes)
    }

    fn user_register(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<Registered> {
        User::register(&self.pool, username, email, password_hash)
    }

    fn user_touch_last_active(&self, id: i64) -> StoreResult<()> {
        User::touch_last_active(&self.pool, id)
    }

    fn user_set_admin(&self, id: i64, is_admin: bool) -> StoreResult<()> {
        User::set_admin(&self.pool, id, is_admin)
    }

    fn user_delete(&self, id: i64) -> StoreResult<()> {
        User::delete(&self.pool, id)
    }

    // ── Sessions ────────────────────────────────────────────────────

    fn session_create(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> StoreResult<()> {
        Session::create(&self.pool, token_hash, user_id, expires_at, ip, user_agent)
    }

    fn session_user(&self, token_hash: &str) -> StoreResult<Option<User>> {
        Session::user(&self.pool, token_hash)
    }

    fn session_delete(&self, token_hash: &str) -> StoreResult<()> {
        Session::delete(&self.pool, token_hash)
    }

    fn session_cleanup_expired(&self) -> StoreResult<usize> {
        Session::cleanup_expired(&self.pool)
    }

    // ── Posts ───────────────────────────────────────────────────────

    fn post_list(&self) -> StoreResult<Vec<Post>> {
        Post::list(&self.pool)
    }

    fn post_find_by_id(&self, id: i64) -> StoreResult<Option<Post>> {
        Post::find_by_id(&self.pool, id)
    }

    fn post_detail(&self, id: i64, all_comments: bool) -> StoreResult<Option<PostDetail>> {
        Post::detail(&self.pool, id, all_comments)
    }

    fn post_exists(&self, id: i64) -> StoreResult<bool> {
        Post::exists(&self.pool, id)
    }

    fn post_create(&self, form: &PostForm, author_id: i64) -> StoreResult<i64> {
        Post::create(&self.pool, form, author_id)
    }

    fn post_update(&self, id: i64, form: &PostForm) -> StoreResult<()> {
        Post::update(&self.pool, id, form)
    }

    fn post_delete(&self, id: i64) -> StoreResult<()> {
        Post::delete(&self.pool, id)
    }

    // ── Likes ───────────────────────────────────────────────────────

    fn like_add(&self, post_id: i64, user_id: i64) -> StoreResult<bool> {
        Like::add(&self.pool, post_id, user_id)
    }

    fn like_remove(&self, post_id: i64, user_id: i64) -> StoreResult<bool> {
        Like::remove(&self.pool, post_id, user_id)
    }

    fn like_exists(&self, post_id: i64, user_id: i64) -> StoreResult<bool> {
        Like::exists(&self.pool, post_id, user_id)
    }

    fn like_count(&self, post_id: i64) -> StoreResult<i64> {
        Like::count_for_post(&self.pool, post_id)
    }

    // ── Projects ────────────────────────────────────────────────────

    fn project_list(&self) -> StoreResult<Vec<Project>> {
        Project::list(&self.pool)
    }

    fn project_find_by_id(&self, id: i64) -> StoreResult<Option<Project>> {
        Project::find_by_id(&self.pool, id)
    }

    fn project_create(&self, form: &ProjectForm) -> StoreResult<i64> {
        Project::create(&self.pool, form)
    }

    fn project_update(&self, id: i64, form: &ProjectForm) -> StoreResult<()> {
        Project::update(&self.pool, id, form)
    }

    fn project_delete(&self, id: i64) -> StoreResult<()> {
        Project::delete(&self.pool, id)
    }

    // ── Comments ────────────────────────────────────────────────────

    fn comment_find_by_id(&self, id: i64) -> StoreResult<Option<Comment>> {
        Comment::find_by_id(&self.pool, id)
    }

    fn comment_list(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>> {
        Comment::list(&self.pool, filter)
    }

    fn comment_counts(&self) -> StoreResult<StatusCounts> {
        Comment::counts(&self.pool)
    }

    fn comment_create(
        &self,
        post_id: i64,
        user_id: i64,
        body: &str,
        status: CommentStatus,
    ) -> StoreResult<i64> {
        Comment::create(&self.pool, post_id, user_id, body, status)
    }

    fn comment_update_body(&self, id: i64, body: &str) -> StoreResult<()> {
        Comment::update_body(&self.pool, id, body)
    }

    fn comment_update_status(&self, id: i64, status: CommentStatus) -> StoreResult<()> {
        Comment::update_status(&self.pool, id, status)
    }

    fn comment_delete(&self, id: i64) -> StoreResult<()> {
        Comment::delete(&self.pool, id)
    }

    fn comment_bulk_update_status(
        &self,
        ids: &[i64],
        status: CommentStatus,
    ) -> StoreResult<usize> {
        Comment::bulk_update_status(&self.pool, ids, status)
    }

    fn comment_bulk_delete(&self, ids: &[i64]) -> StoreResult<usize> {
        Comment::bulk_delete(&self.pool, ids)
    }

    // ── Contact ─────────────────────────────────────────────────────

    fn contact_create(&self, form: &ContactForm) -> StoreResult<i64> {
        ContactMessage::create(&self.pool, form)
    }

    fn contact_list(&self) -> StoreResult<Vec<ContactMessage>> {
        ContactMessage::list(&self.pool)
    }

    // ── Activity Log ────────────────────────────────────────────────

    fn activity_insert(&self, entry: &NewActivity<'_>) -> StoreResult<()> {
        ActivityEntry::insert(&self.pool, entry)
    }

    fn activity_list(&self, query: &ActivityQuery) -> StoreResult<Vec<ActivityEntry>> {
        ActivityEntry::list(&self.pool, query)
    }

    fn activity_count(&self, query: &ActivityQuery) -> StoreResult<i64> {
        ActivityEntry::count(&self.pool, query)
    }

    fn activity_all(&self) -> StoreResult<Vec<ActivityEntry>> {
        ActivityEntry::all(&self.pool)
    }

    fn activity_stats(&self, days: i64) -> StoreResult<ActivityStats> {
        ActivityEntry::stats(&self.pool, days)
    }

    // ── Analytics ───────────────────────────────────────────────────

    fn post_view_record(
        &self,
        post_id: i64,
        user_id: Option<i64>,
        ip_address: Option<&str>,
    ) -> StoreResult<()> {
        PostView::record(&self.pool, post_id, user_id, ip_address)
    }

    fn analytics_overview(&self) -> StoreResult<OverviewStats> {
        PostView::overview(&self.pool)
    }

    fn analytics_top_posts(&self, limit: i64) -> StoreResult<Vec<TopPost>> {
        PostView::top_posts(&self.pool, limit)
    }

    fn analytics_engagement(&self, days: i64) -> StoreResult<Engagement> {
        PostView::engagement(&self.pool, days)
    }

    fn analytics_user_growth(&self, days: i64) -> StoreResult<Vec<DailyCount>> {
        PostView::user_growth(&self.pool, days)
    }
}
