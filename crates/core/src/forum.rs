//! Posts and replies.
//!
//! The document store is an external collaborator; [`PostRepository`] is the
//! slice of it the HTTP handlers need, and [`InMemoryPostRepository`] is the
//! stand-in used for local runs and tests.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: DbId,
    pub author_id: DbId,
    /// Slug of the game category the post belongs to.
    pub game: String,
    pub title: String,
    pub body: String,
    pub reply_count: u32,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub id: DbId,
    pub post_id: DbId,
    pub author_id: DbId,
    pub body: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub game: String,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Newest first.
    async fn list_posts(&self) -> Vec<Post>;
    async fn create_post(&self, author_id: DbId, input: NewPost) -> Post;
    async fn create_reply(
        &self,
        post_id: DbId,
        author_id: DbId,
        body: String,
    ) -> Result<Reply, CoreError>;
    /// Removes the post and its replies.
    async fn delete_post(&self, id: DbId) -> Result<(), CoreError>;
}

#[derive(Debug, Default)]
struct Board {
    posts: Vec<Post>,
    replies: Vec<Reply>,
    next_id: DbId,
}

impl Board {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    board: RwLock<Board>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_posts(&self) -> Vec<Post> {
        let board = self.board.read().await;
        board.posts.iter().rev().cloned().collect()
    }

    async fn create_post(&self, author_id: DbId, input: NewPost) -> Post {
        let mut board = self.board.write().await;
        let post = Post {
            id: board.allocate_id(),
            author_id,
            game: input.game,
            title: input.title,
            body: input.body,
            reply_count: 0,
            created_at: Utc::now(),
        };
        board.posts.push(post.clone());
        post
    }

    async fn create_reply(
        &self,
        post_id: DbId,
        author_id: DbId,
        body: String,
    ) -> Result<Reply, CoreError> {
        let mut board = self.board.write().await;
        let id = board.allocate_id();
        let post = board
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(CoreError::NotFound {
                entity: "Post",
                id: post_id,
            })?;
        post.reply_count += 1;

        let reply = Reply {
            id,
            post_id,
            author_id,
            body,
            created_at: Utc::now(),
        };
        board.replies.push(reply.clone());
        Ok(reply)
    }

    async fn delete_post(&self, id: DbId) -> Result<(), CoreError> {
        let mut board = self.board.write().await;
        let before = board.posts.len();
        board.posts.retain(|p| p.id != id);
        if board.posts.len() == before {
            return Err(CoreError::NotFound { entity: "Post", id });
        }
        board.replies.retain(|r| r.post_id != id);
        Ok(())
    }
}
