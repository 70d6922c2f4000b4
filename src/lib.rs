pub mod appresult;
pub mod auth;
pub mod chats;
pub mod clock;
pub mod config;
pub mod db;
pub mod reply;
pub mod users;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::chats::{MessageStore, Presence, RoomHub, UnreadCoordinator};
use crate::config::Config;
use crate::users::UserDirectory;

pub use crate::appresult::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub directory: UserDirectory,
    pub unread: UnreadCoordinator,
    pub store: MessageStore,
    pub presence: Presence,
    pub hub: RoomHub,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        let directory = UserDirectory::new(db_pool.clone());
        Self {
            unread: UnreadCoordinator::new(directory.clone()),
            store: MessageStore::new(db_pool.clone()),
            presence: Presence::new(),
            hub: RoomHub::new(),
            directory,
            config,
            db_pool,
        }
    }
}
