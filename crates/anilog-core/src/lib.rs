//! # Anilog Core Library
//!
//! Tracks the titles a user follows and derives each one's broadcast lifecycle
//! purely from time. Three projections are kept consistent with that state as
//! time passes and as titles are edited: the "airing now" worklist, the
//! "upcoming" watchlist and an optional external calendar reminder.
//!
//! ## Core Modules
//!
//! - [`schedule`]: Pure lifecycle and episode calculations in a broadcast timezone
//! - [`store`]: Table access scoped to a caller-supplied transaction
//! - [`reminder`]: Reminder providers and the binder that keeps them in step
//! - [`repository`]: Transactional entry points with the Repository pattern
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and operation outcomes
//! - [`clock`]: Injectable source of the current time
//! - [`timezone`]: Timezone utilities and validation
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use anilog_core::{
//!     db, models::TitleData, reminder::MemoryReminderProvider,
//!     repository::{SqliteRepository, TitleRepository}, schedule::BroadcastCalendar,
//! };
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), anilog_core::error::CoreError> {
//!     let pool = db::establish_connection("anilog.db").await?;
//!     let calendar = BroadcastCalendar::from_name("Asia/Tokyo")?;
//!     let repo = SqliteRepository::new(pool, calendar, Arc::new(MemoryReminderProvider::new()));
//!
//!     let outcome = repo
//!         .add_title(TitleData {
//!             name: "Frieren".to_string(),
//!             total_episodes: 28,
//!             first_episode_at: Utc::now() + Duration::days(2),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} is {}", outcome.title.name, outcome.state);
//!
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod db;
pub mod error;
pub mod models;
pub mod reminder;
pub mod repository;
pub mod schedule;
pub mod store;
pub mod timezone;
