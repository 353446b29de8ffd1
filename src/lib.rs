//! A terminal task card that resolves category names in the background.
//!
//! The card renders immediately with a placeholder category and swaps in the
//! resolved name once the lookup settles. Lookups are keyed by category id
//! per mounted card, so re-renders never re-fetch and late results for a
//! superseded category are dropped.

pub mod board;
pub mod card;
pub mod config;
pub mod error;
pub mod lookup;
pub mod resolver;
pub mod route;
pub mod store;
pub mod task;
pub mod ui;

pub use card::{CardCallbacks, CategoryName, TaskCard, TaskCardView};
pub use error::{AppError, CardError, ResolutionError, StoreError};
pub use lookup::{CategoryLookups, RetryPolicy};
pub use resolver::{CachedResolver, CategoryFile, CategoryNameResolver};
pub use route::NavigationIntent;
pub use task::{CategoryId, StateCode, Task, TaskData, TaskState};
