//! In-memory stores over the remote backend. Each store owns its
//! collection exclusively; callers go through store methods, and every
//! mutating method follows one discipline: the server call succeeds
//! first, then local state changes. No optimistic writes anywhere.

mod error;
pub mod notifications;
pub mod poller;
pub mod transactions;

pub use error::StoreError;
pub use notifications::NotificationStore;
pub use poller::NotificationPoller;
pub use transactions::TransactionStore;

#[cfg(test)]
mod test_fixtures;
