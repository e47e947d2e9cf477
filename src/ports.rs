pub mod push;
pub mod store;
pub mod time;

pub use self::push::PushSender;
pub use self::store::{StoreError, SubscriptionStore};
pub use self::time::TimeProvider;
