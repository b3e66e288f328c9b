pub mod conversations;
pub mod models;
pub mod notifications;
pub mod posts;
pub mod users;

pub use conversations::ConversationRepository;
pub use models::{NotificationKind, PostRow, PublicProfile, UserRow};
pub use notifications::NotificationRepository;
pub use posts::{Interaction, PostRepository};
pub use users::UserRepository;
