mod dispatcher;
mod model;
pub mod templates;

pub use dispatcher::{NOTIFICATION_STORE, NotificationDispatcher};
pub use model::{ActionType, NewNotification, Notification, NotificationType};
