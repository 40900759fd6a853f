pub mod notifications;
pub mod reminders;
pub mod tasks;
pub mod todos;
pub mod wellness;

pub use wellness::ReminderCheck;
