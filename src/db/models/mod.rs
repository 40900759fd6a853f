pub mod notification;
pub mod reminder;
pub mod task;
pub mod todo;
pub mod wellness;

pub use notification::{
    NewNotification, Notification, NotificationCategory, NotificationKind, NotificationPage,
    NotificationQuery, NotificationStats,
};
pub use reminder::{NewReminder, Reminder, ReminderQuery};
pub use task::{NewTask, Task, TaskPage, TaskPriority, TaskQuery, TaskStatus, TaskUpdate, WorkCategory};
pub use todo::{NewTodo, Todo, TodoPage, TodoQuery, TodoStats, TodoStatus, TodoUpdate};
pub use wellness::{
    validation::{self, ValidationError},
    ActiveHours, ClockTime, ReminderCategory, ReminderConfig, WellnessSettings,
    WellnessSettingsUpdate,
};
