pub mod chat;
pub mod classify;
pub mod ids;
pub mod note;
pub mod task;
