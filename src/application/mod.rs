pub mod statistics;
pub mod todo_service;
