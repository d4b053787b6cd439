pub mod task;
pub mod user;

pub use task::{NewTask, Task, TaskCreate, TaskDeleted, TaskStatus, TaskUpdate};
pub use user::{AuthenticatedUser, User, UserResponse};
