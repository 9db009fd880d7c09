//! Framework-agnostic records stored by the service.

pub mod clock_in;
pub mod object_id;
pub mod role;
pub mod task;
pub mod user;

pub use clock_in::{ClockIn, NewClockIn};
pub use object_id::{ObjectId, ObjectIdError};
pub use role::{NewPermission, NewRole, Permission, Role};
pub use task::{NewTask, NewTaskActivity, Task, TaskActivity, TaskPriority, TaskStatus};
pub use user::{NewUser, UserCredentials, UserSummary};
