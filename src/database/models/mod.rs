pub mod assignment;
pub mod attendance;
pub mod department;
pub mod event;
pub mod join_request;
pub mod news;
pub mod organization;
pub mod role;
pub mod user;

pub use assignment::{Assignment, TaskPriority, TaskStatus};
pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use department::Department;
pub use event::Event;
pub use join_request::{JoinRequest, JoinRequestStatus};
pub use news::NewsPost;
pub use organization::Organization;
pub use role::Role;
pub use user::User;
