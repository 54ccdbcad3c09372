// handlers/protected/mod.rs - Member handlers (JWT + organization membership required)
//
// Every handler receives the caller as `Extension<Member>` with the role's
// permissions already resolved, and scopes its queries to
// `member.organization_id()`. Writes check `member.require(..)` first.
pub mod attendance;
pub mod departments;
pub mod employees;
pub mod events;
pub mod join_requests;
pub mod news;
pub mod organization;
pub mod roles;
pub mod statistics;
pub mod tasks;
