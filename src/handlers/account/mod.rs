// handlers/account/mod.rs - Account handlers (JWT required, membership not required)
//
// Accounts that have not joined an organization yet manage their session,
// look for companies and send join requests from here.
pub mod join_requests;
pub mod organizations;
pub mod session;
