// handlers/mod.rs - HTTP handlers
//
// `resource` holds the generic CRUD operations; `users` and `ledger` plug the
// concrete entities into them.

pub mod docs;
pub mod health;
pub mod ledger;
pub mod resource;
pub mod users;

pub use resource::Resource;
