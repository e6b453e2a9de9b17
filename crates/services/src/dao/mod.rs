pub mod access_grant;
pub mod base;
pub mod invitation;
pub mod transaction;
pub mod user;

pub use base::BaseDao;
