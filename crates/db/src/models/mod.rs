pub mod access_grant;
pub mod invitation;
pub mod transaction;
pub mod user;

pub use access_grant::AccessGrant;
pub use invitation::{Invitation, InvitationOrigin, InvitationStatus};
pub use transaction::Transaction;
pub use user::User;
