pub mod access;
pub mod auth;
pub mod dao;
pub mod email;
pub mod invitation;

pub use access::AccessService;
pub use auth::AuthService;
pub use invitation::InvitationService;
