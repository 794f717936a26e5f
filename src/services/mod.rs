//! Application services.

pub mod invitation;

pub use invitation::{InvitationError, InvitationService, Invitee, Redeemed};
