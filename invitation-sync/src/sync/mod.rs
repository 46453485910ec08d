//! Guest list synchronization
//!
//! Reads guest rows, turns them into slug-keyed invitations, optionally
//! writes invitation links back to the sheet and publishes the result.

pub mod invitation;
pub mod links;
pub mod publish;
pub mod runner;
pub mod slug;

pub use invitation::{
    BuiltInvitations, ColumnLayout, GuestRow, Invitation, InvitationMap, RowError,
    build_invitations,
};
pub use links::{LinkReport, LinkSettings, LinkUpdater, LinkWriteMode, invitation_link};
pub use publish::{PublishPaths, Publisher, load_detail_document};
pub use runner::{SyncJob, SyncSummary, run_sync};
pub use slug::slugify;
