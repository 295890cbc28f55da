pub mod dispatch_claims;
pub mod judgments;
pub mod participants;
pub mod session_states;
pub mod sessions;
pub mod submissions;

pub use dispatch_claims::Entity as DispatchClaims;
pub use judgments::Entity as Judgments;
pub use participants::Entity as Participants;
pub use participants::Model as ParticipantRow;
pub use session_states::Entity as SessionStates;
pub use sessions::Entity as Sessions;
pub use submissions::Entity as Submissions;
