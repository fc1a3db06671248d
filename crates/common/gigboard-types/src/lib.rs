pub mod marketplace;
pub mod reputation;

pub use marketplace::{
    ActorRole, Bid, BidPatch, BidStatus, FileAction, FileLogEntry, NewProjectFile, PaymentStatus,
    Project, ProjectFeedback, ProjectFile, ProjectPatch, ProjectStatus, SubmissionStatus,
    Timestamp,
};
pub use reputation::{Freelancer, FreelancerReputation, RatingEntry};
