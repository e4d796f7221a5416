//! Domain logic - pure policy types independent of loading and output

pub mod branch;
pub mod candidate;
pub mod decision;
pub mod policy;
pub mod version;

pub use branch::BranchNaming;
pub use candidate::UpdateCandidate;
pub use decision::{BlockReason, BranchPlan, Decision, DecisionRecord, SkipReason};
pub use policy::{Limit, Limits, OnboardingConfig, PackageRule, PolicyDocument};
pub use version::UpdateType;
