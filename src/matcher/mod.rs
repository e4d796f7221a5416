//! Rule resolution for update candidates

pub mod rule_matcher;

pub use rule_matcher::{resolve, EffectiveRule, RuleMatcher};
