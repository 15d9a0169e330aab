//! Skill operations, one module per command family.

mod add;
mod doctor;
mod inspect;
mod reconcile;
mod remove;
mod toggle;
mod transfer;
mod upgrade;

pub use inspect::SkillInfo;
