//! Fragment storage and per-feature LC elution profiles (spec §4.2, §4.3;
//! components C2 and C3).

pub mod fragment_store;
pub mod lc_profile;

pub use fragment_store::{FragmentIon, FragmentStore};
pub use lc_profile::{LcProfile, Ms1Signal};
