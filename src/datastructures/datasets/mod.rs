//! Data sets describing the local state of a domain, per *IEEE 802.1AS-2021
//! chapter 14*

mod current;
mod default;
mod parent;

pub use current::CurrentDS;
pub use default::DefaultDS;
pub use parent::ParentDS;
