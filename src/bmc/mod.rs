//! Best master clock algorithm, *IEEE 802.1AS-2021 section 10.3*

pub(crate) mod bmca;
pub(crate) mod dataset_comparison;
pub(crate) mod foreign_master;
