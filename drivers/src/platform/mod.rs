//! Platform drivers built on top of the raw register layouts in [`crate::hw`].

pub mod bcm2835;
