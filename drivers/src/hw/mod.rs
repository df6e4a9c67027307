pub mod bcm2835;
pub mod sim;
