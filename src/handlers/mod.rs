pub mod health;
pub mod inject;
