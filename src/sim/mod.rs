pub mod catalog;
pub mod event;
pub mod progression;
pub mod router;
pub mod save;
pub mod world;
