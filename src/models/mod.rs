pub mod location;
pub mod promotion;
pub mod rating;
pub mod rider;
pub mod trip;
