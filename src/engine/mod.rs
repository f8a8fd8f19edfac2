pub mod lifecycle;
pub mod locator;
pub mod pricing;
pub mod promotion;
pub mod rating;
pub mod validation;
