pub mod erapi;
pub mod model;
pub mod task;
