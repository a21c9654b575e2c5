pub mod params;
pub mod time;
