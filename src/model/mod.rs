//! Data models for the annotation engine.

mod image;
mod region;
mod tool;

pub use image::{Image, RealSize};
pub use region::{
    BoxGeometry, ExpandingLineGeometry, KeypointsGeometry, MIN_POLYGON_VERTICES, POINT_HIT_RADIUS,
    Point, PolygonGeometry, Region, RegionId, Shape, validate_region_set,
};
pub use tool::Tool;
