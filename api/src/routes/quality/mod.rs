pub mod quality_route;
