pub mod sources_route;
