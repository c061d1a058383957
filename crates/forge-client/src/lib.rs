pub mod forge_client;
pub mod model;
