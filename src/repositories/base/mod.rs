pub mod repository_base;

pub use repository_base::map_diesel_error;
