pub mod locks;
pub mod uuid;
