pub mod cursor;
pub mod resource;
pub mod session;

pub use cursor::Cursor;
pub use resource::{AlbumMetadata, ImageBlob, Resource, ResourceKey};
pub use session::Session;
