pub mod component;
pub mod component_renderer;
pub mod page;
pub mod permission;
pub mod user;

pub use component::*;
pub use component_renderer::*;
pub use page::*;
pub use permission::*;
pub use user::*;
