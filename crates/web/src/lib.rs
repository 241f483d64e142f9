mod request;
mod response;

pub mod session;

pub use request::RawRequest;
pub use request::RequestContext;
pub use response::FrameOptions;
pub use response::Response;
pub use response::ResponseScope;
pub use session::CookieOptions;
pub use session::MemorySession;
pub use session::Session;
