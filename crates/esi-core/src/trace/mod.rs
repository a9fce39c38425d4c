pub mod pixel;
pub mod stack;

pub use pixel::PixelTrace;
pub use stack::TraceStack;
