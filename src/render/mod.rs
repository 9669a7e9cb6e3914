mod environment;
mod gpu;
mod headless;
mod shaders;

pub use gpu::Renderer;
pub use headless::HeadlessRenderer;
