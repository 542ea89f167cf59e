pub mod config;
pub mod cta;
pub mod error;
pub mod events;
pub mod overlay;
pub mod player;
pub mod progress;
pub mod surface;
pub mod tasks {
    pub mod cta;
    pub mod loader;
    pub mod overlay;
    pub mod renderer;
    pub mod scroll;
    pub mod smoother;
}
