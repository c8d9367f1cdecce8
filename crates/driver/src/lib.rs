pub mod cadence;
pub mod clock;
pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod framebuffer;
pub mod host;
pub mod keymap;
pub mod replay;
pub mod scheduler;
pub mod session;
pub mod testing;
mod util;

pub use crate::{
    cadence::{Cadence, StepUnit},
    config::{DriverConfig, InputDelivery},
    controller::{ButtonEvent, ButtonId, ControllerState, Edge},
    core::{EmulationCore, KeyInput},
    error::{Error, LoadError, Result},
    framebuffer::FrameBuffer,
    scheduler::{Renderer, Scheduler},
    session::{Session, SessionEvent, SessionPhase},
};
