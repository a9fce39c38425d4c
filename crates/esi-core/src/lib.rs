pub mod analysis;
pub mod consts;
pub mod error;
pub mod filters;
pub mod frame;
pub mod io;
pub mod reconstruct;
pub mod trace;
