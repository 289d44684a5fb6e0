//! Highway Simulation Library
//!
//! A discrete-event simulation of vehicles entering a highway, following one
//! another and occasionally colliding, plus a scenario runner that compares
//! speed limits and entry rates.

pub mod scenario;
pub mod simulation;
