pub mod debate_flow;
pub mod observer;
pub mod timer;
