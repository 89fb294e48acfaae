pub mod acts;
pub mod audit;
pub mod blocks;
pub mod idea;
pub mod pipeline;
pub mod policy;
pub mod rng;
pub mod session;
pub mod template;
pub mod variants;
