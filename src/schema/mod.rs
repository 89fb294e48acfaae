pub mod acts;
pub mod block_specs;
pub mod blocks;
pub mod idea;
pub mod options;
