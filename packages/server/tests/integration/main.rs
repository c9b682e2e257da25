mod firmware;
mod stats;
