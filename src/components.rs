pub mod adder;
pub mod mux;
pub mod parity;
