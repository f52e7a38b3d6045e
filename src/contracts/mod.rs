//! Contract and program bindings
//!
//! - [`erc20`] and [`portal`]: Alloy-generated bindings for the EVM side
//! - [`svm`]: account layouts, PDAs and instruction builders for the SVM side

pub mod erc20;
pub mod portal;
pub mod svm;
