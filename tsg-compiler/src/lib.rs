//! The tsg compiler core: semantic type model, name resolution, the
//! monomorphizing type inferencer and the LLVM lowering/JIT backend.
//!
//! Pipeline: `tsg_parser::parse` builds the AST, [`resolve`] binds names and
//! allocates type variables in place, [`verify`] instantiates functions per
//! call-site argument tuple and returns the root type environment, and
//! [`run_jit`] lowers every instantiation to native code and executes the
//! program.

pub mod codegen;
pub mod resolver;
pub mod types;
pub mod verifier;

pub use codegen::{run_jit, CodegenError};
pub use resolver::resolve;
pub use types::{CallMap, FuncType, PolyType, TyEnv, Type};
pub use verifier::verify;
