//! LLVM lowering and JIT execution.
//!
//! One native function is emitted per (source function, argument-type
//! tuple) instantiation, guided by that instantiation's type environment.
//! Each function materializes a frame struct on its stack: slot 0 points at
//! the enclosing function's frame (the static chain), the remaining slots
//! hold the frame members in declaration order. Access to an enclosing
//! binding loads through slot 0 once per depth step.
//!
//! Calls are resolved to a concrete instantiation at compile time via the
//! callee's call-site map; the runtime value of a function name is just the
//! pointer to the frame of the scope that introduced it, which becomes the
//! static-chain argument of the call.

mod expressions;
mod frames;

use crate::types::{TyEnv, Type};
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::targets::{InitializationConfig, Target};
use inkwell::types::StructType;
use inkwell::values::{FunctionValue, PointerValue};
use inkwell::OptimizationLevel;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::OnceLock;
use thiserror::Error;
use tsg_ast::{Ast, FuncId, ROOT_NAME};

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("llvm builder error: {0}")]
    Builder(#[from] inkwell::builder::BuilderError),
    #[error("module verification failed: {0}")]
    Verify(String),
    #[error("jit engine unavailable: {0}")]
    Engine(String),
    #[error("entry function not found: {0}")]
    Entry(String),
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}

/// Identity of a type environment, used to key the memo tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EnvKey(*const TyEnv);

pub(crate) fn env_key(env: &Rc<TyEnv>) -> EnvKey {
    EnvKey(Rc::as_ptr(env))
}

/// One frame on the static chain of the function being emitted, indexed by
/// its depth.
pub(crate) struct FrameScope<'ctx> {
    pub(crate) env: Rc<TyEnv>,
    pub(crate) ty: StructType<'ctx>,
}

pub struct CodeGen<'ast, 'ctx> {
    pub(crate) ast: &'ast Ast,
    pub(crate) context: &'ctx Context,
    pub(crate) module: Module<'ctx>,
    pub(crate) builder: Builder<'ctx>,
    /// Emitted native functions, one per (function, instantiation).
    pub(crate) functions: HashMap<(FuncId, EnvKey), FunctionValue<'ctx>>,
    /// Synthesized frame struct types, one per (function, instantiation).
    pub(crate) frame_types: HashMap<(FuncId, EnvKey), StructType<'ctx>>,
    /// Static chain of the function currently being emitted, outermost
    /// first; the last entry is the function itself.
    pub(crate) scopes: Vec<FrameScope<'ctx>>,
    /// Frame pointer of the function currently being emitted.
    pub(crate) frame: Option<PointerValue<'ctx>>,
}

impl<'ast, 'ctx> CodeGen<'ast, 'ctx> {
    pub fn new(context: &'ctx Context, ast: &'ast Ast, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();

        Self {
            ast,
            context,
            module,
            builder,
            functions: HashMap::new(),
            frame_types: HashMap::new(),
            scopes: Vec::new(),
            frame: None,
        }
    }

    /// Return the native function for an instantiation, emitting it first
    /// if this is the first request.
    pub(crate) fn fetch_func(
        &mut self,
        id: FuncId,
        env: &Rc<TyEnv>,
    ) -> Result<FunctionValue<'ctx>, CodegenError> {
        if let Some(func) = self.functions.get(&(id, env_key(env))) {
            return Ok(*func);
        }
        self.build_func(id, env)
    }

    fn build_func(
        &mut self,
        id: FuncId,
        env: &Rc<TyEnv>,
    ) -> Result<FunctionValue<'ctx>, CodegenError> {
        let func = self.ast.func(id);
        let func_type = env
            .get(func.ftype.ok_or(CodegenError::Invariant("unresolved function"))?)
            .ok_or(CodegenError::Invariant("untyped instantiation"))?;
        let Type::Func(concrete) = &*func_type else {
            return Err(CodegenError::Invariant("instantiation is not a function"));
        };

        // the root function is the JIT entry and takes no static chain
        let chained = func.depth > 0;
        let fn_type = self.conv_func_ty(concrete, chained)?;
        let llvm_func = self
            .module
            .add_function(&func.decl.name.text, fn_type, None);
        self.functions.insert((id, env_key(env)), llvm_func);
        log::debug!("emitting '{}'", func.decl.name.text);

        let saved_block = self.builder.get_insert_block();
        let saved_scopes = std::mem::take(&mut self.scopes);
        let saved_frame = self.frame.take();

        let entry = self.context.append_basic_block(llvm_func, "entry");
        self.builder.position_at_end(entry);

        // frame types of the enclosing instantiations, outermost first
        let mut chain = Vec::new();
        let mut up_func = func.enclosing;
        let mut up_env = env.outer().cloned();
        while let (Some(fid), Some(outer_env)) = (up_func, up_env) {
            up_func = self.ast.func(fid).enclosing;
            up_env = outer_env.outer().cloned();
            chain.push((fid, outer_env));
        }
        chain.reverse();
        for (fid, outer_env) in chain {
            let ty = self.frame_type(fid, &outer_env)?;
            self.scopes.push(FrameScope { env: outer_env, ty });
        }

        let frame_ty = self.frame_type(id, env)?;
        let frame_ptr = self.builder.build_alloca(frame_ty, "frame")?;
        self.scopes.push(FrameScope {
            env: env.clone(),
            ty: frame_ty,
        });
        self.frame = Some(frame_ptr);

        if chained {
            let outer = llvm_func
                .get_nth_param(0)
                .ok_or(CodegenError::Invariant("missing static chain parameter"))?;
            let slot = self.builder.build_struct_gep(frame_ptr, 0, "outer")?;
            self.builder.build_store(slot, outer)?;
        }

        let param_base: u32 = if chained { 1 } else { 0 };
        for (i, decl) in func.params.iter().enumerate() {
            let value = llvm_func
                .get_nth_param(param_base + i as u32)
                .ok_or(CodegenError::Invariant("missing parameter"))?;
            let binding = decl
                .binding
                .ok_or(CodegenError::Invariant("unresolved parameter"))?;
            let slot = self.member_ptr(binding.depth, binding.index)?;
            self.builder.build_store(slot, value)?;
        }

        match self.build_block(&func.body)? {
            Some(value) => self.builder.build_return(Some(&value))?,
            None => self.builder.build_return(None)?,
        };

        self.scopes = saved_scopes;
        self.frame = saved_frame;
        if let Some(block) = saved_block {
            self.builder.position_at_end(block);
        }
        Ok(llvm_func)
    }
}

fn initialize_targets() -> Result<(), CodegenError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();
    INIT.get_or_init(|| Target::initialize_native(&InitializationConfig::default()))
        .clone()
        .map_err(CodegenError::Engine)
}

/// Lower every instantiation reachable from the root environment and run
/// the program, returning its result value.
pub fn run_jit(ast: &Ast, root_env: &Rc<TyEnv>, emit_llvm: bool) -> Result<i32, CodegenError> {
    initialize_targets()?;

    let context = Context::create();
    let mut codegen = CodeGen::new(&context, ast, "tsg_module");
    codegen.fetch_func(ast.root, root_env)?;

    if emit_llvm {
        eprintln!("{}", codegen.module.print_to_string().to_string());
    }
    codegen
        .module
        .verify()
        .map_err(|err| CodegenError::Verify(err.to_string()))?;

    let engine = codegen
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .map_err(|err| CodegenError::Engine(err.to_string()))?;

    type EntryFn = unsafe extern "C" fn() -> i32;
    let entry = unsafe { engine.get_function::<EntryFn>(ROOT_NAME) }
        .map_err(|err| CodegenError::Entry(err.to_string()))?;

    Ok(unsafe { entry.call() })
}
