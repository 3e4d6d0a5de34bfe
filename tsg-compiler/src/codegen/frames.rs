// Frame struct synthesis, type conversion and static-chain resolution.

use super::{env_key, CodeGen, CodegenError};
use crate::types::{FuncType, TyEnv, Type};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, StructType};
use inkwell::values::PointerValue;
use inkwell::AddressSpace;
use std::rc::Rc;
use tsg_ast::{FuncId, TyVar};

impl<'ast, 'ctx> CodeGen<'ast, 'ctx> {
    /// Native representation of a semantic type. A `Poly` value at runtime
    /// is the pointer to the frame that introduced the function; a `Func`
    /// value is a function pointer. Pending types never survive
    /// verification of a runnable program.
    pub(crate) fn conv_ty(&self, ty: &Type) -> Result<BasicTypeEnum<'ctx>, CodegenError> {
        Ok(match ty {
            Type::Bool => self.context.bool_type().into(),
            Type::Int => self.context.i32_type().into(),
            Type::Func(_) | Type::Poly(_) => {
                self.context.i8_type().ptr_type(AddressSpace::default()).into()
            }
            Type::Pend => {
                return Err(CodegenError::Invariant("pending type reached lowering"))
            }
        })
    }

    /// Native signature of an instantiation. `static_chain` adds the
    /// leading outer-frame pointer parameter.
    pub(crate) fn conv_func_ty(
        &self,
        func: &FuncType,
        static_chain: bool,
    ) -> Result<FunctionType<'ctx>, CodegenError> {
        let ret = self.conv_ty(&func.ret.borrow())?;

        let mut params: Vec<BasicMetadataTypeEnum> = Vec::with_capacity(func.params.len() + 1);
        if static_chain {
            params.push(self.context.i8_type().ptr_type(AddressSpace::default()).into());
        }
        for param in &func.params {
            params.push(self.conv_ty(param)?.into());
        }
        Ok(ret.fn_type(&params, false))
    }

    /// The frame struct of one instantiation: slot 0 is the outer-frame
    /// pointer, slots 1..N are the members in declaration order. Frame
    /// layouts may differ between instantiations of the same function.
    pub(crate) fn frame_type(
        &mut self,
        id: FuncId,
        env: &Rc<TyEnv>,
    ) -> Result<StructType<'ctx>, CodegenError> {
        let key = (id, env_key(env));
        if let Some(ty) = self.frame_types.get(&key) {
            return Ok(*ty);
        }

        let func = self.ast.func(id);
        let mut fields: Vec<BasicTypeEnum> = Vec::with_capacity(func.frame.members.len() + 1);
        fields.push(self.context.i8_type().ptr_type(AddressSpace::default()).into());
        for member in &func.frame.members {
            let ty = env
                .get(member.tyvar)
                .ok_or(CodegenError::Invariant("untyped frame member"))?;
            fields.push(self.conv_ty(&ty)?);
        }

        let ty = self.context.struct_type(&fields, false);
        self.frame_types.insert(key, ty);
        Ok(ty)
    }

    /// Address of the member at `(depth, index)`: follow the static chain
    /// from the current frame while the target frame is shallower, then
    /// index past the chain slot.
    pub(crate) fn member_ptr(
        &mut self,
        depth: u32,
        index: u32,
    ) -> Result<PointerValue<'ctx>, CodegenError> {
        let mut frame = self
            .frame
            .ok_or(CodegenError::Invariant("no active frame"))?;
        let mut current = (self.scopes.len() - 1) as u32;

        while depth < current {
            let slot = self.builder.build_struct_gep(frame, 0, "outer")?;
            frame = self
                .builder
                .build_load(slot, "chain")?
                .into_pointer_value();
            current -= 1;
        }

        Ok(self.builder.build_struct_gep(frame, index + 1, "member")?)
    }

    /// Type recorded for `tyvar` in the environment of the function being
    /// emitted (walking out to enclosing instantiations as needed).
    pub(crate) fn env_type(&self, tyvar: TyVar) -> Result<Rc<Type>, CodegenError> {
        self.scopes
            .last()
            .ok_or(CodegenError::Invariant("no active environment"))?
            .env
            .get(tyvar)
            .ok_or(CodegenError::Invariant("unbound type variable"))
    }
}
