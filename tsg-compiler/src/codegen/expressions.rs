// Block, statement and expression lowering.

use super::{CodeGen, CodegenError};
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum};
use inkwell::IntPredicate;
use tsg_ast::*;

impl<'ast, 'ctx> CodeGen<'ast, 'ctx> {
    /// Lower a block. First every nested function declaration captures the
    /// current frame pointer in its member slot; then the statements run in
    /// order. The block's value is the last statement's value.
    pub(crate) fn build_block(
        &mut self,
        block: &Block,
    ) -> Result<Option<BasicValueEnum<'ctx>>, CodegenError> {
        let frame = self
            .frame
            .ok_or(CodegenError::Invariant("no active frame"))?;
        for fid in &block.funcs {
            let binding = self
                .ast
                .func(*fid)
                .decl
                .binding
                .ok_or(CodegenError::Invariant("unresolved function declaration"))?;
            let slot = self.member_ptr(binding.depth, binding.index)?;
            self.builder.build_store(slot, frame)?;
        }

        let mut last = None;
        for stmt in &block.stmts {
            last = Some(self.build_stmt(stmt)?);
        }
        Ok(last)
    }

    fn build_stmt(&mut self, stmt: &Stmt) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        match stmt {
            Stmt::Val { decl, expr } => {
                let value = self.build_expr(expr)?;
                let binding = decl
                    .binding
                    .ok_or(CodegenError::Invariant("unresolved declaration"))?;
                let slot = self.member_ptr(binding.depth, binding.index)?;
                self.builder.build_store(slot, value)?;
                Ok(value)
            }
            Stmt::Expr { expr } => self.build_expr(expr),
        }
    }

    pub(crate) fn build_expr(
        &mut self,
        expr: &Expr,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        match &expr.kind {
            ExprKind::Number { value } => Ok(self
                .context
                .i32_type()
                .const_int(*value as u32 as u64, false)
                .into()),
            ExprKind::Ident { name, binding } => {
                let binding = binding.ok_or(CodegenError::Invariant("unresolved identifier"))?;
                let ty = self.env_type(binding.tyvar)?;
                let slot = self.member_ptr(binding.depth, binding.index)?;
                self.conv_ty(&ty)?;
                Ok(self.builder.build_load(slot, &name.text)?)
            }
            ExprKind::Binary { op, lhs, rhs } => self.build_binary(*op, lhs, rhs),
            ExprKind::IfElse { cond, thn, els } => self.build_ifelse(cond, thn, els),
            ExprKind::Call { callee, args } => self.build_call(callee, args),
        }
    }

    fn build_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let lhs = self.build_expr(lhs)?;
        let rhs = self.build_expr(rhs)?;

        // `==` may compare function values; those are frame pointers
        if op == BinOp::Eq && lhs.is_pointer_value() {
            let i64_type = self.context.i64_type();
            let lhs = self
                .builder
                .build_ptr_to_int(lhs.into_pointer_value(), i64_type, "lhs")?;
            let rhs = self
                .builder
                .build_ptr_to_int(rhs.into_pointer_value(), i64_type, "rhs")?;
            return Ok(self
                .builder
                .build_int_compare(IntPredicate::EQ, lhs, rhs, "eq")?
                .into());
        }

        let lhs = lhs.into_int_value();
        let rhs = rhs.into_int_value();
        let value: BasicValueEnum = match op {
            BinOp::Eq => self
                .builder
                .build_int_compare(IntPredicate::EQ, lhs, rhs, "eq")?
                .into(),
            BinOp::Lt => self
                .builder
                .build_int_compare(IntPredicate::SLT, lhs, rhs, "lt")?
                .into(),
            BinOp::Gt => self
                .builder
                .build_int_compare(IntPredicate::SGT, lhs, rhs, "gt")?
                .into(),
            BinOp::Add => self.builder.build_int_add(lhs, rhs, "add")?.into(),
            BinOp::Sub => self.builder.build_int_sub(lhs, rhs, "sub")?.into(),
            BinOp::Mul => self.builder.build_int_mul(lhs, rhs, "mul")?.into(),
            BinOp::Div => self.builder.build_int_signed_div(lhs, rhs, "div")?.into(),
        };
        Ok(value)
    }

    fn build_ifelse(
        &mut self,
        cond: &Expr,
        thn: &Block,
        els: &Block,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let parent = self
            .builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or(CodegenError::Invariant("no insertion point"))?;
        let then_block = self.context.append_basic_block(parent, "then");
        let else_block = self.context.append_basic_block(parent, "else");
        let merge_block = self.context.append_basic_block(parent, "merge");

        let cond_value = self.build_expr(cond)?.into_int_value();
        self.builder
            .build_conditional_branch(cond_value, then_block, else_block)?;

        self.builder.position_at_end(then_block);
        let then_value = self
            .build_block(thn)?
            .ok_or(CodegenError::Invariant("empty then block"))?;
        self.builder.build_unconditional_branch(merge_block)?;
        let then_end = self
            .builder
            .get_insert_block()
            .ok_or(CodegenError::Invariant("no insertion point"))?;

        self.builder.position_at_end(else_block);
        let else_value = self
            .build_block(els)?
            .ok_or(CodegenError::Invariant("empty else block"))?;
        self.builder.build_unconditional_branch(merge_block)?;
        let else_end = self
            .builder
            .get_insert_block()
            .ok_or(CodegenError::Invariant("no insertion point"))?;

        self.builder.position_at_end(merge_block);
        let phi = self.builder.build_phi(then_value.get_type(), "ifelse")?;
        phi.add_incoming(&[(&then_value, then_end), (&else_value, else_end)]);
        Ok(phi.as_basic_value())
    }

    /// Lower a call: the callee expression's value is the frame pointer
    /// captured when the function was declared; it becomes the leading
    /// static-chain argument of a direct call to the instantiation chosen
    /// by the argument-type tuple.
    fn build_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let chain = self.build_expr(callee)?;

        let mut values = Vec::with_capacity(args.len());
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.build_expr(arg)?);
            let tyvar = arg
                .tyvar
                .ok_or(CodegenError::Invariant("unresolved argument"))?;
            arg_types.push(self.env_type(tyvar)?);
        }

        let callee_tyvar = callee
            .tyvar
            .ok_or(CodegenError::Invariant("unresolved callee"))?;
        let callee_ty = self.env_type(callee_tyvar)?;
        let poly = callee_ty
            .as_poly()
            .ok_or(CodegenError::Invariant("callee is not polymorphic"))?;
        let target_env = poly
            .calls
            .borrow()
            .get(&arg_types)
            .ok_or(CodegenError::Invariant("call site has no instantiation"))?;

        let target = self.fetch_func(poly.func, &target_env)?;

        let mut call_args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(values.len() + 1);
        call_args.push(chain.into());
        for value in values {
            call_args.push(value.into());
        }

        let call = self.builder.build_call(target, &call_args, "call")?;
        call.try_as_basic_value()
            .basic()
            .ok_or(CodegenError::Invariant("call produced no value"))
    }
}
