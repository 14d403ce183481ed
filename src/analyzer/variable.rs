use std::rc::Rc;

use super::{PointerType, Type, Value};

/// A named storage location. Shared between the declaring statement, the scope it lives in
/// and every expression reading it.
#[derive(Debug)]
pub struct Variable {
    ty: PointerType,
    name: Option<String>,
    initial: Option<Value>,
    is_const: bool,
}

impl Variable {
    pub fn new(
        ty: PointerType,
        name: Option<String>,
        initial: Option<Value>,
        is_const: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            ty,
            name,
            initial,
            is_const,
        })
    }

    pub fn pointer_type(&self) -> &PointerType {
        &self.ty
    }

    pub fn ty(&self) -> &Type {
        self.ty.ty()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The constant the variable is initialized with, baked into its declaration.
    pub fn initial_value(&self) -> Option<&Value> {
        self.initial.as_ref()
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// Value of reads when it is known at compile time.
    pub fn constant_value(&self) -> Option<&Value> {
        if self.is_const {
            self.initial.as_ref()
        } else {
            None
        }
    }

    pub fn print(&self) -> String {
        self.print_declared(&self.ty.ty().to_string())
    }

    /// The declaration with its type spelled as `ty`, like a struct definition.
    pub fn print_declared(&self, ty: &str) -> String {
        let mut s = String::new();
        if self.is_const {
            s.push_str("const ");
        }
        if let Some(keyword) = self.ty.access().keyword() {
            s.push_str(keyword);
            s.push(' ');
        }
        s.push_str(ty);
        if let Some(name) = &self.name {
            s.push(' ');
            s.push_str(name);
        }
        s
    }
}
