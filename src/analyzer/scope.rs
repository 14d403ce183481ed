use std::collections::HashMap;
use std::rc::Rc;

use super::{Function, Type, Variable};

/// One level of the symbol table. Lookups walk outwards through the parent chain, so inner
/// bindings hide outer ones.
#[derive(Debug, Default)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    variables: HashMap<String, Rc<Variable>>,
    types: HashMap<String, Type>,
    functions: HashMap<String, Vec<Rc<Function>>>,
    return_type: Option<Type>,
}

impl<'a> Scope<'a> {
    pub fn new(parent: Option<&'a Scope<'a>>, return_type: Option<Type>) -> Self {
        Self {
            parent,
            variables: HashMap::new(),
            types: HashMap::new(),
            functions: HashMap::new(),
            return_type,
        }
    }

    fn chain(&self) -> impl Iterator<Item = &Scope<'a>> {
        std::iter::successors(Some(self), |s| s.parent)
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&Rc<Variable>> {
        self.chain().find_map(|s| s.variables.get(name))
    }

    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.chain().find_map(|s| s.types.get(name))
    }

    /// The overload set of the innermost scope declaring `name`.
    pub fn lookup_functions(&self, name: &str) -> Vec<Rc<Function>> {
        self.chain()
            .find_map(|s| s.functions.get(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Binds `variable` in this scope. Returns the binding it replaced in this same scope, if
    /// any, so the caller can report the redeclaration. Anonymous variables are not bound.
    pub fn add_variable(&mut self, variable: Rc<Variable>) -> Option<Rc<Variable>> {
        let name = variable.name()?.to_string();
        self.variables.insert(name, variable)
    }

    pub fn add_type(&mut self, name: &str, ty: Type) -> Option<Type> {
        self.types.insert(name.to_string(), ty)
    }

    pub fn has_local_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn add_function(&mut self, function: Rc<Function>) {
        self.functions
            .entry(function.name())
            .or_default()
            .push(function);
    }

    /// Return type of the nearest enclosing function body, `None` outside of functions.
    pub fn return_type(&self) -> Option<&Type> {
        self.chain().find_map(|s| s.return_type.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::PointerType;

    fn var(name: &str, ty: Type) -> Rc<Variable> {
        Variable::new(
            PointerType::new(ty, true, Default::default()),
            Some(name.to_string()),
            None,
            false,
        )
    }

    #[test]
    fn inner_bindings_shadow_outer_ones() {
        let mut root = Scope::new(None, None);
        root.add_variable(var("x", Type::INT));
        root.add_variable(var("y", Type::INT));

        let mut inner = Scope::new(Some(&root), Some(Type::Void));
        inner.add_variable(var("x", Type::FLOAT));

        assert_eq!(inner.lookup_variable("x").unwrap().ty(), &Type::FLOAT);
        assert_eq!(inner.lookup_variable("y").unwrap().ty(), &Type::INT);
        assert!(inner.lookup_variable("z").is_none());
    }

    #[test]
    fn redeclaration_replaces_binding() {
        let mut scope = Scope::new(None, None);
        assert!(scope.add_variable(var("x", Type::INT)).is_none());
        let previous = scope.add_variable(var("x", Type::FLOAT));
        assert_eq!(previous.unwrap().ty(), &Type::INT);
        assert_eq!(scope.lookup_variable("x").unwrap().ty(), &Type::FLOAT);
    }

    #[test]
    fn return_type_comes_from_nearest_function_scope() {
        let root = Scope::new(None, None);
        assert!(root.return_type().is_none());
        let function = Scope::new(Some(&root), Some(Type::FLOAT));
        let block = Scope::new(Some(&function), None);
        assert_eq!(block.return_type(), Some(&Type::FLOAT));
    }
}
