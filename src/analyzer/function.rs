use std::rc::Rc;

use crate::parser::Node;

use super::{Access, Type, Variable};

#[derive(Debug)]
pub struct DeclaredFunction {
    pub name: String,
    pub return_type: Type,
    pub parameters: Vec<Rc<Variable>>,
    pub body: Vec<Node>,
}

/// Something callable: a function defined in the shader, or a type used as a constructor.
#[derive(Debug)]
pub enum Function {
    Constructor(Type),
    Declared(DeclaredFunction),
}

impl Function {
    pub fn new_constructor(ty: Type) -> Rc<Self> {
        Rc::new(Function::Constructor(ty))
    }

    pub fn name(&self) -> String {
        match self {
            Function::Constructor(ty) => ty.name(),
            Function::Declared(f) => f.name.clone(),
        }
    }

    pub fn return_type(&self) -> &Type {
        match self {
            Function::Constructor(ty) => ty,
            Function::Declared(f) => &f.return_type,
        }
    }

    /// Constructors of scalars, vectors and matrices take a variable number of arguments
    /// and are checked by counting components instead of by signature.
    pub fn is_builtin_constructor(&self) -> bool {
        matches!(self, Function::Constructor(ty) if !ty.is_struct())
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            Function::Constructor(Type::Struct(st)) => st.fields.len(),
            Function::Constructor(_) => 0,
            Function::Declared(f) => f.parameters.len(),
        }
    }

    pub fn parameter(&self, index: usize) -> Option<(Type, Access)> {
        match self {
            Function::Constructor(Type::Struct(st)) => {
                st.fields.get(index).map(|f| (f.ty.clone(), Access::In))
            }
            Function::Constructor(_) => None,
            Function::Declared(f) => f
                .parameters
                .get(index)
                .map(|p| (p.ty().clone(), p.pointer_type().access())),
        }
    }

    pub fn parameter_types(&self) -> Vec<Type> {
        (0..self.parameter_count())
            .filter_map(|i| self.parameter(i).map(|(ty, _)| ty))
            .collect()
    }

    pub fn as_declared(&self) -> Option<&DeclaredFunction> {
        match self {
            Function::Declared(f) => Some(f),
            Function::Constructor(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchError {
    NoMatch,
    Ambiguous(usize),
}

#[derive(Clone, Debug)]
struct Candidate {
    function: Rc<Function>,
    cost: u32,
}

/// Narrows an overload set down argument by argument, keeping the total implicit
/// conversion cost of every viable candidate.
#[derive(Clone, Debug)]
pub struct FunctionMatcher {
    candidates: Vec<Candidate>,
}

impl FunctionMatcher {
    pub fn new(functions: Vec<Rc<Function>>) -> Self {
        Self {
            candidates: functions
                .into_iter()
                .map(|function| Candidate { function, cost: 0 })
                .collect(),
        }
    }

    pub fn match_n_arguments(&mut self, n: usize) {
        self.candidates
            .retain(|c| c.function.parameter_count() == n);
    }

    pub fn match_argument(&mut self, index: usize, ty: &Type) {
        self.candidates.retain_mut(|c| {
            let Some((param_ty, access)) = c.function.parameter(index) else {
                return false;
            };
            // Values written back to the caller must not need any conversion.
            let cost = if access.writes() {
                (param_ty == *ty).then_some(0)
            } else {
                param_ty.conversion_cost(ty)
            };
            match cost {
                Some(cost) => {
                    c.cost += cost;
                    true
                }
                None => false,
            }
        });
    }

    pub fn has_matches(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// The unique cheapest candidate and its total conversion cost.
    pub fn best_match(&self) -> Result<(Rc<Function>, u32), MatchError> {
        let Some(min) = self.candidates.iter().map(|c| c.cost).min() else {
            return Err(MatchError::NoMatch);
        };
        let mut best = self.candidates.iter().filter(|c| c.cost == min);
        let first = best.next().ok_or(MatchError::NoMatch)?;
        let others = best.count();
        if others > 0 {
            return Err(MatchError::Ambiguous(others + 1));
        }
        Ok((first.function.clone(), first.cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::PointerType;

    fn declared(name: &str, params: &[(Type, Access)]) -> Rc<Function> {
        let parameters = params
            .iter()
            .map(|(ty, access)| {
                Variable::new(
                    PointerType::new(ty.clone(), true, *access),
                    Some("p".to_string()),
                    None,
                    false,
                )
            })
            .collect();
        Rc::new(Function::Declared(DeclaredFunction {
            name: name.to_string(),
            return_type: Type::Void,
            parameters,
            body: vec![],
        }))
    }

    fn resolve(functions: Vec<Rc<Function>>, args: &[Type]) -> Result<(Rc<Function>, u32), MatchError> {
        let mut matcher = FunctionMatcher::new(functions);
        matcher.match_n_arguments(args.len());
        for (i, ty) in args.iter().enumerate() {
            matcher.match_argument(i, ty);
        }
        matcher.best_match()
    }

    #[test]
    fn exact_match_wins_over_promotion() {
        let f_int = declared("f", &[(Type::INT, Access::Default)]);
        let f_float = declared("f", &[(Type::FLOAT, Access::Default)]);
        let (best, cost) = resolve(vec![f_float, f_int.clone()], &[Type::INT]).unwrap();
        assert!(Rc::ptr_eq(&best, &f_int));
        assert_eq!(cost, 0);
    }

    #[test]
    fn promotion_is_a_match_with_one_conversion() {
        let f_float = declared("f", &[(Type::FLOAT, Access::Default)]);
        let (best, cost) = resolve(vec![f_float.clone()], &[Type::INT]).unwrap();
        assert!(Rc::ptr_eq(&best, &f_float));
        assert_eq!(cost, 1);
    }

    #[test]
    fn ties_are_ambiguous() {
        let f1 = declared("f", &[(Type::FLOAT, Access::Default), (Type::INT, Access::Default)]);
        let f2 = declared("f", &[(Type::INT, Access::Default), (Type::FLOAT, Access::Default)]);
        assert_eq!(
            resolve(vec![f1, f2], &[Type::INT, Type::INT]).unwrap_err(),
            MatchError::Ambiguous(2)
        );
    }

    #[test]
    fn arity_and_out_parameters_filter_candidates() {
        let f = declared("f", &[(Type::FLOAT, Access::Out)]);
        assert_eq!(resolve(vec![f.clone()], &[]).unwrap_err(), MatchError::NoMatch);
        assert_eq!(resolve(vec![f.clone()], &[Type::INT]).unwrap_err(), MatchError::NoMatch);
        assert!(resolve(vec![f], &[Type::FLOAT]).is_ok());
    }

    #[test]
    fn struct_constructor_parameters_are_fields() {
        let st = Type::new_struct(
            Some("S".to_string()),
            vec![crate::analyzer::Field { name: "a".to_string(), ty: Type::FLOAT }],
        );
        let constructor = Function::new_constructor(st.clone());
        assert!(!constructor.is_builtin_constructor());
        assert_eq!(constructor.parameter_types(), vec![Type::FLOAT]);
        let (best, cost) = resolve(vec![constructor], &[Type::INT]).unwrap();
        assert_eq!(best.return_type(), &st);
        assert_eq!(cost, 1);
        assert!(Function::new_constructor(Type::FLOAT).is_builtin_constructor());
    }
}
