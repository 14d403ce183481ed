use std::collections::HashMap;
use std::rc::Rc;

use log::trace;
use spirv::{Capability, Op, StorageClass, Word};

use crate::analyzer::{Component, Function, Scalar, Storage, Type, Value, Variable};

const SPIRV_VERSION: Word = 0x0001_0000;
const GENERATOR: Word = 0;

/// Where an instruction ends up in the module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    /// Entry points and execution modes.
    Header,
    Debug,
    Decorate,
    /// Types, constants and global variables.
    Define,
    /// Start of the function being written: `OpFunction`, its parameters, the first label
    /// and all of its `OpVariable`s.
    Declare,
    /// Body of the function being written.
    Code,
}

const SECTION_COUNT: usize = 6;

impl Section {
    fn index(self) -> usize {
        self as usize
    }
}

pub fn storage_class(storage: Storage) -> StorageClass {
    match storage {
        Storage::Function => StorageClass::Function,
        Storage::Private => StorageClass::Private,
        Storage::Input => StorageClass::Input,
        Storage::Output => StorageClass::Output,
    }
}

/// Encodes a literal string: nul terminated, padded to a whole word, little endian.
fn string_words(s: &str) -> Vec<Word> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Assembles a SPIR-V module section by section, handing out ids and memoizing everything
/// that must only be declared once.
#[derive(Debug)]
pub struct SpvWriter {
    next_id: Word,
    sections: [Vec<Word>; SECTION_COUNT],
    functions: Vec<Word>,
    current_block: Word,
    uses_float64: bool,
    types: HashMap<Type, Word>,
    pointer_types: HashMap<(Type, StorageClass), Word>,
    function_types: HashMap<Vec<Word>, Word>,
    constants: HashMap<(Type, Vec<u64>), Word>,
    variables: HashMap<*const Variable, (Rc<Variable>, Word)>,
    function_ids: HashMap<*const Function, (Rc<Function>, Word)>,
}

impl Default for SpvWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpvWriter {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            sections: Default::default(),
            functions: vec![],
            current_block: 0,
            uses_float64: false,
            types: HashMap::new(),
            pointer_types: HashMap::new(),
            function_types: HashMap::new(),
            constants: HashMap::new(),
            variables: HashMap::new(),
            function_ids: HashMap::new(),
        }
    }

    pub fn next_id(&mut self) -> Word {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add(&mut self, section: Section, op: Op, operands: &[Word]) {
        let words = &mut self.sections[section.index()];
        words.push(((operands.len() as Word + 1) << 16) | op as Word);
        words.extend_from_slice(operands);
    }

    /// Adds an instruction with a result type to the code section and returns its result.
    pub fn add_code(&mut self, op: Op, result_type: Word, operands: &[Word]) -> Word {
        let id = self.next_id();
        let mut words = Vec::with_capacity(operands.len() + 2);
        words.push(result_type);
        words.push(id);
        words.extend_from_slice(operands);
        self.add(Section::Code, op, &words);
        id
    }

    pub fn add_name(&mut self, id: Word, name: &str) {
        let mut operands = vec![id];
        operands.extend(string_words(name));
        self.add(Section::Debug, Op::Name, &operands);
    }

    pub fn add_entry_point(&mut self, model: spirv::ExecutionModel, id: Word, interface: &[Word]) {
        let mut operands = vec![model as Word, id];
        operands.extend(string_words("main"));
        operands.extend_from_slice(interface);
        self.add(Section::Header, Op::EntryPoint, &operands);
    }

    /// Label of the block instructions currently go to.
    pub fn current_block(&self) -> Word {
        self.current_block
    }

    /// Starts a new block. The first block of a function is declared, later ones are code.
    pub fn start_block(&mut self, section: Section, label: Word) {
        self.add(section, Op::Label, &[label]);
        self.current_block = label;
    }

    /// Moves the function that was just written out of the way of the next one.
    pub fn commit_function(&mut self) {
        let declare = std::mem::take(&mut self.sections[Section::Declare.index()]);
        let code = std::mem::take(&mut self.sections[Section::Code.index()]);
        self.functions.extend(declare);
        self.functions.extend(code);
        self.current_block = 0;
    }

    pub fn id_for_type(&mut self, ty: &Type) -> Word {
        if let Some(id) = self.types.get(ty) {
            return *id;
        }

        let operands = match ty {
            Type::Void => vec![],
            Type::Scalar(Scalar::Bool) => vec![],
            Type::Scalar(Scalar::Int) => vec![32, 1],
            Type::Scalar(Scalar::Uint) => vec![32, 0],
            Type::Scalar(Scalar::Float) => vec![32],
            Type::Scalar(Scalar::Double) => {
                self.uses_float64 = true;
                vec![64]
            }
            Type::Vector(s, n) => vec![self.id_for_type(&Type::Scalar(*s)), *n],
            Type::Matrix(s, c, r) => vec![self.id_for_type(&Type::Vector(*s, *r)), *c],
            Type::Struct(st) => st.fields.iter().map(|f| self.id_for_type(&f.ty)).collect(),
        };
        let op = match ty {
            Type::Void => Op::TypeVoid,
            Type::Scalar(Scalar::Bool) => Op::TypeBool,
            Type::Scalar(Scalar::Int | Scalar::Uint) => Op::TypeInt,
            Type::Scalar(Scalar::Float | Scalar::Double) => Op::TypeFloat,
            Type::Vector(_, _) => Op::TypeVector,
            Type::Matrix(_, _, _) => Op::TypeMatrix,
            Type::Struct(_) => Op::TypeStruct,
        };

        let id = self.next_id();
        let mut words = vec![id];
        words.extend(operands);
        self.add(Section::Define, op, &words);

        if let Type::Struct(st) = ty {
            if let Some(name) = &st.name {
                self.add_name(id, name);
            }
            for (i, field) in st.fields.iter().enumerate() {
                let mut operands = vec![id, i as Word];
                operands.extend(string_words(&field.name));
                self.add(Section::Debug, Op::MemberName, &operands);
            }
        }

        trace!("type {} = %{}", ty, id);
        self.types.insert(ty.clone(), id);
        id
    }

    pub fn id_for_pointer_type(&mut self, ty: &Type, class: StorageClass) -> Word {
        let key = (ty.clone(), class);
        if let Some(id) = self.pointer_types.get(&key) {
            return *id;
        }
        let pointee = self.id_for_type(ty);
        let id = self.next_id();
        self.add(Section::Define, Op::TypePointer, &[id, class as Word, pointee]);
        self.pointer_types.insert(key, id);
        id
    }

    /// Function type from the ids of the return type and the parameter types.
    pub fn id_for_function_type(&mut self, return_type: Word, parameters: &[Word]) -> Word {
        let mut key = vec![return_type];
        key.extend_from_slice(parameters);
        if let Some(id) = self.function_types.get(&key) {
            return *id;
        }
        let id = self.next_id();
        let mut words = vec![id];
        words.extend_from_slice(&key);
        self.add(Section::Define, Op::TypeFunction, &words);
        self.function_types.insert(key, id);
        id
    }

    pub fn id_for_value(&mut self, value: &Value) -> Word {
        let ty = value.ty().clone();
        let key = (
            ty.clone(),
            value.components().iter().map(|c| c.bits()).collect(),
        );
        if let Some(id) = self.constants.get(&key) {
            return *id;
        }

        let type_id = self.id_for_type(&ty);
        let id = match &ty {
            Type::Scalar(_) => {
                let id = self.next_id();
                match value.components()[0] {
                    Component::Bool(true) => {
                        self.add(Section::Define, Op::ConstantTrue, &[type_id, id])
                    }
                    Component::Bool(false) => {
                        self.add(Section::Define, Op::ConstantFalse, &[type_id, id])
                    }
                    Component::Double(d) => {
                        let bits = d.to_bits();
                        let words = [type_id, id, bits as Word, (bits >> 32) as Word];
                        self.add(Section::Define, Op::Constant, &words)
                    }
                    c => self.add(Section::Define, Op::Constant, &[type_id, id, c.bits() as Word]),
                }
                id
            }
            _ => {
                let parts: Vec<_> = (0..ty.length() as usize)
                    .filter_map(|i| value.extract(i))
                    .map(|part| self.id_for_value(&part))
                    .collect();
                let id = self.next_id();
                let mut words = vec![type_id, id];
                words.extend(parts);
                self.add(Section::Define, Op::ConstantComposite, &words);
                id
            }
        };

        self.constants.insert(key, id);
        id
    }

    pub fn id_for_component(&mut self, component: Component) -> Word {
        self.id_for_value(&Value::from_component(component))
    }

    /// The variable's id, declaring it on first use. Globals are declared with the module,
    /// locals at the start of the function being written.
    pub fn id_for_variable(&mut self, variable: &Rc<Variable>) -> Word {
        let key = Rc::as_ptr(variable);
        if let Some((_, id)) = self.variables.get(&key) {
            return *id;
        }

        let storage = variable.pointer_type().storage();
        let class = storage_class(storage);
        let pointer = self.id_for_pointer_type(variable.ty(), class);
        let initializer = variable.initial_value().map(|v| self.id_for_value(v));

        let id = self.next_id();
        let mut words = vec![pointer, id, class as Word];
        words.extend(initializer);
        let section = if storage.is_global() {
            Section::Define
        } else {
            Section::Declare
        };
        self.add(section, Op::Variable, &words);
        if let Some(name) = variable.name() {
            self.add_name(id, name);
        }

        trace!("variable {:?} = %{}", variable.name(), id);
        self.variables.insert(key, (variable.clone(), id));
        id
    }

    /// Binds a variable to an id that was declared some other way, like a parameter.
    pub fn set_id_for_variable(&mut self, variable: &Rc<Variable>, id: Word) {
        self.variables
            .insert(Rc::as_ptr(variable), (variable.clone(), id));
    }

    pub fn id_for_function(&mut self, function: &Rc<Function>) -> Word {
        let key = Rc::as_ptr(function);
        if let Some((_, id)) = self.function_ids.get(&key) {
            return *id;
        }
        let id = self.next_id();
        self.function_ids.insert(key, (function.clone(), id));
        id
    }

    /// A fresh function local variable, unnamed.
    pub fn declare_temporary(&mut self, ty: &Type) -> Word {
        let pointer = self.id_for_pointer_type(ty, StorageClass::Function);
        let id = self.next_id();
        self.add(
            Section::Declare,
            Op::Variable,
            &[pointer, id, StorageClass::Function as Word],
        );
        id
    }

    /// The finished module.
    pub fn finish(mut self) -> Vec<Word> {
        self.commit_function();

        let mut words = vec![spirv::MAGIC_NUMBER, SPIRV_VERSION, GENERATOR, self.next_id, 0];
        let mut preamble = SpvWriter::new();
        preamble.add(Section::Header, Op::Capability, &[Capability::Shader as Word]);
        if self.uses_float64 {
            preamble.add(Section::Header, Op::Capability, &[Capability::Float64 as Word]);
        }
        preamble.add(
            Section::Header,
            Op::MemoryModel,
            &[
                spirv::AddressingModel::Logical as Word,
                spirv::MemoryModel::GLSL450 as Word,
            ],
        );
        words.extend(&preamble.sections[Section::Header.index()]);

        for section in [
            Section::Header,
            Section::Debug,
            Section::Decorate,
            Section::Define,
        ] {
            words.extend(&self.sections[section.index()]);
        }
        words.extend(self.functions);
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Access, PointerType};

    #[test]
    fn strings_are_padded_and_terminated() {
        assert_eq!(string_words("main"), vec![0x6e69_616d, 0]);
        assert_eq!(string_words("abc"), vec![0x0063_6261]);
    }

    #[test]
    fn types_and_constants_are_declared_once() {
        let mut w = SpvWriter::new();
        let vec3 = Type::Vector(Scalar::Float, 3);
        let a = w.id_for_type(&vec3);
        let b = w.id_for_type(&vec3);
        assert_eq!(a, b);
        assert_ne!(w.id_for_type(&Type::FLOAT), a);

        let one = w.id_for_component(Component::Float(1.0));
        assert_eq!(w.id_for_component(Component::Float(1.0)), one);
        assert_ne!(w.id_for_component(Component::Int(1)), one);
        let zero = w.id_for_component(Component::Float(0.0));
        assert_ne!(w.id_for_component(Component::Float(-0.0)), zero);
    }

    #[test]
    fn variables_are_declared_once() {
        let mut w = SpvWriter::new();
        let variable = Variable::new(
            PointerType::new(Type::INT, true, Access::Default).with_storage(Storage::Private),
            Some("x".to_string()),
            None,
            false,
        );
        let id = w.id_for_variable(&variable);
        assert_eq!(w.id_for_variable(&variable), id);

        let other = Variable::new(
            PointerType::new(Type::INT, true, Access::Default).with_storage(Storage::Private),
            Some("x".to_string()),
            None,
            false,
        );
        assert_ne!(w.id_for_variable(&other), id);
    }

    #[test]
    fn module_header() {
        let mut w = SpvWriter::new();
        w.id_for_type(&Type::DOUBLE);
        let words = w.finish();
        assert_eq!(words[0], spirv::MAGIC_NUMBER);
        assert_eq!(words[1], SPIRV_VERSION);
        assert_eq!(words[3], 2);
        // OpCapability Shader, OpCapability Float64
        assert_eq!(words[5], (2 << 16) | Op::Capability as Word);
        assert_eq!(words[6], Capability::Shader as Word);
        assert_eq!(words[8], Capability::Float64 as Word);
    }
}
