//! Host symbol model.
//!
//! The analyzer never resolves symbols itself. The host hands it a
//! [`TypeEnv`] that answers identity-based queries over already-resolved type
//! definitions. [`TypeStore`] is a small in-memory implementation used by
//! embedders that do not have their own arena, and by tests.

use crate::syntax::Stmt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod well_known {
    //! Metadata names of framework types the analyzer reasons about.

    pub const IENUMERABLE: &str = "System.Collections.Generic.IEnumerable";
    pub const ICOLLECTION: &str = "System.Collections.Generic.ICollection";
    pub const IREADONLY_COLLECTION: &str = "System.Collections.Generic.IReadOnlyCollection";
    pub const ILIST: &str = "System.Collections.Generic.IList";
    pub const IREADONLY_LIST: &str = "System.Collections.Generic.IReadOnlyList";
    pub const LIST: &str = "System.Collections.Generic.List";
    pub const ISET: &str = "System.Collections.Generic.ISet";
    pub const HASH_SET: &str = "System.Collections.Generic.HashSet";
    pub const SORTED_SET: &str = "System.Collections.Generic.SortedSet";
    pub const STACK: &str = "System.Collections.Generic.Stack";
    pub const QUEUE: &str = "System.Collections.Generic.Queue";
    pub const LINKED_LIST: &str = "System.Collections.Generic.LinkedList";
    pub const DICTIONARY: &str = "System.Collections.Generic.Dictionary";
    pub const IDICTIONARY: &str = "System.Collections.Generic.IDictionary";
    pub const IREADONLY_DICTIONARY: &str = "System.Collections.Generic.IReadOnlyDictionary";
    pub const KEY_VALUE_PAIR: &str = "System.Collections.Generic.KeyValuePair";
    pub const COLLECTION: &str = "System.Collections.ObjectModel.Collection";
    pub const OBSERVABLE_COLLECTION: &str = "System.Collections.ObjectModel.ObservableCollection";
    pub const NULLABLE: &str = "System.Nullable";

    pub(crate) const INTERFACES: &[&str] = &[
        IENUMERABLE,
        ICOLLECTION,
        IREADONLY_COLLECTION,
        ILIST,
        IREADONLY_LIST,
        ISET,
        IDICTIONARY,
        IREADONLY_DICTIONARY,
    ];

    pub(crate) const DICTIONARIES: &[&str] = &[DICTIONARY, IDICTIONARY, IREADONLY_DICTIONARY];

    /// Generic collection definitions whose single type argument (or key/value
    /// pair, for dictionaries) is enumerated.
    pub(crate) const COLLECTIONS: &[&str] = &[
        ICOLLECTION,
        IREADONLY_COLLECTION,
        ILIST,
        IREADONLY_LIST,
        LIST,
        ISET,
        HASH_SET,
        SORTED_SET,
        STACK,
        QUEUE,
        LINKED_LIST,
        COLLECTION,
        OBSERVABLE_COLLECTION,
        DICTIONARY,
        IDICTIONARY,
        IREADONLY_DICTIONARY,
    ];
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Built-in types with dedicated conversion semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpecialType {
    Object,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    String,
    DateTime,
    DateTimeOffset,
    DateOnly,
    TimeOnly,
    TimeSpan,
    Guid,
}

impl SpecialType {
    pub const ALL: [SpecialType; 21] = [
        SpecialType::Object,
        SpecialType::Boolean,
        SpecialType::Char,
        SpecialType::SByte,
        SpecialType::Byte,
        SpecialType::Int16,
        SpecialType::UInt16,
        SpecialType::Int32,
        SpecialType::UInt32,
        SpecialType::Int64,
        SpecialType::UInt64,
        SpecialType::Single,
        SpecialType::Double,
        SpecialType::Decimal,
        SpecialType::String,
        SpecialType::DateTime,
        SpecialType::DateTimeOffset,
        SpecialType::DateOnly,
        SpecialType::TimeOnly,
        SpecialType::TimeSpan,
        SpecialType::Guid,
    ];

    pub fn metadata_name(self) -> &'static str {
        match self {
            SpecialType::Object => "System.Object",
            SpecialType::Boolean => "System.Boolean",
            SpecialType::Char => "System.Char",
            SpecialType::SByte => "System.SByte",
            SpecialType::Byte => "System.Byte",
            SpecialType::Int16 => "System.Int16",
            SpecialType::UInt16 => "System.UInt16",
            SpecialType::Int32 => "System.Int32",
            SpecialType::UInt32 => "System.UInt32",
            SpecialType::Int64 => "System.Int64",
            SpecialType::UInt64 => "System.UInt64",
            SpecialType::Single => "System.Single",
            SpecialType::Double => "System.Double",
            SpecialType::Decimal => "System.Decimal",
            SpecialType::String => "System.String",
            SpecialType::DateTime => "System.DateTime",
            SpecialType::DateTimeOffset => "System.DateTimeOffset",
            SpecialType::DateOnly => "System.DateOnly",
            SpecialType::TimeOnly => "System.TimeOnly",
            SpecialType::TimeSpan => "System.TimeSpan",
            SpecialType::Guid => "System.Guid",
        }
    }

    /// Name as written in C# source (`int`, `string`, `DateTime`).
    pub fn keyword(self) -> &'static str {
        match self {
            SpecialType::Object => "object",
            SpecialType::Boolean => "bool",
            SpecialType::Char => "char",
            SpecialType::SByte => "sbyte",
            SpecialType::Byte => "byte",
            SpecialType::Int16 => "short",
            SpecialType::UInt16 => "ushort",
            SpecialType::Int32 => "int",
            SpecialType::UInt32 => "uint",
            SpecialType::Int64 => "long",
            SpecialType::UInt64 => "ulong",
            SpecialType::Single => "float",
            SpecialType::Double => "double",
            SpecialType::Decimal => "decimal",
            SpecialType::String => "string",
            SpecialType::DateTime => "DateTime",
            SpecialType::DateTimeOffset => "DateTimeOffset",
            SpecialType::DateOnly => "DateOnly",
            SpecialType::TimeOnly => "TimeOnly",
            SpecialType::TimeSpan => "TimeSpan",
            SpecialType::Guid => "Guid",
        }
    }

    pub fn from_metadata_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.metadata_name() == name)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            SpecialType::SByte
                | SpecialType::Byte
                | SpecialType::Int16
                | SpecialType::UInt16
                | SpecialType::Int32
                | SpecialType::UInt32
                | SpecialType::Int64
                | SpecialType::UInt64
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral()
            || matches!(
                self,
                SpecialType::Single | SpecialType::Double | SpecialType::Decimal
            )
    }

    pub fn is_value_type(self) -> bool {
        !matches!(self, SpecialType::Object | SpecialType::String)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Array,
    /// `System.Nullable<T>`; the underlying type is the single type argument.
    Nullable,
}

/// A use of a type, carrying the nullable-reference annotation (`string?`)
/// that is not part of the type's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub id: TypeId,
    pub annotated_nullable: bool,
}

impl TypeRef {
    pub fn new(id: TypeId) -> Self {
        Self {
            id,
            annotated_nullable: false,
        }
    }

    pub fn nullable(id: TypeId) -> Self {
        Self {
            id,
            annotated_nullable: true,
        }
    }
}

impl From<TypeId> for TypeRef {
    fn from(id: TypeId) -> Self {
        TypeRef::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    pub name: String,
    pub ty: TypeRef,
    pub kind: MemberKind,
    pub is_static: bool,
    pub has_getter: bool,
    /// Accessible setter or `init` accessor; for fields, "not readonly".
    pub has_setter: bool,
    pub is_required: bool,
    /// Filled in by [`TypeStore::add_member`].
    pub declaring_type: Option<TypeId>,
}

impl MemberDef {
    pub fn property(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            kind: MemberKind::Property,
            is_static: false,
            has_getter: true,
            has_setter: true,
            is_required: false,
            declaring_type: None,
        }
    }

    pub fn field(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            kind: MemberKind::Field,
            ..Self::property(name, ty)
        }
    }

    pub fn get_only(mut self) -> Self {
        self.has_setter = false;
        self
    }

    pub fn set_only(mut self) -> Self {
        self.has_getter = false;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<ParamDef>,
    pub return_type: Option<TypeRef>,
    pub is_static: bool,
    /// Statement body, when the host could lower it into the closed grammar.
    pub body: Option<Vec<Stmt>>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            is_static: false,
            body: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.params.push(ParamDef {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn returns(mut self, ty: impl Into<TypeRef>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    pub fn body(mut self, body: Vec<Stmt>) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Fully-qualified name; the type's identity.
    pub name: String,
    pub kind: TypeKind,
    pub special: Option<SpecialType>,
    /// For constructed generics: the definition's metadata name without arity,
    /// e.g. `System.Collections.Generic.List`.
    pub generic_definition: Option<String>,
    /// Generic arguments, array element, or nullable underlying type.
    pub type_args: Vec<TypeId>,
    pub enum_underlying: Option<SpecialType>,
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub members: Vec<MemberDef>,
    pub methods: Vec<MethodDef>,
    pub is_abstract: bool,
}

impl TypeDef {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            special: None,
            generic_definition: None,
            type_args: Vec::new(),
            enum_underlying: None,
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            methods: Vec::new(),
            is_abstract: false,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Struct)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    pub fn enumeration(name: impl Into<String>, underlying: SpecialType) -> Self {
        Self {
            enum_underlying: Some(underlying),
            ..Self::with_kind(name, TypeKind::Enum)
        }
    }

    pub fn with_base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interface(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Name without namespace, e.g. `Order` for `Shop.Orders.Order`.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn is_value_type(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Struct | TypeKind::Enum | TypeKind::Nullable
        )
    }

    /// Single-argument view used for arrays and `Nullable<T>`.
    pub fn element(&self) -> Option<TypeId> {
        match self.kind {
            TypeKind::Array | TypeKind::Nullable => self.type_args.first().copied(),
            _ => None,
        }
    }
}

/// Strip namespace and generic argument list from a metadata name.
pub fn simple_name(name: &str) -> &str {
    let head = name.split('<').next().unwrap_or(name);
    head.rsplit('.').next().unwrap_or(head)
}

/// Query interface over resolved types.
///
/// In a compiler host this is backed by the semantic model; [`TypeStore`] is
/// the in-memory implementation.
pub trait TypeEnv: Sync {
    fn type_def(&self, id: TypeId) -> Option<&TypeDef>;

    /// Resolve a type by fully-qualified name, or by simple name when that is
    /// unambiguous.
    fn lookup(&self, name: &str) -> Option<TypeId>;

    /// C# display form of a type, e.g. `List<string>`, `int?`, `Order[]`.
    fn display(&self, id: TypeId) -> String {
        display_type(self, id, 0)
    }

    fn display_ref(&self, ty: TypeRef) -> String {
        let mut out = self.display(ty.id);
        let is_reference = self
            .type_def(ty.id)
            .map(|def| !def.is_value_type())
            .unwrap_or(false);
        if ty.annotated_nullable && is_reference {
            out.push('?');
        }
        out
    }
}

const MAX_DISPLAY_DEPTH: usize = 16;

fn display_type<E: TypeEnv + ?Sized>(env: &E, id: TypeId, depth: usize) -> String {
    let Some(def) = env.type_def(id) else {
        return "?".to_string();
    };
    if depth > MAX_DISPLAY_DEPTH {
        return def.simple_name().to_string();
    }
    if let Some(special) = def.special {
        return special.keyword().to_string();
    }
    match def.kind {
        TypeKind::Array => match def.element() {
            Some(element) => format!("{}[]", display_type(env, element, depth + 1)),
            None => def.simple_name().to_string(),
        },
        TypeKind::Nullable => match def.element() {
            Some(underlying) => format!("{}?", display_type(env, underlying, depth + 1)),
            None => def.simple_name().to_string(),
        },
        _ => match &def.generic_definition {
            Some(definition) => {
                let args: Vec<String> = def
                    .type_args
                    .iter()
                    .map(|arg| display_type(env, *arg, depth + 1))
                    .collect();
                format!("{}<{}>", simple_name(definition), args.join(", "))
            }
            None => def.simple_name().to_string(),
        },
    }
}

/// In-memory type arena.
#[derive(Debug, Clone, Default)]
pub struct TypeStore {
    types: Vec<TypeDef>,
    by_name: HashMap<String, TypeId>,
    by_simple_name: HashMap<String, Vec<TypeId>>,
}

impl TypeStore {
    /// A store pre-populated with every [`SpecialType`].
    pub fn new() -> Self {
        let mut store = Self::default();
        for special in SpecialType::ALL {
            let kind = if special.is_value_type() {
                TypeKind::Struct
            } else {
                TypeKind::Class
            };
            let mut def = TypeDef::with_kind(special.metadata_name(), kind);
            def.special = Some(special);
            store.add_type(def);
        }
        // `string` is an `IEnumerable<char>`; the shape extractor has to exclude it.
        let char_ty = store.special(SpecialType::Char);
        let enumerable = store.generic(well_known::IENUMERABLE, &[char_ty]);
        let string_ty = store.special(SpecialType::String);
        if let Some(def) = store.type_def_mut(string_ty) {
            def.interfaces.push(enumerable);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Insert a type, replacing any existing definition with the same name.
    pub fn add_type(&mut self, def: TypeDef) -> TypeId {
        if let Some(&existing) = self.by_name.get(&def.name) {
            self.types[existing.0 as usize] = def;
            return existing;
        }
        let id = TypeId(self.types.len() as u32);
        self.by_name.insert(def.name.clone(), id);
        self.by_simple_name
            .entry(simple_name(&def.name).to_string())
            .or_default()
            .push(id);
        self.types.push(def);
        id
    }

    pub fn type_def_mut(&mut self, id: TypeId) -> Option<&mut TypeDef> {
        self.types.get_mut(id.0 as usize)
    }

    pub fn special(&mut self, special: SpecialType) -> TypeId {
        match self.by_name.get(special.metadata_name()) {
            Some(&id) => id,
            None => {
                let mut def = TypeDef::class(special.metadata_name());
                def.special = Some(special);
                self.add_type(def)
            }
        }
    }

    /// Intern a constructed generic type such as `List<string>`.
    ///
    /// Well-known collection definitions get their `IEnumerable<T>` interface
    /// wired automatically.
    pub fn generic(&mut self, definition: &str, args: &[TypeId]) -> TypeId {
        let name = self.constructed_name(definition, args);
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }

        let kind = if well_known::INTERFACES.contains(&definition) {
            TypeKind::Interface
        } else if definition == well_known::KEY_VALUE_PAIR {
            TypeKind::Struct
        } else {
            TypeKind::Class
        };
        let mut def = TypeDef::with_kind(name, kind);
        def.generic_definition = Some(definition.to_string());
        def.type_args = args.to_vec();

        if well_known::COLLECTIONS.contains(&definition) {
            let element = if well_known::DICTIONARIES.contains(&definition) && args.len() == 2 {
                Some(self.generic(well_known::KEY_VALUE_PAIR, args))
            } else {
                args.first().copied()
            };
            if let Some(element) = element {
                def.interfaces
                    .push(self.generic(well_known::IENUMERABLE, &[element]));
            }
        }
        self.add_type(def)
    }

    pub fn list_of(&mut self, element: TypeId) -> TypeId {
        self.generic(well_known::LIST, &[element])
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        let name = format!("{}[]", self.name_of(element));
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let mut def = TypeDef::with_kind(name, TypeKind::Array);
        def.type_args = vec![element];
        self.add_type(def)
    }

    pub fn nullable(&mut self, underlying: TypeId) -> TypeId {
        let name = self.constructed_name(well_known::NULLABLE, &[underlying]);
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let mut def = TypeDef::with_kind(name, TypeKind::Nullable);
        def.generic_definition = Some(well_known::NULLABLE.to_string());
        def.type_args = vec![underlying];
        self.add_type(def)
    }

    pub fn add_member(&mut self, owner: TypeId, mut member: MemberDef) {
        member.declaring_type = Some(owner);
        if let Some(def) = self.type_def_mut(owner) {
            def.members.push(member);
        }
    }

    pub fn add_method(&mut self, owner: TypeId, method: MethodDef) {
        if let Some(def) = self.type_def_mut(owner) {
            def.methods.push(method);
        }
    }

    fn name_of(&self, id: TypeId) -> String {
        self.types
            .get(id.0 as usize)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| format!("?{}", id.0))
    }

    fn constructed_name(&self, definition: &str, args: &[TypeId]) -> String {
        let args: Vec<String> = args.iter().map(|arg| self.name_of(*arg)).collect();
        format!("{definition}<{}>", args.join(","))
    }
}

impl TypeEnv for TypeStore {
    fn type_def(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.0 as usize)
    }

    fn lookup(&self, name: &str) -> Option<TypeId> {
        if let Some(&id) = self.by_name.get(name) {
            return Some(id);
        }
        match self.by_simple_name.get(name).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }
}
