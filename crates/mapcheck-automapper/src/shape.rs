//! Type shapes: the mapping-relevant view of a type.
//!
//! A [`TypeShape`] is built once per type per analysis task and never changes
//! afterwards. Shapes are memoized in a [`ShapeArena`] keyed by type identity,
//! which is also what keeps self-referential element types from recursing
//! forever.

use indexmap::IndexMap;
use mapcheck_types::symbols::well_known;
use mapcheck_types::{SpecialType, TypeDef, TypeEnv, TypeId, TypeKind, TypeRef};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionCapability {
    NotACollection,
    ArrayOf(TypeId),
    EnumerableOf(TypeId),
}

impl CollectionCapability {
    pub fn element(self) -> Option<TypeId> {
        match self {
            CollectionCapability::NotACollection => None,
            CollectionCapability::ArrayOf(element) | CollectionCapability::EnumerableOf(element) => {
                Some(element)
            }
        }
    }
}

/// Concrete container a collection member is declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    List,
    /// `IList<T>`, `ICollection<T>`, `IReadOnlyList<T>`, `IReadOnlyCollection<T>`.
    ListInterface,
    Enumerable,
    HashSet,
    SetInterface,
    SortedSet,
    Stack,
    Queue,
    LinkedList,
    Collection,
    ObservableCollection,
    Dictionary,
    /// A user type implementing `IEnumerable<T>`.
    Custom,
}

/// Containers in the same family convert into each other without help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFamily {
    Sequence,
    Set,
    Stack,
    Queue,
    LinkedList,
    Dictionary,
    Custom,
}

impl ContainerKind {
    fn from_definition(definition: &str) -> ContainerKind {
        match definition {
            well_known::LIST => ContainerKind::List,
            well_known::ILIST
            | well_known::ICOLLECTION
            | well_known::IREADONLY_LIST
            | well_known::IREADONLY_COLLECTION => ContainerKind::ListInterface,
            well_known::IENUMERABLE => ContainerKind::Enumerable,
            well_known::HASH_SET => ContainerKind::HashSet,
            well_known::ISET => ContainerKind::SetInterface,
            well_known::SORTED_SET => ContainerKind::SortedSet,
            well_known::STACK => ContainerKind::Stack,
            well_known::QUEUE => ContainerKind::Queue,
            well_known::LINKED_LIST => ContainerKind::LinkedList,
            well_known::COLLECTION => ContainerKind::Collection,
            well_known::OBSERVABLE_COLLECTION => ContainerKind::ObservableCollection,
            well_known::DICTIONARY | well_known::IDICTIONARY | well_known::IREADONLY_DICTIONARY => {
                ContainerKind::Dictionary
            }
            _ => ContainerKind::Custom,
        }
    }

    pub fn family(self) -> ContainerFamily {
        match self {
            ContainerKind::Array
            | ContainerKind::List
            | ContainerKind::ListInterface
            | ContainerKind::Enumerable
            | ContainerKind::Collection
            | ContainerKind::ObservableCollection => ContainerFamily::Sequence,
            ContainerKind::HashSet | ContainerKind::SetInterface | ContainerKind::SortedSet => {
                ContainerFamily::Set
            }
            ContainerKind::Stack => ContainerFamily::Stack,
            ContainerKind::Queue => ContainerFamily::Queue,
            ContainerKind::LinkedList => ContainerFamily::LinkedList,
            ContainerKind::Dictionary => ContainerFamily::Dictionary,
            ContainerKind::Custom => ContainerFamily::Custom,
        }
    }

    /// Whether the mapper fills a `dest` container from a `self` container
    /// without an explicit conversion.
    pub fn converts_to(self, dest: ContainerKind) -> bool {
        if dest == ContainerKind::Enumerable {
            return true;
        }
        let (from, to) = (self.family(), dest.family());
        from == to
            || (from == ContainerFamily::Custom && to == ContainerFamily::Sequence)
            || (from == ContainerFamily::Sequence && to == ContainerFamily::Custom)
    }
}

/// Declared type of a member, classified once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDescriptor {
    Object,
    String,
    /// Numeric types, `bool` and `char`.
    Primitive(SpecialType),
    /// `DateTime`, `DateTimeOffset`, `DateOnly`, `TimeOnly`, `TimeSpan`, `Guid`.
    WellKnownValue(SpecialType),
    Enum {
        ty: TypeId,
        underlying: SpecialType,
    },
    Collection {
        container: ContainerKind,
        element: TypeId,
    },
    Nullable(TypeId),
    Reference(TypeId),
    Struct(TypeId),
    Unknown,
}

impl TypeDescriptor {
    pub fn special(self) -> Option<SpecialType> {
        match self {
            TypeDescriptor::Object => Some(SpecialType::Object),
            TypeDescriptor::String => Some(SpecialType::String),
            TypeDescriptor::Primitive(special) | TypeDescriptor::WellKnownValue(special) => {
                Some(special)
            }
            _ => None,
        }
    }

    pub fn is_value_type(self) -> bool {
        matches!(
            self,
            TypeDescriptor::Primitive(_)
                | TypeDescriptor::WellKnownValue(_)
                | TypeDescriptor::Enum { .. }
                | TypeDescriptor::Nullable(_)
                | TypeDescriptor::Struct(_)
        )
    }

    /// User classes and structs: the types that need their own mapping.
    pub fn is_complex(self) -> bool {
        matches!(self, TypeDescriptor::Reference(_) | TypeDescriptor::Struct(_))
    }

    pub fn is_collection(self) -> bool {
        matches!(self, TypeDescriptor::Collection { .. })
    }

    pub fn complex_id(self) -> Option<TypeId> {
        match self {
            TypeDescriptor::Reference(id) | TypeDescriptor::Struct(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberShape {
    pub name: String,
    pub ty: TypeRef,
    pub descriptor: TypeDescriptor,
    pub is_static: bool,
    pub is_readable: bool,
    pub is_writable: bool,
    pub is_required: bool,
    pub declaring_type: Option<TypeId>,
}

impl MemberShape {
    /// Only members with both a getter and an accessible setter take part in
    /// mapping. Static members never make it into a shape.
    pub fn is_mappable(&self) -> bool {
        !self.is_static && self.is_readable && self.is_writable
    }

    pub fn is_nullable(&self) -> bool {
        match self.descriptor {
            TypeDescriptor::Nullable(_) => true,
            descriptor => self.ty.annotated_nullable && !descriptor.is_value_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeShape {
    pub id: TypeId,
    /// C# display name, e.g. `OrderDto` or `List<string>`.
    pub name: String,
    pub members: IndexMap<String, MemberShape>,
    pub descriptor: TypeDescriptor,
    pub is_value_type: bool,
    pub is_struct: bool,
    pub is_enum: bool,
    pub collection: CollectionCapability,
    /// Element shape, one level. `None` when the element is the type itself
    /// (or is still under construction further up the stack).
    pub element: Option<Rc<TypeShape>>,
}

impl TypeShape {
    pub fn member(&self, name: &str) -> Option<&MemberShape> {
        self.members.get(name)
    }

    pub fn mappable_members(&self) -> impl Iterator<Item = &MemberShape> {
        self.members.values().filter(|member| member.is_mappable())
    }

    pub fn mappable_member(&self, name: &str) -> Option<&MemberShape> {
        self.member(name).filter(|member| member.is_mappable())
    }
}

/// Per-task shape memo.
pub struct ShapeArena<'a> {
    env: &'a dyn TypeEnv,
    shapes: HashMap<TypeId, Rc<TypeShape>>,
    descriptors: HashMap<TypeId, TypeDescriptor>,
    in_progress: HashSet<TypeId>,
}

impl<'a> ShapeArena<'a> {
    pub fn new(env: &'a dyn TypeEnv) -> Self {
        Self {
            env,
            shapes: HashMap::new(),
            descriptors: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    pub fn env(&self) -> &'a dyn TypeEnv {
        self.env
    }

    /// Shape of `id`, or `None` when the type is unknown to the environment or
    /// is already being built.
    pub fn shape(&mut self, id: TypeId) -> Option<Rc<TypeShape>> {
        if let Some(shape) = self.shapes.get(&id) {
            return Some(Rc::clone(shape));
        }
        let env = self.env;
        let def = env.type_def(id)?;
        if !self.in_progress.insert(id) {
            return None;
        }

        let descriptor = self.describe(id);
        let collection = match descriptor {
            TypeDescriptor::Collection {
                container: ContainerKind::Array,
                element,
            } => CollectionCapability::ArrayOf(element),
            TypeDescriptor::Collection { element, .. } => CollectionCapability::EnumerableOf(element),
            _ => CollectionCapability::NotACollection,
        };
        let members = self.collect_members(id);
        let element = collection.element().and_then(|element| self.shape(element));

        let shape = Rc::new(TypeShape {
            id,
            name: env.display(id),
            members,
            descriptor,
            is_value_type: descriptor.is_value_type() || def.is_value_type(),
            is_struct: def.kind == TypeKind::Struct,
            is_enum: def.kind == TypeKind::Enum,
            collection,
            element,
        });
        self.in_progress.remove(&id);
        self.shapes.insert(id, Rc::clone(&shape));
        Some(shape)
    }

    pub fn describe(&mut self, id: TypeId) -> TypeDescriptor {
        if let Some(descriptor) = self.descriptors.get(&id) {
            return *descriptor;
        }
        let descriptor = classify(self.env, id);
        self.descriptors.insert(id, descriptor);
        descriptor
    }

    /// Walk from `id` up the base chain, stopping before `System.Object`.
    /// Derived members hide same-named base members; static members are dropped.
    fn collect_members(&mut self, id: TypeId) -> IndexMap<String, MemberShape> {
        let env = self.env;
        let mut members = IndexMap::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(ty) = current {
            if !visited.insert(ty) {
                tracing::debug!(target: "mapcheck.automapper", ?ty, "cyclic base chain");
                break;
            }
            let Some(def) = env.type_def(ty) else {
                break;
            };
            if def.special == Some(SpecialType::Object) {
                break;
            }
            for member in &def.members {
                if member.is_static || members.contains_key(&member.name) {
                    continue;
                }
                let descriptor = self.describe(member.ty.id);
                members.insert(
                    member.name.clone(),
                    MemberShape {
                        name: member.name.clone(),
                        ty: member.ty,
                        descriptor,
                        is_static: member.is_static,
                        is_readable: member.has_getter,
                        is_writable: member.has_setter,
                        is_required: member.is_required,
                        declaring_type: member.declaring_type.or(Some(ty)),
                    },
                );
            }
            current = def.base;
        }
        members
    }
}

fn classify(env: &dyn TypeEnv, id: TypeId) -> TypeDescriptor {
    let Some(def) = env.type_def(id) else {
        return TypeDescriptor::Unknown;
    };
    if let Some(special) = def.special {
        return match special {
            SpecialType::Object => TypeDescriptor::Object,
            SpecialType::String => TypeDescriptor::String,
            special if special.is_numeric() => TypeDescriptor::Primitive(special),
            SpecialType::Boolean | SpecialType::Char => TypeDescriptor::Primitive(special),
            special => TypeDescriptor::WellKnownValue(special),
        };
    }
    match def.kind {
        TypeKind::Enum => TypeDescriptor::Enum {
            ty: id,
            underlying: def.enum_underlying.unwrap_or(SpecialType::Int32),
        },
        TypeKind::Nullable => match def.element() {
            Some(underlying) => TypeDescriptor::Nullable(underlying),
            None => TypeDescriptor::Unknown,
        },
        TypeKind::Array => match def.element() {
            Some(element) => TypeDescriptor::Collection {
                container: ContainerKind::Array,
                element,
            },
            None => TypeDescriptor::Unknown,
        },
        TypeKind::Class | TypeKind::Struct | TypeKind::Interface => {
            if let Some(element) = enumerable_element(env, id) {
                let container = def
                    .generic_definition
                    .as_deref()
                    .map(ContainerKind::from_definition)
                    .unwrap_or(ContainerKind::Custom);
                return TypeDescriptor::Collection { container, element };
            }
            if def.kind == TypeKind::Struct {
                TypeDescriptor::Struct(id)
            } else {
                TypeDescriptor::Reference(id)
            }
        }
    }
}

fn is_enumerable_definition(def: &TypeDef) -> bool {
    def.generic_definition.as_deref() == Some(well_known::IENUMERABLE) && def.type_args.len() == 1
}

/// Element type of the `IEnumerable<T>` that `id` is or implements.
fn enumerable_element(env: &dyn TypeEnv, id: TypeId) -> Option<TypeId> {
    let mut queue = VecDeque::from([id]);
    let mut visited = HashSet::new();
    while let Some(ty) = queue.pop_front() {
        if !visited.insert(ty) {
            continue;
        }
        let Some(def) = env.type_def(ty) else {
            continue;
        };
        if is_enumerable_definition(def) {
            return def.type_args.first().copied();
        }
        queue.extend(def.interfaces.iter().copied());
        queue.extend(def.base);
    }
    None
}

/// Nominal subtype check through base classes and interfaces.
pub fn is_assignable(env: &dyn TypeEnv, from: TypeId, to: TypeId) -> bool {
    supertypes_any(env, from, |ty, _| ty == to)
}

/// Whether `id`, one of its base types, or one of its interfaces has one of
/// the given fully-qualified names (or, for constructed generics, definitions).
pub fn inherits_from(env: &dyn TypeEnv, id: TypeId, names: &[&str]) -> bool {
    supertypes_any(env, id, |_, def| {
        names.contains(&def.name.as_str())
            || def
                .generic_definition
                .as_deref()
                .is_some_and(|definition| names.contains(&definition))
    })
}

fn supertypes_any(
    env: &dyn TypeEnv,
    id: TypeId,
    mut predicate: impl FnMut(TypeId, &TypeDef) -> bool,
) -> bool {
    let mut queue = VecDeque::from([id]);
    let mut visited = HashSet::new();
    while let Some(ty) = queue.pop_front() {
        if !visited.insert(ty) {
            continue;
        }
        let Some(def) = env.type_def(ty) else {
            continue;
        };
        if predicate(ty, def) {
            return true;
        }
        queue.extend(def.base);
        queue.extend(def.interfaces.iter().copied());
    }
    false
}
