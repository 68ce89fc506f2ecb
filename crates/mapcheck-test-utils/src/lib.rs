//! Utilities shared by mapcheck tests.
//!
//! [`Fixture`] builds a type model together with the C# profile that declares
//! mappings over it. The profile text is rendered from the model, so every
//! range the analyzer consumes (`CreateMap` call, full chain, statement,
//! converter declarations) is computed rather than hand-counted:
//!
//! ```text
//! using AutoMapper;
//! using System;
//!
//! namespace Fixture;
//!
//! public class MappingProfile : Profile
//! {
//!     public MappingProfile()
//!     {
//!         CreateMap<Source, Destination>()
//!             .ForMember(dest => dest.Name, opt => opt.Ignore());
//!     }
//! }
//! ```

use mapcheck_core::{text_range, FileId};
use mapcheck_types::{
    ChainedCall, CompilationUnit, ConverterDecl, Expr, MappingInvocation, MemberDef, MethodDef,
    SpecialType, TypeDef, TypeEnv, TypeId, TypeStore,
};

pub const PROFILE: &str = "AutoMapper.Profile";
pub const MAPPING_PROFILE: &str = "Fixture.MappingProfile";
pub const TYPE_CONVERTER: &str = "AutoMapper.ITypeConverter";
pub const VALUE_CONVERTER: &str = "AutoMapper.IValueConverter";

const STATEMENT_INDENT: &str = "        ";
const CHAIN_INDENT: &str = "            ";

/// One `CreateMap` statement in the rendered profile.
#[derive(Debug, Clone)]
pub struct MapSpec {
    pub source: TypeId,
    pub destination: TypeId,
    pub chain: Vec<ChainedCall>,
    /// `CreateMap(typeof(S), typeof(D))` instead of the generic form.
    pub typeof_form: bool,
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pub store: TypeStore,
    pub profile: TypeId,
    pub file: FileId,
    usings: Vec<String>,
    maps: Vec<MapSpec>,
    converters: Vec<TypeId>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let mut store = TypeStore::new();
        let base = store.add_type(TypeDef::class(PROFILE).abstract_type());
        let profile = store.add_type(TypeDef::class(MAPPING_PROFILE).with_base(base));
        Self {
            store,
            profile,
            file: FileId::from_raw(0),
            usings: vec!["AutoMapper".to_string(), "System".to_string()],
            maps: Vec::new(),
            converters: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: FileId) -> Self {
        self.file = file;
        self
    }

    /// Replace the rendered `using` directives.
    pub fn usings(&mut self, namespaces: &[&str]) -> &mut Self {
        self.usings = namespaces.iter().map(|ns| ns.to_string()).collect();
        self
    }

    pub fn special(&mut self, special: SpecialType) -> TypeId {
        self.store.special(special)
    }

    pub fn string(&mut self) -> TypeId {
        self.special(SpecialType::String)
    }

    pub fn int(&mut self) -> TypeId {
        self.special(SpecialType::Int32)
    }

    pub fn class(&mut self, name: &str, members: Vec<MemberDef>) -> TypeId {
        let id = self.store.add_type(TypeDef::class(qualified(name)));
        self.add_members(id, members);
        id
    }

    pub fn structure(&mut self, name: &str, members: Vec<MemberDef>) -> TypeId {
        let id = self.store.add_type(TypeDef::structure(qualified(name)));
        self.add_members(id, members);
        id
    }

    pub fn derived_class(&mut self, name: &str, base: TypeId, members: Vec<MemberDef>) -> TypeId {
        let id = self
            .store
            .add_type(TypeDef::class(qualified(name)).with_base(base));
        self.add_members(id, members);
        id
    }

    pub fn enumeration(&mut self, name: &str) -> TypeId {
        self.store
            .add_type(TypeDef::enumeration(qualified(name), SpecialType::Int32))
    }

    /// Add members to a type created earlier, e.g. to close a cycle.
    pub fn add_members(&mut self, owner: TypeId, members: Vec<MemberDef>) {
        for member in members {
            self.store.add_member(owner, member);
        }
    }

    pub fn generic(&mut self, definition: &str, args: &[TypeId]) -> TypeId {
        self.store.generic(definition, args)
    }

    pub fn list_of(&mut self, element: TypeId) -> TypeId {
        self.store.list_of(element)
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        self.store.array(element)
    }

    pub fn nullable(&mut self, underlying: TypeId) -> TypeId {
        self.store.nullable(underlying)
    }

    /// Declare `CreateMap<source, destination>()` followed by `chain`.
    pub fn create_map(
        &mut self,
        source: TypeId,
        destination: TypeId,
        chain: Vec<ChainedCall>,
    ) -> &mut Self {
        self.maps.push(MapSpec {
            source,
            destination,
            chain,
            typeof_form: false,
        });
        self
    }

    pub fn create_map_typeof(&mut self, source: TypeId, destination: TypeId) -> &mut Self {
        self.maps.push(MapSpec {
            source,
            destination,
            chain: Vec::new(),
            typeof_form: true,
        });
        self
    }

    /// Declare a converter class implementing `contract<source, destination>`
    /// with the given `Convert` method. The class is rendered after the
    /// profile and reported as a converter declaration.
    pub fn converter(
        &mut self,
        name: &str,
        contract: &str,
        source: TypeId,
        destination: TypeId,
        convert: MethodDef,
    ) -> TypeId {
        let interface = self.store.generic(contract, &[source, destination]);
        let id = self
            .store
            .add_type(TypeDef::class(qualified(name)).with_interface(interface));
        self.store.add_method(id, convert);
        self.converters.push(id);
        id
    }

    /// A class reported as a converter candidate without implementing any
    /// converter contract.
    pub fn converter_candidate(&mut self, name: &str) -> TypeId {
        let id = self.store.add_type(TypeDef::class(qualified(name)));
        self.converters.push(id);
        id
    }

    pub fn unit(&self) -> CompilationUnit {
        let env: &dyn TypeEnv = &self.store;
        let mut text = String::new();
        for namespace in &self.usings {
            text.push_str(&format!("using {namespace};\n"));
        }
        if !self.usings.is_empty() {
            text.push('\n');
        }
        text.push_str("namespace Fixture;\n\n");
        text.push_str("public class MappingProfile : Profile\n{\n    public MappingProfile()\n    {\n");

        let mut invocations = Vec::new();
        for map in &self.maps {
            text.push_str(STATEMENT_INDENT);
            let start = text.len();
            let source = env.display(map.source);
            let destination = env.display(map.destination);
            let (call, type_args, args) = if map.typeof_form {
                (
                    format!("CreateMap(typeof({source}), typeof({destination}))"),
                    Vec::new(),
                    vec![Expr::type_of(&source), Expr::type_of(&destination)],
                )
            } else {
                (
                    format!("CreateMap<{source}, {destination}>()"),
                    vec![map.source, map.destination],
                    Vec::new(),
                )
            };
            text.push_str(&call);
            let call_end = text.len();
            for chained in &map.chain {
                text.push('\n');
                text.push_str(CHAIN_INDENT);
                text.push_str(&chained.to_string());
            }
            let expression_end = text.len();
            text.push(';');
            let statement_end = text.len();
            text.push('\n');

            invocations.push(MappingInvocation {
                receiver_type: Some(self.profile),
                method: "CreateMap".to_string(),
                type_args,
                args,
                call_range: text_range(start, call_end),
                expression_range: text_range(start, expression_end),
                statement_range: Some(text_range(start, statement_end)),
                chain: map.chain.clone(),
            });
        }
        text.push_str("    }\n}\n");

        let mut converters = Vec::new();
        for &converter in &self.converters {
            let def = self
                .store
                .type_def(converter)
                .expect("converter type should be registered");
            text.push('\n');
            text.push_str("public class ");
            let start = text.len();
            text.push_str(def.simple_name());
            let end = text.len();
            let interfaces: Vec<String> = def.interfaces.iter().map(|i| env.display(*i)).collect();
            if !interfaces.is_empty() {
                text.push_str(" : ");
                text.push_str(&interfaces.join(", "));
            }
            text.push_str("\n{\n}\n");
            converters.push(ConverterDecl {
                ty: converter,
                range: text_range(start, end),
            });
        }

        CompilationUnit {
            file: self.file,
            text,
            invocations,
            converters,
        }
    }
}

fn qualified(name: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("Fixture.{name}")
    }
}

/// `.ForMember(dest => dest.{member}, opt => {option})`, with `option`
/// written against `opt`.
pub fn for_member(member: &str, option: Expr) -> ChainedCall {
    ChainedCall::new(
        "ForMember",
        vec![
            Expr::lambda("dest", Expr::name("dest").member(member)),
            Expr::lambda("opt", option),
        ],
    )
}

/// `opt.MapFrom(src => {body})`.
pub fn map_from(body: Expr) -> Expr {
    Expr::name("opt").call("MapFrom", vec![Expr::lambda("src", body)])
}

/// `opt.Ignore()`.
pub fn ignore() -> Expr {
    Expr::name("opt").call("Ignore", Vec::new())
}

/// `src.{member}`.
pub fn src(member: &str) -> Expr {
    Expr::name("src").member(member)
}
