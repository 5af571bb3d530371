//! The concrete AST: an arena of [`Decl`] nodes addressed by [`DeclId`], with parent links as
//! plain indices (non-owning, navigation-only) rather than smart pointers, per the design notes
//! on cyclic back-pointers. The arena itself is owned by [`Context`] and freed in one shot when
//! the compile job ends.

use crate::attributes::AttributeSet;
use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclKind {
    Api,
    Enum,
    EnumConst,
    Struct,
    Field,
    Interface,
    Method,
    Arg,
    Property,
    Event,
    Callback,
    Func,
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeclKind::Api => "api",
            DeclKind::Enum => "enum",
            DeclKind::EnumConst => "enum constant",
            DeclKind::Struct => "struct",
            DeclKind::Field => "field",
            DeclKind::Interface => "interface",
            DeclKind::Method => "method",
            DeclKind::Arg => "argument",
            DeclKind::Property => "property",
            DeclKind::Event => "event",
            DeclKind::Callback => "callback",
            DeclKind::Func => "function",
        };
        write!(f, "{s}")
    }
}

/// An unresolved (by name) or resolved (by [`DeclId`]) reference to another declaration.
#[derive(Debug, Clone)]
pub struct DeclRef {
    pub name: String,
    pub location: Location,
    pub resolved: Option<DeclId>,
}

impl DeclRef {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self { name: name.into(), location, resolved: None }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

#[derive(Debug, Clone)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
    ConstRefs(Vec<DeclRef>),
}

/// The primitive/declared type named by a `type` attribute.
#[derive(Debug, Clone)]
pub enum TypeName {
    Void,
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Str,
    Data,
    ConstData,
    /// A reference to a previously-declared Enum/Struct/Interface/Callback by name.
    Decl(DeclRef),
}

impl TypeName {
    pub fn is_void(&self) -> bool {
        matches!(self, TypeName::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeName::Int8
                | TypeName::UInt8
                | TypeName::Int16
                | TypeName::UInt16
                | TypeName::Int32
                | TypeName::UInt32
                | TypeName::Int64
                | TypeName::UInt64
        )
    }

    pub fn is_data(&self) -> bool {
        matches!(self, TypeName::Data | TypeName::ConstData)
    }

    pub fn is_str(&self) -> bool {
        matches!(self, TypeName::Str)
    }

    /// Display name used in diagnostics; resolved decl types use their declared name.
    pub fn display(&self) -> String {
        match self {
            TypeName::Void => "Void".to_string(),
            TypeName::Bool => "Bool".to_string(),
            TypeName::Int8 => "Int8".to_string(),
            TypeName::UInt8 => "UInt8".to_string(),
            TypeName::Int16 => "Int16".to_string(),
            TypeName::UInt16 => "UInt16".to_string(),
            TypeName::Int32 => "Int32".to_string(),
            TypeName::UInt32 => "UInt32".to_string(),
            TypeName::Int64 => "Int64".to_string(),
            TypeName::UInt64 => "UInt64".to_string(),
            TypeName::Float32 => "Float32".to_string(),
            TypeName::Float64 => "Float64".to_string(),
            TypeName::Str => "Str".to_string(),
            TypeName::Data => "Data".to_string(),
            TypeName::ConstData => "ConstData".to_string(),
            TypeName::Decl(r) => r.name.clone(),
        }
    }

    /// Structural equality for the property/event getter-setter-declared-type matching rules.
    /// Resolved `Decl` references compare by resolved id; unresolved ones by name.
    pub fn matches(&self, other: &TypeName) -> bool {
        match (self, other) {
            (TypeName::Decl(a), TypeName::Decl(b)) => match (a.resolved, b.resolved) {
                (Some(x), Some(y)) => x == y,
                _ => a.name.eq_ignore_ascii_case(&b.name),
            },
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DocFragment {
    Text(String),
    Link(DeclRef),
}

#[derive(Debug, Clone)]
pub struct DocText {
    pub fragments: Vec<DocFragment>,
    pub location: Location,
}

#[derive(Debug, Clone, Default)]
pub struct Documentation {
    pub brief: Option<DocText>,
    pub detail: Option<DocText>,
    pub copyright: Option<DocText>,
    pub license: Option<DocText>,
    pub authors: Vec<DocText>,
    pub notes: Vec<DocText>,
    /// True when produced by the inline (single-line, `detail`-only) form.
    pub inline: bool,
}

impl Documentation {
    pub fn is_empty(&self) -> bool {
        self.brief.is_none()
            && self.detail.is_none()
            && self.copyright.is_none()
            && self.license.is_none()
            && self.authors.is_empty()
            && self.notes.is_empty()
    }

    pub fn has_brief_or_detail(&self) -> bool {
        self.brief.is_some() || self.detail.is_some()
    }
}

macro_rules! decl_nodes {
    ($($kind:ident => $name:ident { $($(#[$fattr:meta])* $field:ident : $ty:ty),* $(,)? }),+ $(,)?) => {
        #[derive(Debug)]
        pub enum Decl {
            $($kind($name)),+
        }

        impl Decl {
            pub fn kind(&self) -> DeclKind {
                match self {
                    $(Decl::$kind(_) => DeclKind::$kind),+
                }
            }

            pub fn name(&self) -> &str {
                match self {
                    $(Decl::$kind(n) => &n.name),+
                }
            }

            pub fn location(&self) -> Location {
                match self {
                    $(Decl::$kind(n) => n.location),+
                }
            }

            pub fn parent(&self) -> Option<DeclId> {
                match self {
                    $(Decl::$kind(n) => n.parent),+
                }
            }

            pub fn attributes(&self) -> &AttributeSet {
                match self {
                    $(Decl::$kind(n) => &n.attributes),+
                }
            }

            pub fn attributes_mut(&mut self) -> &mut AttributeSet {
                match self {
                    $(Decl::$kind(n) => &mut n.attributes),+
                }
            }

            pub fn documentation(&self) -> &Documentation {
                match self {
                    $(Decl::$kind(n) => &n.documentation),+
                }
            }

            pub fn documentation_mut(&mut self) -> &mut Documentation {
                match self {
                    $(Decl::$kind(n) => &mut n.documentation),+
                }
            }
        }

        $(
            #[derive(Debug)]
            pub struct $name {
                pub name: String,
                pub location: Location,
                pub parent: Option<DeclId>,
                pub attributes: AttributeSet,
                pub documentation: Documentation,
                $($(#[$fattr])* pub $field: $ty,)*
            }
        )+
    };
}

decl_nodes! {
    Api => ApiDecl {
        enums: Vec<DeclId>,
        structs: Vec<DeclId>,
        interfaces: Vec<DeclId>,
        callbacks: Vec<DeclId>,
        funcs: Vec<DeclId>,
    },
    Enum => EnumDecl {
        consts: Vec<DeclId>,
    },
    EnumConst => EnumConstDecl {
        /// Raw `value` literal as parsed, before Pass 1 evaluation.
        value: Option<Literal>,
        /// Final folded value, written by Pass 1.
        resolved_value: Option<i32>,
    },
    Struct => StructDecl {
        fields: Vec<DeclId>,
    },
    Field => FieldDecl {
        field_type: Option<TypeName>,
        value: Option<Literal>,
    },
    Interface => InterfaceDecl {
        methods: Vec<DeclId>,
        properties: Vec<DeclId>,
        events: Vec<DeclId>,
        /// The struct named by this interface's `type(...)` attribute, when it wraps a handle.
        handle_type: Option<TypeName>,
    },
    Method => MethodDecl {
        return_type: Option<TypeName>,
        args: Vec<DeclId>,
    },
    Arg => ArgDecl {
        arg_type: Option<TypeName>,
    },
    Property => PropertyDecl {
        property_type: Option<TypeName>,
    },
    Event => EventDecl {
        event_type: Option<TypeName>,
    },
    Callback => CallbackDecl {
        return_type: Option<TypeName>,
        args: Vec<DeclId>,
    },
    Func => FuncDecl {
        return_type: Option<TypeName>,
        args: Vec<DeclId>,
    },
}

/// Owns every AST node for one compile job; indices never dangle because nothing is ever
/// removed from the arena, matching the "Context arena frees all nodes together" invariant.
#[derive(Debug, Default)]
pub struct Context {
    nodes: Vec<Decl>,
    api: Option<DeclId>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.nodes.len() as u32);
        if let Decl::Api(_) = &decl {
            debug_assert!(self.api.is_none(), "only one Api node may be allocated per Context");
            self.api = Some(id);
        }
        self.nodes.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.nodes[id.0 as usize]
    }

    pub fn api_id(&self) -> Option<DeclId> {
        self.api
    }

    pub fn api(&self) -> Option<&ApiDecl> {
        self.api.map(|id| match self.get(id) {
            Decl::Api(a) => a,
            _ => unreachable!(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        (0..self.nodes.len() as u32).map(DeclId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Decl)> + '_ {
        self.nodes.iter().enumerate().map(|(i, d)| (DeclId(i as u32), d))
    }

    /// Fully-qualified, lowercased symbol-table key for `id` (`Parent.Child` form), used so
    /// sibling declarations across kinds (e.g. a Method and an Enum) never collide.
    pub fn canonical_key(&self, id: DeclId) -> String {
        let mut parts = vec![self.get(id).name().to_ascii_lowercase()];
        let mut cur = self.get(id).parent();
        while let Some(p) = cur {
            parts.push(self.get(p).name().to_ascii_lowercase());
            cur = self.get(p).parent();
        }
        parts.reverse();
        parts.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeSet;
    use crate::location::{FileId, Location, Position};

    fn loc() -> Location {
        Location::point(Position::new(FileId(0), 1, 1))
    }

    #[test]
    fn type_name_matches_is_case_insensitive_before_resolution() {
        let a = TypeName::Decl(DeclRef::new("Widget", loc()));
        let b = TypeName::Decl(DeclRef::new("widget", loc()));
        assert!(a.matches(&b));
        assert!(!TypeName::Int32.matches(&TypeName::Int64));
    }

    #[test]
    fn type_name_matches_resolved_decls_by_id_not_name() {
        let mut a = DeclRef::new("Widget", loc());
        let mut b = DeclRef::new("Widget", loc());
        a.resolved = Some(DeclId(0));
        b.resolved = Some(DeclId(1));
        assert!(!TypeName::Decl(a).matches(&TypeName::Decl(b)));
    }

    #[test]
    fn context_allocates_ids_in_order_and_tracks_the_api_node() {
        let mut ctx = Context::new();
        let api_id = ctx.alloc(Decl::Api(ApiDecl {
            name: "Root".to_string(),
            location: loc(),
            parent: None,
            attributes: AttributeSet::default(),
            documentation: Documentation::default(),
            enums: Vec::new(),
            structs: Vec::new(),
            interfaces: Vec::new(),
            callbacks: Vec::new(),
            funcs: Vec::new(),
        }));
        let enum_id = ctx.alloc(Decl::Enum(EnumDecl {
            name: "Color".to_string(),
            location: loc(),
            parent: Some(api_id),
            attributes: AttributeSet::default(),
            documentation: Documentation::default(),
            consts: Vec::new(),
        }));

        assert_eq!(ctx.api_id(), Some(api_id));
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.canonical_key(enum_id), "root.color");
    }
}
