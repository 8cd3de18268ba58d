//! Two level symbol table.
use std::{collections::BTreeMap, fmt};

use smol_str::SmolStr;

use super::vm::Segment;

/// Storage category of a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Class variable shared by all instances.
    Static,
    /// Instance variable.
    Field,
    /// Subroutine parameter.
    Argument,
    /// Subroutine local variable.
    Local,
}

impl Kind {
    const COUNT: usize = 4;

    /// Memory segment the kind is stored in.
    #[rustfmt::skip]
    pub fn segment(&self) -> Segment {
        match self {
            Self::Static   => Segment::Static,
            Self::Field    => Segment::This,
            Self::Argument => Segment::Argument,
            Self::Local    => Segment::Local,
        }
    }

    /// Indicates whether the kind lives in the class scope,
    /// as opposed to the subroutine scope.
    #[inline]
    pub fn is_class_level(&self) -> bool {
        matches!(self, Self::Static | Self::Field)
    }

    #[inline]
    fn as_index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Kind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Static   => write!(f, "static"),
            Self::Field    => write!(f, "field"),
            Self::Argument => write!(f, "argument"),
            Self::Local    => write!(f, "local"),
        }
    }
}

/// Compile time record of a declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Declared type, either a primitive or a class name.
    pub ty: SmolStr,
    pub kind: Kind,
    /// Slot within the kind's segment.
    pub index: u16,
}

impl Symbol {
    #[inline]
    pub fn segment(&self) -> Segment {
        self.kind.segment()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// Name is already declared in the same scope.
    Redefined(SmolStr),
    /// Kind doesn't belong in the scope it was defined in.
    WrongScope { name: SmolStr, kind: Kind },
    /// Slot indices of the kind are exhausted.
    TooMany { name: SmolStr, kind: Kind },
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Redefined(name) => write!(f, "error at '{name}': already defined in this scope"),
            Self::WrongScope { name, kind } => {
                write!(f, "error at '{name}': {kind} variable declared in the wrong scope")
            }
            Self::TooMany { name, kind } => {
                write!(f, "error at '{name}': too many {kind} variables")
            }
        }
    }
}

impl std::error::Error for SymbolError {}

/// Scope mapping names to symbols.
///
/// The class scope is the root and holds static and field symbols.
/// A subroutine scope holds arguments and locals, and keeps a shared
/// reference to the class scope so lookups can fall back to it. The
/// parent is never mutated through the child.
#[derive(Debug)]
pub struct SymbolTable<'p> {
    parent: Option<&'p SymbolTable<'p>>,
    symbols: BTreeMap<SmolStr, Symbol>,
    /// Running index per kind.
    counts: [u16; Kind::COUNT],
}

impl<'p> SymbolTable<'p> {
    /// Create an empty class scope.
    pub fn class_scope() -> Self {
        Self {
            parent: None,
            symbols: BTreeMap::new(),
            counts: [0; Kind::COUNT],
        }
    }

    /// Create an empty subroutine scope nested in the given class scope.
    pub fn subroutine_scope(class: &'p SymbolTable<'p>) -> Self {
        Self {
            parent: Some(class),
            symbols: BTreeMap::new(),
            counts: [0; Kind::COUNT],
        }
    }

    /// Indicates whether this is a subroutine scope.
    #[inline]
    pub fn is_subroutine_scope(&self) -> bool {
        self.parent.is_some()
    }

    /// Declare a new name, returning its slot index.
    ///
    /// The index is the number of symbols of the same kind
    /// defined in this scope before it.
    pub fn define(
        &mut self,
        name: impl Into<SmolStr>,
        ty: impl Into<SmolStr>,
        kind: Kind,
    ) -> Result<u16, SymbolError> {
        let name = name.into();

        if kind.is_class_level() == self.is_subroutine_scope() {
            return Err(SymbolError::WrongScope { name, kind });
        }

        if self.symbols.contains_key(&name) {
            return Err(SymbolError::Redefined(name));
        }

        let index = self.counts[kind.as_index()];
        match index.checked_add(1) {
            Some(count) => self.counts[kind.as_index()] = count,
            None => return Err(SymbolError::TooMany { name, kind }),
        }
        self.symbols.insert(
            name,
            Symbol {
                ty: ty.into(),
                kind,
                index,
            },
        );

        Ok(index)
    }

    /// Lookup the given name according to the scope rules.
    ///
    /// First search this scope, then the parent scope.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols
            .get(name)
            .or_else(|| self.parent.and_then(|parent| parent.lookup(name)))
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|symbol| symbol.index)
    }

    #[inline]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|symbol| symbol.ty.as_str())
    }

    #[inline]
    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|symbol| symbol.kind)
    }

    /// Number of symbols of the given kind defined in this scope.
    #[inline]
    pub fn var_count(&self, kind: Kind) -> u16 {
        self.counts[kind.as_index()]
    }

    /// Discard every binding of this scope, and restart
    /// the index counters.
    ///
    /// The parent scope is untouched.
    pub fn reset(&mut self) {
        self.symbols.clear();
        self.counts = [0; Kind::COUNT];
    }
}
