use smol_str::SmolStr;

use super::vm::Segment;
use crate::error::{JackError, JackResult};

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Class variable shared by all instances.
    Static,
    /// Instance variable.
    Field,
    /// Subroutine parameter.
    Argument,
    /// Subroutine local variable.
    Local,
}

impl Storage {
    /// Memory segment the variable maps to.
    #[rustfmt::skip]
    pub fn segment(&self) -> Segment {
        match self {
            Self::Static   => Segment::Static,
            Self::Field    => Segment::This,
            Self::Argument => Segment::Argument,
            Self::Local    => Segment::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Declared type, either a primitive or a class name.
    pub ty: SmolStr,
    pub storage: Storage,
    /// Slot within the storage class, dense from zero.
    pub index: u16,
}

/// Two level symbol table.
///
/// Class scope holds statics and fields. Subroutine scope holds
/// arguments and locals, and is searched first so it shadows
/// class members of the same name.
///
/// Each storage class numbers its slots independently, in
/// declaration order, without gaps.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: Vec<Symbol>,
    subroutine_scope: Vec<Symbol>,
    static_count: u16,
    field_count: u16,
    arg_count: u16,
    local_count: u16,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear both scopes and all slot counters.
    pub fn reset_class_scope(&mut self) {
        self.class_scope.clear();
        self.subroutine_scope.clear();
        self.static_count = 0;
        self.field_count = 0;
        self.arg_count = 0;
        self.local_count = 0;
    }

    /// Clear subroutine scope and its counters, keeping class members.
    pub fn reset_subroutine_scope(&mut self) {
        self.subroutine_scope.clear();
        self.arg_count = 0;
        self.local_count = 0;
    }

    /// Declare a static or field.
    ///
    /// # Errors
    ///
    /// Returns [`JackError::InvalidStorage`] for arguments and locals.
    pub fn declare_class_member(&mut self, name: &str, ty: &str, storage: Storage) -> JackResult<()> {
        let counter = match storage {
            Storage::Static => &mut self.static_count,
            Storage::Field => &mut self.field_count,
            _ => return Err(invalid_storage(name, storage)),
        };
        let index = next_slot(counter)?;

        log::trace!("declare {storage:?} {ty} {name} = {index}");
        self.class_scope.push(Symbol {
            name: name.into(),
            ty: ty.into(),
            storage,
            index,
        });
        Ok(())
    }

    /// Declare an argument or local.
    ///
    /// # Errors
    ///
    /// Returns [`JackError::InvalidStorage`] for statics and fields.
    pub fn declare_subroutine_var(&mut self, name: &str, ty: &str, storage: Storage) -> JackResult<()> {
        let counter = match storage {
            Storage::Argument => &mut self.arg_count,
            Storage::Local => &mut self.local_count,
            _ => return Err(invalid_storage(name, storage)),
        };
        let index = next_slot(counter)?;

        log::trace!("declare {storage:?} {ty} {name} = {index}");
        self.subroutine_scope.push(Symbol {
            name: name.into(),
            ty: ty.into(),
            storage,
            index,
        });
        Ok(())
    }

    /// Lookup the given name according to the scope rules.
    ///
    /// Subroutine scope first, then class scope. Within a scope the
    /// earliest declaration wins.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .iter()
            .chain(self.class_scope.iter())
            .find(|symbol| symbol.name.as_str() == name)
    }

    /// Storage class and slot of a variable.
    pub fn resolve_storage(&self, name: &str) -> JackResult<(Storage, u16)> {
        self.lookup(name)
            .map(|symbol| (symbol.storage, symbol.index))
            .ok_or_else(|| JackError::UndefinedSymbol(name.into()))
    }

    /// Declared type of a variable.
    pub fn resolve_type(&self, name: &str) -> JackResult<&str> {
        self.lookup(name)
            .map(|symbol| symbol.ty.as_str())
            .ok_or_else(|| JackError::UndefinedSymbol(name.into()))
    }

    /// Number of fields, which is the allocation size of an instance.
    pub fn count_fields(&self) -> usize {
        count(&self.class_scope, Storage::Field)
    }

    pub fn count_statics(&self) -> usize {
        count(&self.class_scope, Storage::Static)
    }

    /// Number of locals, which is the frame size of the subroutine.
    pub fn count_locals(&self) -> usize {
        count(&self.subroutine_scope, Storage::Local)
    }

    /// Number of arguments, including the implicit `this` of a method.
    pub fn count_args(&self) -> usize {
        count(&self.subroutine_scope, Storage::Argument)
    }
}

/// Take the next free slot of a storage class.
#[inline]
fn next_slot(counter: &mut u16) -> JackResult<u16> {
    let index = *counter;
    *counter = index.checked_add(1).ok_or(JackError::TooMany {
        what: "variables of one storage",
        count: usize::from(index) + 1,
        limit: u16::MAX,
    })?;
    Ok(index)
}

#[inline]
fn count(scope: &[Symbol], storage: Storage) -> usize {
    scope.iter().filter(|symbol| symbol.storage == storage).count()
}

#[cold]
fn invalid_storage(name: &str, storage: Storage) -> JackError {
    JackError::InvalidStorage {
        name: name.into(),
        storage,
    }
}
