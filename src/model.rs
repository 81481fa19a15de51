//! Data model for parsed Lua documentation, independent of the renderer.

/// One documented source file.
#[derive(Debug, Default, Clone)]
pub struct Module {
    pub name: String,
    pub short_desc: String,
    pub desc: String,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    /// Set by `@classmod`: the page documents `classes[0]`.
    pub is_class_mod: bool,
}

impl Module {
    /// The class a class-module wraps.
    pub fn primary_class(&self) -> Option<&Class> {
        if self.is_class_mod {
            self.classes.first()
        } else {
            None
        }
    }
}

/// A `@class` or `@enum` block.
#[derive(Debug, Default, Clone)]
pub struct Class {
    pub name: String,
    pub short_desc: String,
    pub desc: String,
    /// Data members, or the members of an enumeration.
    pub fields: Vec<Field>,
    pub methods: Vec<Function>,
    pub is_enum: bool,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// `None` for enumeration members.
    pub ty: Option<LuaType>,
    pub desc: String,
    pub visibility: Visibility,
}

#[derive(Debug, Default, Clone)]
pub struct Function {
    pub name: String,
    pub short_desc: String,
    pub desc: String,
    pub params: Vec<Param>,
    pub returns: Vec<Return>,
    pub usage: Option<String>,
    pub visibility: Visibility,
}

impl Function {
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: LuaType,
    pub desc: String,
    pub is_opt: bool,
    /// Default value literal, as written in the annotation.
    pub default_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Return {
    pub ty: LuaType,
    pub desc: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Type descriptor attached to parameters, returns and fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LuaType {
    Any,
    Callable {
        arg_types: Vec<LuaType>,
        return_types: Vec<LuaType>,
    },
    /// Any named type: `number`, `table`, `Foo.Bar`, `string[]`, `A|B`, ...
    Custom { name: String },
    String,
    Boolean,
    /// A function referenced by identifier.
    Function { id: String },
}

impl LuaType {
    pub fn custom(name: impl Into<String>) -> Self {
        LuaType::Custom { name: name.into() }
    }
}
