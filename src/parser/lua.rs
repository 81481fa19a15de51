//! Lua `---` annotation parser, a line-by-line state machine.
//!
//! Consecutive `---` lines form a doc block. A block is attached to the line
//! that directly follows it: a function declaration makes it a function doc,
//! `@class`/`@enum` blocks bind the following `local Name = ...` variable to
//! the class so later `function Name:method()` declarations land on it.

use super::types::{parse_type, split_type, strip_optional, TypeSyntaxError};
use super::ParseError;
use crate::model::*;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

// -- Regex patterns -----------------------------------------------------------

static RE_DOC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*---(?:[[:blank:]]?)(.*)$").unwrap());

static RE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*-{4,}[[:blank:]]*$").unwrap());

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([[:alpha:]_]+)(?:[[:blank:]]+(.*))?$").unwrap());

// `function A.b(...)`, `function A:b(...)`, `local function b(...)`
static RE_FUNC_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:blank:]]*(local[[:blank:]]+)?function[[:blank:]]+([A-Za-z_][\w]*(?:[.:][A-Za-z_]\w*)*)[[:blank:]]*\(([^)]*)\)")
        .unwrap()
});

// `A.b = function(...)`, `local b = function(...)`
static RE_FUNC_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:blank:]]*(local[[:blank:]]+)?([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)[[:blank:]]*=[[:blank:]]*function[[:blank:]]*\(([^)]*)\)")
        .unwrap()
});

// `local Widget = {}`, `Widget = class()`
static RE_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:blank:]]*(?:local[[:blank:]]+)?([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)[[:blank:]]*=").unwrap()
});

static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\.\.\.|[A-Za-z_]\w*)(\?)?(?:=(\S+))?(?:[[:blank:]]+(.*))?$").unwrap()
});

static RE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(public|private|protected|package)[[:blank:]]+)?([^[:blank:]]+)(?:[[:blank:]]+(.*))?$")
        .unwrap()
});

/// EmmyLua tags that are accepted but carry nothing this tool renders.
const IGNORED_TAGS: &[&str] = &[
    "alias",
    "as",
    "async",
    "cast",
    "deprecated",
    "diagnostic",
    "generic",
    "meta",
    "nodiscard",
    "operator",
    "overload",
    "package",
    "see",
    "source",
    "type",
    "vararg",
    "version",
];

// -- Doc blocks ---------------------------------------------------------------

/// One `@tag operand` line.
#[derive(Debug)]
struct Tag {
    line: usize,
    name: String,
    operand: String,
}

/// Raw content of consecutive `---` lines.
#[derive(Debug, Default)]
struct DocBlock {
    first_line: usize,
    text: Vec<String>,
    tags: Vec<Tag>,
    usage: Option<Vec<String>>,
}

impl DocBlock {
    fn has(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    fn tags_named<'b>(&'b self, name: &'b str) -> impl Iterator<Item = &'b Tag> + 'b {
        self.tags.iter().filter(move |t| t.name == name)
    }

    /// First paragraph and the remainder.
    fn descriptions(&self) -> (String, String) {
        let lines: Vec<&str> = self.text.iter().map(|l| l.trim_end()).collect();
        let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
        let lines = &lines[start..];
        let split = lines.iter().position(|l| l.trim().is_empty()).unwrap_or(lines.len());

        let short = lines[..split]
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join(" ");
        let long = lines[split..].join("\n").trim().to_string();
        (short, long)
    }

    fn visibility(&self) -> Option<Visibility> {
        self.tags.iter().rev().find_map(|t| match t.name.as_str() {
            "private" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "public" => Some(Visibility::Public),
            _ => None,
        })
    }
}

/// What the line after a doc block declares.
enum Declaration<'l> {
    Function {
        owner: Option<&'l str>,
        name: &'l str,
        args: Vec<&'l str>,
        local: bool,
    },
    Assignment {
        target: &'l str,
    },
    Other,
}

fn classify(line: &str) -> Declaration<'_> {
    let function = RE_FUNC_DECL
        .captures(line)
        .or_else(|| RE_FUNC_ASSIGN.captures(line));
    if let Some(caps) = function {
        let (Some(path), Some(args)) = (caps.get(2), caps.get(3)) else {
            return Declaration::Other;
        };
        let path = path.as_str();
        let (owner, name) = match path.rfind(['.', ':']) {
            Some(i) => (Some(&path[..i]), &path[i + 1..]),
            None => (None, path),
        };
        let args = args
            .as_str()
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty() && *a != "self")
            .collect();
        return Declaration::Function {
            owner,
            name,
            args,
            local: caps.get(1).is_some(),
        };
    }

    if let Some(caps) = RE_ASSIGN.captures(line) {
        if let Some(target) = caps.get(1) {
            return Declaration::Assignment {
                target: target.as_str(),
            };
        }
    }

    Declaration::Other
}

// -- Parser state -------------------------------------------------------------

struct ParserState {
    path: String,
    module: Module,
    module_name: Option<String>,
    module_desc_set: bool,
    /// Class lookup by class name and by the Lua variable bound to it.
    class_vars: HashMap<String, usize>,
    block: Option<DocBlock>,
    /// Whether the usage section of the current block is still collecting.
    in_usage: bool,
    saw_code: bool,
}

// -- Public API ---------------------------------------------------------------

/// Parse an annotated Lua source file into a Module.
pub fn parse(input: &str, path: &Path) -> Result<Module, ParseError> {
    let mut state = ParserState {
        path: path.display().to_string(),
        module: Module::default(),
        module_name: None,
        module_desc_set: false,
        class_vars: HashMap::new(),
        block: None,
        in_usage: false,
        saw_code: false,
    };

    for (i, line) in input.lines().enumerate() {
        process_line(&mut state, i + 1, line)?;
    }
    if let Some(block) = state.block.take() {
        attach_block(&mut state, block, None)?;
    }

    let mut module = state.module;
    module.name = match state.module_name {
        Some(name) => name,
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
    };

    if module.is_class_mod && module.classes.is_empty() {
        return Err(ParseError::ClassModWithoutClass {
            path: state.path,
            name: module.name,
        });
    }

    debug!(
        module = %module.name,
        classes = module.classes.len(),
        functions = module.functions.len(),
        "parsed module"
    );
    Ok(module)
}

// -- Line processing ----------------------------------------------------------

fn process_line(s: &mut ParserState, line_no: usize, line: &str) -> Result<(), ParseError> {
    // 1. Decorative `-----` lines separate paragraphs
    if RE_SEPARATOR.is_match(line) {
        if let Some(block) = s.block.as_mut() {
            block.text.push(String::new());
        }
        return Ok(());
    }

    // 2. Doc-comment line
    if let Some(caps) = RE_DOC_LINE.captures(line) {
        let content = caps.get(1).map_or("", |m| m.as_str());
        let block = s.block.get_or_insert_with(|| DocBlock {
            first_line: line_no,
            ..DocBlock::default()
        });

        if let Some(tag) = RE_TAG.captures(content.trim()) {
            let name = tag[1].to_string();
            let operand = tag.get(2).map_or("", |m| m.as_str()).trim().to_string();
            s.in_usage = name == "usage";
            if s.in_usage {
                block.usage = Some(if operand.is_empty() {
                    Vec::new()
                } else {
                    vec![operand.clone()]
                });
            }
            block.tags.push(Tag {
                line: line_no,
                name,
                operand,
            });
            return Ok(());
        }

        match block.usage.as_mut() {
            Some(usage) if s.in_usage => usage.push(content.to_string()),
            _ => block.text.push(content.to_string()),
        }
        return Ok(());
    }

    // 3. Anything else ends the pending block
    s.in_usage = false;
    let trimmed = line.trim();
    if let Some(block) = s.block.take() {
        let decl = if trimmed.is_empty() || trimmed.starts_with("--") {
            None
        } else {
            Some(line)
        };
        attach_block(s, block, decl)?;
    }

    if !trimmed.is_empty() && !trimmed.starts_with("--") {
        s.saw_code = true;
    }
    Ok(())
}

/// Apply a finished doc block to the model.
fn attach_block(s: &mut ParserState, block: DocBlock, decl: Option<&str>) -> Result<(), ParseError> {
    check_tags(s, &block)?;

    let declaration = decl.map(classify).unwrap_or(Declaration::Other);
    let mut describes_module = false;

    if let Some(tag) = block.tag("module").or_else(|| block.tag("classmod")) {
        let name = tag.operand.split_whitespace().next().ok_or_else(|| {
            missing(s, tag.line, if tag.name == "module" { "module" } else { "classmod" }, "a name")
        })?;
        s.module_name = Some(name.to_string());
        s.module.is_class_mod = tag.name == "classmod";
        describes_module = true;
    } else if !s.module_desc_set
        && !s.saw_code
        && !block.has("class")
        && !block.has("enum")
        && !matches!(declaration, Declaration::Function { .. })
    {
        // Leading file comment
        describes_module = true;
    }

    if describes_module {
        let (short, long) = block.descriptions();
        s.module.short_desc = short;
        s.module.desc = long;
        s.module_desc_set = true;
    }

    if block.has("class") || block.has("enum") {
        return add_class(s, &block, &declaration, describes_module);
    }

    if let Some(tag) = block.tags_named("field").next() {
        return Err(ParseError::FieldOutsideClass {
            path: s.path.clone(),
            line: tag.line,
        });
    }

    if let Declaration::Function {
        owner,
        name,
        args,
        local,
    } = declaration
    {
        let function = build_function(s, &block, name, &args, local)?;
        let class = owner.and_then(|o| s.class_vars.get(o).copied());
        match class {
            Some(idx) => s.module.classes[idx].methods.push(function),
            None => s.module.functions.push(function),
        }
    } else if !describes_module {
        debug!(path = %s.path, line = block.first_line, "doc block not attached to a declaration");
    }

    Ok(())
}

fn check_tags(s: &ParserState, block: &DocBlock) -> Result<(), ParseError> {
    const KNOWN: &[&str] = &[
        "module", "classmod", "class", "enum", "field", "param", "return", "usage", "private",
        "protected", "public",
    ];
    for tag in &block.tags {
        if !KNOWN.contains(&tag.name.as_str()) && !IGNORED_TAGS.contains(&tag.name.as_str()) {
            return Err(ParseError::UnknownTag {
                path: s.path.clone(),
                line: tag.line,
                tag: tag.name.clone(),
            });
        }
    }
    Ok(())
}

fn add_class(
    s: &mut ParserState,
    block: &DocBlock,
    declaration: &Declaration<'_>,
    described_module: bool,
) -> Result<(), ParseError> {
    let (tag, is_enum) = match block.tag("class") {
        Some(tag) => (tag, false),
        None => match block.tag("enum") {
            Some(tag) => (tag, true),
            None => return Ok(()),
        },
    };
    let tag_name = if is_enum { "enum" } else { "class" };

    // `Name: Parent` or `Name`
    let name = tag
        .operand
        .split([':', ' ', '\t'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| missing(s, tag.line, tag_name, "a name"))?
        .to_string();

    let (short_desc, desc) = if described_module {
        (String::new(), String::new())
    } else {
        block.descriptions()
    };

    let mut fields = Vec::new();
    for field in block.tags_named("field") {
        fields.push(parse_field(s, field, is_enum)?);
    }

    let idx = s.module.classes.len();
    s.class_vars.insert(name.clone(), idx);
    if let Declaration::Assignment { target } = declaration {
        s.class_vars.insert(target.to_string(), idx);
    }

    s.module.classes.push(Class {
        name,
        short_desc,
        desc,
        fields,
        methods: Vec::new(),
        is_enum,
    });
    Ok(())
}

fn parse_field(s: &ParserState, tag: &Tag, is_enum: bool) -> Result<Field, ParseError> {
    let caps = RE_FIELD
        .captures(&tag.operand)
        .ok_or_else(|| missing(s, tag.line, "field", "a name"))?;

    let visibility = match caps.get(1).map(|m| m.as_str()) {
        Some("private") => Visibility::Private,
        Some("protected") => Visibility::Protected,
        _ => Visibility::Public,
    };
    let name = strip_optional(&caps[2]).0.to_string();
    let rest = caps.get(3).map_or("", |m| m.as_str());

    if is_enum {
        return Ok(Field {
            name,
            ty: None,
            desc: clean_desc(rest),
            visibility,
        });
    }

    let (ty_text, desc) = split_type(rest).map_err(|e| malformed(s, tag.line, rest, e))?;
    let ty = if ty_text.is_empty() {
        None
    } else {
        Some(parse_type(ty_text).map_err(|e| malformed(s, tag.line, ty_text, e))?)
    };
    Ok(Field {
        name,
        ty,
        desc: clean_desc(desc),
        visibility,
    })
}

fn build_function(
    s: &ParserState,
    block: &DocBlock,
    name: &str,
    args: &[&str],
    local: bool,
) -> Result<Function, ParseError> {
    let (short_desc, desc) = block.descriptions();

    let mut documented = Vec::new();
    for tag in block.tags_named("param") {
        documented.push(parse_param(s, tag)?);
    }

    // Declaration order first, then documented-only params (e.g. `...`)
    let mut params = Vec::with_capacity(args.len().max(documented.len()));
    for arg in args {
        match documented.iter().position(|p: &Param| p.name == *arg) {
            Some(i) => params.push(documented.remove(i)),
            None => params.push(Param {
                name: arg.to_string(),
                ty: LuaType::Any,
                desc: String::new(),
                is_opt: false,
                default_value: None,
            }),
        }
    }
    params.extend(documented);

    let mut returns = Vec::new();
    for tag in block.tags_named("return") {
        let (ty_text, rest) =
            split_type(&tag.operand).map_err(|e| malformed(s, tag.line, &tag.operand, e))?;
        if ty_text.is_empty() {
            return Err(missing(s, tag.line, "return", "a type"));
        }
        returns.push(Return {
            ty: parse_type(ty_text).map_err(|e| malformed(s, tag.line, ty_text, e))?,
            desc: clean_desc(rest),
        });
    }

    let visibility = block.visibility().unwrap_or(if local {
        Visibility::Private
    } else {
        Visibility::Public
    });

    Ok(Function {
        name: name.to_string(),
        short_desc,
        desc,
        params,
        returns,
        usage: block
            .usage
            .as_ref()
            .map(|lines| unindent(&lines.join("\n")))
            .filter(|u| !u.is_empty()),
        visibility,
    })
}

fn parse_param(s: &ParserState, tag: &Tag) -> Result<Param, ParseError> {
    let caps = RE_PARAM
        .captures(&tag.operand)
        .ok_or_else(|| missing(s, tag.line, "param", "a name"))?;

    let name = caps[1].to_string();
    let default_value = caps.get(3).map(|m| m.as_str().to_string());
    let rest = caps.get(4).map_or("", |m| m.as_str());

    let (ty_text, desc) = split_type(rest).map_err(|e| malformed(s, tag.line, rest, e))?;
    if ty_text.is_empty() {
        return Err(missing(s, tag.line, "param", "a type"));
    }
    let (ty_text, optional_type) = strip_optional(ty_text);

    Ok(Param {
        name,
        ty: parse_type(ty_text).map_err(|e| malformed(s, tag.line, ty_text, e))?,
        desc: clean_desc(desc),
        is_opt: caps.get(2).is_some() || default_value.is_some() || optional_type,
        default_value,
    })
}

// -- Helper functions ---------------------------------------------------------

fn missing(s: &ParserState, line: usize, tag: &'static str, what: &'static str) -> ParseError {
    ParseError::MissingOperand {
        path: s.path.clone(),
        line,
        tag,
        what,
    }
}

fn malformed(s: &ParserState, line: usize, text: &str, err: TypeSyntaxError) -> ParseError {
    ParseError::MalformedType {
        path: s.path.clone(),
        line,
        text: text.to_string(),
        reason: err.0,
    }
}

/// Descriptions may be introduced with `#` (`@param x number # the x`).
fn clean_desc(text: &str) -> String {
    text.trim().trim_start_matches('#').trim().to_string()
}

/// Remove common leading indentation from a multi-line string.
fn unindent(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();

    let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };

    let min_indent = lines[start..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    lines[start..]
        .iter()
        .map(|l| l.get(min_indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
